//! Stage type and helpers for building common stages.
//!
//! A stage receives the upstream sequence and returns its own output
//! sequence. It is expected to spawn the activity that feeds its output and
//! to close that output once its input ends. Stages do not need to watch
//! the cancellation signal; the pipeline's relays handle that.

use std::future::Future;

use tokio::sync::mpsc;

/// Capacity of the output channel created by the stage helpers.
pub const STAGE_CHANNEL_CAPACITY: usize = 1;

/// A transformation from one value sequence to another.
pub type Stage<T> = Box<dyn FnOnce(mpsc::Receiver<T>) -> mpsc::Receiver<T> + Send>;

/// Wraps a closure as a stage.
pub fn from_fn<T, F>(stage: F) -> Stage<T>
where
    F: FnOnce(mpsc::Receiver<T>) -> mpsc::Receiver<T> + Send + 'static,
{
    Box::new(stage)
}

/// A stage that forwards its input unchanged.
pub fn identity<T>() -> Stage<T>
where
    T: Send + 'static,
{
    map(|value| value)
}

/// A stage that applies `f` to every value.
pub fn map<T, F>(mut f: F) -> Stage<T>
where
    T: Send + 'static,
    F: FnMut(T) -> T + Send + 'static,
{
    spawn_stage(move |mut input, output| async move {
        while let Some(value) = input.recv().await {
            if output.send(f(value)).await.is_err() {
                break;
            }
        }
    })
}

/// A stage that applies the async function `f` to every value, one at a time.
pub fn then<T, F, Fut>(mut f: F) -> Stage<T>
where
    T: Send + 'static,
    F: FnMut(T) -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    spawn_stage(move |mut input, output| async move {
        while let Some(value) = input.recv().await {
            let mapped = f(value).await;
            if output.send(mapped).await.is_err() {
                break;
            }
        }
    })
}

/// A stage that forwards only values matching `predicate`.
pub fn filter<T, P>(mut predicate: P) -> Stage<T>
where
    T: Send + 'static,
    P: FnMut(&T) -> bool + Send + 'static,
{
    spawn_stage(move |mut input, output| async move {
        while let Some(value) = input.recv().await {
            if predicate(&value) && output.send(value).await.is_err() {
                break;
            }
        }
    })
}

/// A stage that calls `f` on every value and forwards it unchanged.
pub fn inspect<T, F>(mut f: F) -> Stage<T>
where
    T: Send + 'static,
    F: FnMut(&T) + Send + 'static,
{
    spawn_stage(move |mut input, output| async move {
        while let Some(value) = input.recv().await {
            f(&value);
            if output.send(value).await.is_err() {
                break;
            }
        }
    })
}

fn spawn_stage<T, B, Fut>(body: B) -> Stage<T>
where
    T: Send + 'static,
    B: FnOnce(mpsc::Receiver<T>, mpsc::Sender<T>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Box::new(move |input| {
        let (tx, rx) = mpsc::channel(STAGE_CHANNEL_CAPACITY);
        tokio::spawn(body(input, tx));
        rx
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::feed;
    use pretty_assertions::assert_eq;

    async fn drain_all<T>(mut rx: mpsc::Receiver<T>) -> Vec<T> {
        let mut values = Vec::new();
        while let Some(value) = rx.recv().await {
            values.push(value);
        }
        values
    }

    #[tokio::test]
    async fn test_map_stage() {
        let stage = map(|x: i32| x * 10);
        let out = drain_all(stage(feed(vec![1, 2, 3]))).await;
        assert_eq!(out, vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn test_then_stage() {
        let stage = then(|x: i32| async move {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            x + 1
        });
        let out = drain_all(stage(feed(vec![1, 2, 3]))).await;
        assert_eq!(out, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn test_filter_stage() {
        let stage = filter(|x: &i32| x % 2 == 0);
        let out = drain_all(stage(feed((1..=6).collect()))).await;
        assert_eq!(out, vec![2, 4, 6]);
    }

    #[tokio::test]
    async fn test_inspect_stage() {
        let seen = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let stage = inspect(move |x: &i32| seen_clone.lock().push(*x));

        let out = drain_all(stage(feed(vec![4, 5]))).await;

        assert_eq!(out, vec![4, 5]);
        assert_eq!(*seen.lock(), vec![4, 5]);
    }

    #[tokio::test]
    async fn test_identity_and_from_fn() {
        let stage: Stage<&str> = from_fn(|input| input);
        let out = drain_all(identity()(stage(feed(vec!["a", "b"])))).await;
        assert_eq!(out, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_stage_closes_output_when_input_ends() {
        let stage = identity::<u8>();
        let out = drain_all(stage(feed(Vec::new()))).await;
        assert!(out.is_empty());
    }
}
