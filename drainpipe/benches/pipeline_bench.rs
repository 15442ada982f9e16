//! Benchmarks for the task runner and the stage pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use drainpipe::prelude::*;
use drainpipe::testing::{collect, feed};

fn runner_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");

    c.bench_function("run_tasks_1000_on_8_workers", |b| {
        b.iter(|| {
            let tasks = (0..1000).map(|_| Task::new(|| async { Ok(()) })).collect();
            rt.block_on(run_tasks(tasks, black_box(8), 1))
        })
    });
}

fn pipeline_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");

    c.bench_function("pipeline_3_stages_1000_values", |b| {
        b.iter(|| {
            rt.block_on(async {
                let cancel = CancellationToken::new();
                let stages = vec![
                    Some(stage::map(|x: u64| x + 1)),
                    Some(stage::filter(|x: &u64| x % 3 != 0)),
                    Some(stage::map(|x: u64| x * 2)),
                ];
                let output = execute_pipeline(Some(feed((0..1000).collect())), &cancel, stages);
                black_box(collect(output).await)
            })
        })
    });
}

criterion_group!(benches, runner_benchmark, pipeline_benchmark);
criterion_main!(benches);
