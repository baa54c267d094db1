//! Benchmarks for frame encoding and relaying.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use promptflow::prelude::*;
use promptflow::testing::collect_frames;
use serde_json::json;
use std::sync::Arc;

fn encode_benchmark(c: &mut Criterion) {
    let event = OutwardEvent::progress(json!({
        "type": "stage.completed",
        "timestamp": "2024-01-01T00:00:00.000000+00:00",
        "data": {"stage": "act", "duration_ms": 12.5, "output": "a short draft ".repeat(20)},
    }));

    c.bench_function("encode_progress_frame", |b| {
        b.iter(|| black_box(event.encode()));
    });
}

fn relay_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let pipeline = Pipeline::plan_act_reflect(Arc::new(EchoGenerator::new()), PipelineConfig::new()).unwrap();
    let relay = EventRelay::new(Arc::new(pipeline));

    c.bench_function("relay_echo_pipeline", |b| {
        b.to_async(&runtime).iter(|| async {
            let (channel, receiver) = relay.open_channel();
            let summary = relay.relay(Prompt::new("Write a haiku about autumn"), channel).await;
            black_box((summary, collect_frames(receiver).await))
        });
    });
}

criterion_group!(benches, encode_benchmark, relay_benchmark);
criterion_main!(benches);
