//! Benchmarks for pattern generation and block processing.
//!
//! Run with: cargo bench -p eu-engine

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use eu_engine::{Cycle, Engine, MidiBuffer, TransportEvent, TransportUpdate};
use eu_ir::{generate, GeneratorConfig, GENERATORS};

const FRAMES_PER_SECOND: f32 = 48_000.0;
const BLOCK: u32 = 256;

fn all_enabled() -> [GeneratorConfig; GENERATORS] {
    core::array::from_fn(|i| GeneratorConfig {
        enabled: true,
        beats: 16,
        onsets: 3 + i as u16,
        rotation: i as i16,
        bars_per_cycle: 1 + (i % 3) as u16,
        note: 36 + i as u8,
        ..GeneratorConfig::default()
    })
}

fn bench_generate(c: &mut Criterion) {
    c.bench_function("generate_e13_64", |b| {
        b.iter(|| black_box(generate(black_box(13), black_box(64), black_box(5))));
    });
}

fn bench_process_one_second(c: &mut Criterion) {
    let configs = all_enabled();
    let blocks = FRAMES_PER_SECOND as u32 / BLOCK;

    c.bench_function("process_8_generators_1sec", |b| {
        let mut engine = Engine::new(FRAMES_PER_SECOND);
        let mut sink = MidiBuffer::with_capacity_bytes(8192);
        let mut frame = 0i64;
        b.iter(|| {
            for _ in 0..blocks {
                let bar = frame / 96_000;
                let transport = [TransportEvent {
                    offset: 0,
                    update: TransportUpdate::position(bar, frame, 120.0, 4.0),
                }];
                sink.clear();
                let cycle = Cycle { frames: BLOCK, configs: &configs, transport: &transport };
                black_box(engine.process(&cycle, &mut sink));
                frame += BLOCK as i64;
            }
        });
    });
}

fn bench_tempo_changes(c: &mut Criterion) {
    let configs = all_enabled();

    c.bench_function("process_tempo_change_every_block", |b| {
        let mut engine = Engine::new(FRAMES_PER_SECOND);
        let mut sink = MidiBuffer::with_capacity_bytes(8192);
        let mut frame = 0i64;
        let mut step = 0u32;
        b.iter(|| {
            let bpm = 100.0 + (step % 40) as f32;
            let transport = [TransportEvent {
                offset: 0,
                update: TransportUpdate::position(0, frame, bpm, 4.0),
            }];
            sink.clear();
            let cycle = Cycle { frames: BLOCK, configs: &configs, transport: &transport };
            black_box(engine.process(&cycle, &mut sink));
            frame += BLOCK as i64;
            step += 1;
        });
    });
}

criterion_group!(benches, bench_generate, bench_process_one_second, bench_tempo_changes);
criterion_main!(benches);
