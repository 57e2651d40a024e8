use std::{hint::black_box, io::Cursor};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vdif_analyzer::{chirp_template, correlate};
use vdif_core::{
    audit, decode_header, extract_window, infer_properties, StreamParams, VdifReader, VdifWriter,
};
use vdif_doppler::TimeWarp;
use vdif_types::SampleBuffer;

const SAMPLE_RATE: u64 = 1_000_000;
const FPS: u32 = 100;

/// Запись на `seconds` секунд: 100 кадров по 10 000 выборок в секунду.
fn recording(seconds: usize) -> Vec<u8> {
    let params = StreamParams {
        sample_rate: SAMPLE_RATE,
        frames_per_second: FPS,
        start_seconds_from_epoch: 1_000.0,
        ..Default::default()
    };
    let samples: Vec<i8> = (0..SAMPLE_RATE as usize * seconds)
        .map(|i| (i % 251) as i8)
        .collect();

    let mut raw = Vec::new();
    let mut w = VdifWriter::new(&mut raw, params).unwrap();
    w.write_samples(&SampleBuffer::from(samples)).unwrap();
    w.finish().unwrap();
    raw
}

fn bench_header(c: &mut Criterion) {
    let raw = recording(1);

    c.bench_function("decode_header", |b| {
        b.iter(|| decode_header(black_box(&raw), 0).unwrap());
    });
}

fn bench_scan(c: &mut Criterion) {
    let raw = recording(4);
    let mut group = c.benchmark_group("scan");
    group.throughput(Throughput::Bytes(raw.len() as u64));

    group.bench_function("audit", |b| {
        b.iter(|| {
            let mut reader = VdifReader::new(Cursor::new(&raw)).unwrap();
            black_box(audit(&mut reader).unwrap())
        });
    });

    group.bench_function("extract_1s", |b| {
        let mut reader = VdifReader::new(Cursor::new(&raw)).unwrap();
        let props = infer_properties(&mut reader).unwrap();

        b.iter(|| black_box(extract_window(&mut reader, &props, 1_001.0, 1_002.0).unwrap()));
    });

    group.finish();
}

fn bench_doppler(c: &mut Criterion) {
    let mut group = c.benchmark_group("doppler");

    for n in [10_000usize, 1_000_000] {
        let signal: Vec<i8> = (0..n).map(|i| (i % 127) as i8).collect();
        let rtt: Vec<f64> = (0..n).map(|i| 1e-3 + i as f64 * 1e-12).collect();
        let warp = TimeWarp::new(&rtt, SAMPLE_RATE as f64).unwrap();
        let received = warp.forward(&signal);

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("forward", n), &signal, |b, s| {
            b.iter(|| black_box(warp.forward(s)));
        });
        group.bench_with_input(BenchmarkId::new("inverse", n), &received, |b, r| {
            b.iter(|| black_box(warp.inverse(r).unwrap()));
        });
    }

    group.finish();
}

fn bench_correlate(c: &mut Criterion) {
    let mut group = c.benchmark_group("matched_filter");

    for len in [4_096usize, 65_536] {
        let template = chirp_template(len, 8e6, 4e6, 2.5e-6, 0.0).unwrap();
        let signal: Vec<f64> = template.iter().cycle().skip(len / 3).take(len).copied().collect();

        group.bench_with_input(BenchmarkId::new("correlate", len), &signal, |b, s| {
            b.iter(|| black_box(correlate(s, &template).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_header, bench_scan, bench_doppler, bench_correlate);
criterion_main!(benches);
