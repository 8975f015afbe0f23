//! Benchmarks for maskbench_core share codec, vector protocol and oracle.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use maskbench_core::ascon;
use maskbench_core::case::TestCase;
use maskbench_core::config::Operations;
use maskbench_core::oracle::{AsconOracle, Oracle};
use maskbench_core::protocol::{parse_vector_file, VectorProgram, VectorWriter};
use maskbench_core::shares::{combine, split, FixedMaskSource, ShareCount};
use maskbench_core::transcript::Transcript;

fn share_split_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("share-split");
    let secret = vec![0x5au8; 1024];

    for n in [2usize, 3, 4, 8].iter() {
        let count = ShareCount::new(*n).unwrap();
        let mut masks = FixedMaskSource::new(vec![0xa5, 0x3c, 0x0f]);
        group.throughput(Throughput::Bytes(secret.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, _| {
            b.iter(|| split(black_box(&secret), count, &mut masks).unwrap())
        });
    }

    group.finish();
}

fn share_combine_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("share-combine");

    for n in [2usize, 3, 4, 8].iter() {
        let count = ShareCount::new(*n).unwrap();
        let shared = vec![0x5au8; 1024 * n];
        group.throughput(Throughput::Bytes(shared.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, _| {
            b.iter(|| combine(black_box(&shared), count).unwrap())
        });
    }

    group.finish();
}

fn vector_file_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector-file");

    for len in [0usize, 16, 256].iter() {
        let case = TestCase::counting(*len, *len).pad();
        let expected = AsconOracle.expected_outputs(&case, Operations::ALL).unwrap();
        let program = VectorProgram::for_case(&case, &expected, Operations::ALL);
        let mut writer = VectorWriter::new(ShareCount::TWO, FixedMaskSource::new(vec![0x11]));
        let text = writer.render(&program).unwrap();

        group.bench_with_input(BenchmarkId::new("render", len), len, |b, _| {
            b.iter(|| writer.render(black_box(&program)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("parse", len), len, |b, _| {
            b.iter(|| parse_vector_file(black_box(&text), ShareCount::TWO).unwrap())
        });
    }

    group.finish();
}

fn transcript_benchmark(c: &mut Criterion) {
    let text: String = (0..256u64)
        .map(|i| format!("cycle {} c => {:016x}\n", i, i))
        .collect();

    c.bench_function("transcript-parse-256", |b| {
        b.iter(|| Transcript::parse(black_box(&text)).unwrap().outputs())
    });
}

fn ascon_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Ascon");
    let key = [0u8; ascon::KEY_SIZE];
    let nonce = [0u8; ascon::NONCE_SIZE];

    for size in [8usize, 64, 1024].iter() {
        let plaintext = vec![0u8; *size];
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("encrypt", size), size, |b, _| {
            b.iter(|| ascon::encrypt(&key, &nonce, &[], black_box(&plaintext)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("hash", size), size, |b, _| {
            b.iter(|| ascon::hash(black_box(&plaintext)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    share_split_benchmark,
    share_combine_benchmark,
    vector_file_benchmark,
    transcript_benchmark,
    ascon_benchmark,
);

criterion_main!(benches);
