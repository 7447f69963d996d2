//! Benchmarks for rsflate compression and decompression throughput.
//!
//! Tests various data patterns, levels, and thread counts.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rsflate::{
    compress, decompress, CompressionLevel, DeflateConfig, Format, InflateConfig,
    ParallelCompressor, StreamCompressor,
};
use std::io::Cursor;

/// Generate random (incompressible) data
fn generate_random_data(size: usize) -> Vec<u8> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut data = Vec::with_capacity(size);
    let mut hasher = DefaultHasher::new();

    for i in 0..size {
        i.hash(&mut hasher);
        data.push((hasher.finish() & 0xFF) as u8);
    }
    data
}

/// Generate repetitive (highly compressible) data
fn generate_repetitive_data(size: usize) -> Vec<u8> {
    b"ABCDABCDABCDABCD".iter().cycle().take(size).copied().collect()
}

/// Generate log-like text with repeats at varying distances
fn generate_text_data(size: usize) -> Vec<u8> {
    let words = ["GET", "POST", "/index.html", "/api/v1/items", "200", "404", "user", "agent"];
    let mut data = Vec::with_capacity(size + 64);
    let mut i = 0usize;
    while data.len() < size {
        let line = format!(
            "{} {} {} id={} {}\n",
            words[i % 2],
            words[2 + (i / 3) % 2],
            words[4 + (i / 7) % 2],
            i * 31 % 9973,
            words[6 + i % 2]
        );
        data.extend_from_slice(line.as_bytes());
        i += 1;
    }
    data.truncate(size);
    data
}

fn bench_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress_levels");
    let size = 1024 * 1024;
    let data = generate_text_data(size);
    group.throughput(Throughput::Bytes(size as u64));

    for level in [0u8, 1, 3, 6, 9] {
        group.bench_with_input(BenchmarkId::new("level", level), &data, |b, data| {
            let config =
                DeflateConfig { level: CompressionLevel::from_level(level), ..Default::default() };
            b.iter(|| compress(data, &config).unwrap());
        });
    }

    group.finish();
}

fn bench_data_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("data_patterns");
    let size = 256 * 1024;
    let patterns = [
        ("random", generate_random_data(size)),
        ("repetitive", generate_repetitive_data(size)),
        ("text", generate_text_data(size)),
    ];
    group.throughput(Throughput::Bytes(size as u64));

    for (name, data) in &patterns {
        group.bench_function(*name, |b| {
            let config = DeflateConfig::default();
            b.iter(|| compress(data, &config).unwrap());
        });
    }

    group.finish();
}

fn bench_decompress(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompress");
    let size = 1024 * 1024;
    let data = generate_text_data(size);
    group.throughput(Throughput::Bytes(size as u64));

    for format in [Format::Raw, Format::Zlib, Format::Gzip] {
        let compressed = compress(&data, &DeflateConfig { format, ..Default::default() }).unwrap();
        let config = InflateConfig { format, ..Default::default() };
        group.bench_with_input(
            BenchmarkId::new("format", format!("{:?}", format)),
            &compressed,
            |b, compressed| b.iter(|| decompress(compressed, &config).unwrap()),
        );
    }

    group.finish();
}

fn bench_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel");
    let size = 4 * 1024 * 1024;
    let data = generate_text_data(size);
    group.throughput(Throughput::Bytes(size as u64));

    for threads in [1, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::new("threads", threads), &data, |b, data| {
            let config =
                DeflateConfig { format: Format::Gzip, num_threads: threads, ..Default::default() };
            b.iter(|| {
                let mut compressor = ParallelCompressor::new(config.clone());
                let mut output = Vec::new();
                compressor.compress_stream(Cursor::new(data), &mut output).unwrap();
                output
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_levels, bench_data_patterns, bench_decompress, bench_parallel);
criterion_main!(benches);
