//! Throughput benchmarks

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use monload_core::core::codec::{decode_cp1252, format_row, parse_hex_bytes};
use monload_core::LineAssembler;
use std::hint::black_box;

fn dump_stream(rows: usize) -> Vec<u8> {
    let mut stream = Vec::new();
    for row in 0..rows {
        let data: Vec<u8> = (0..16).map(|i| (row * 16 + i) as u8).collect();
        stream.extend_from_slice(format_row((row * 16) as u16, &data).as_bytes());
        stream.extend_from_slice(b"  ................\r\n");
    }
    stream.push(b'>');
    stream
}

fn line_benchmark(c: &mut Criterion) {
    let stream = dump_stream(256);

    let mut group = c.benchmark_group("line_reader");
    group.throughput(Throughput::Bytes(stream.len() as u64));

    group.bench_function("assemble_page", |b| {
        b.iter(|| {
            let mut assembler = LineAssembler::new();
            let lines = black_box(&stream)
                .iter()
                .filter_map(|&byte| assembler.push(byte))
                .count();
            black_box(lines)
        })
    });

    group.bench_function("decode_cp1252", |b| {
        b.iter(|| black_box(decode_cp1252(black_box(&stream))))
    });

    group.finish();
}

fn codec_benchmark(c: &mut Criterion) {
    let data: Vec<u8> = (0..16).collect();
    let row = format_row(0x8000, &data);
    let hex = row.trim_start_matches("8000: ").to_string();

    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("format_row", |b| {
        b.iter(|| black_box(format_row(black_box(0x8000), black_box(&data))))
    });

    group.bench_function("parse_hex_bytes", |b| {
        b.iter(|| black_box(parse_hex_bytes(black_box(&hex))))
    });

    group.finish();
}

criterion_group!(benches, line_benchmark, codec_benchmark);
criterion_main!(benches);
