//! Benchmarks for bulk-copy row coercion and framing.

#![allow(clippy::unwrap_used, missing_docs)]

use bcp_types::{
    BoundColumn, ColumnBinding, MAX_WIDTH_MARKER, TypeCoercer, Value, WireType,
    encode_utf16_string,
};
use bytes::BytesMut;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

fn columns() -> Vec<ColumnBinding> {
    vec![
        ColumnBinding::new(1, "name", WireType::BigVarChar, 256),
        ColumnBinding::new(2, "age", WireType::FloatN, 8),
        ColumnBinding::new(3, "xmldata", WireType::Xml, MAX_WIDTH_MARKER),
    ]
}

/// Benchmark coercing and framing a whole row.
fn bench_row(c: &mut Criterion) {
    let coercer = TypeCoercer::default();
    let columns = columns();
    let row = vec![
        Value::from("someone"),
        Value::Float(12.177),
        Value::from(b"<root><item/></root>".to_vec()),
    ];

    let mut group = c.benchmark_group("row");
    group.throughput(Throughput::Elements(1));
    group.bench_function("coerce_and_frame", |b| {
        b.iter(|| {
            let mut buf = BytesMut::with_capacity(128);
            for (value, column) in black_box(&row).iter().zip(&columns) {
                let bound = coercer.coerce(value, column).unwrap();
                BoundColumn::new(column.ordinal, bound)
                    .write_to(column, &mut buf)
                    .unwrap();
            }
            black_box(buf)
        })
    });
    group.bench_function("null_row", |b| {
        let nulls = vec![Value::Null; columns.len()];
        b.iter(|| {
            for (value, column) in black_box(&nulls).iter().zip(&columns) {
                black_box(coercer.coerce(value, column).unwrap());
            }
        })
    });
    group.finish();
}

/// Benchmark UTF-16 encoding for NVARCHAR columns.
fn bench_utf16(c: &mut Criterion) {
    let mut group = c.benchmark_group("utf16_encode");
    let text = "This is a typical database column value with some content";
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("medium", |b| {
        b.iter(|| {
            let mut buf = BytesMut::with_capacity(256);
            encode_utf16_string(black_box(text), &mut buf);
            black_box(buf)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_row, bench_utf16);
criterion_main!(benches);
