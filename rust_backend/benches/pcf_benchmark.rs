use aptx_rust::parsing::pcf_parser::{decode_pcf, WindowAccumulator};
use aptx_rust::parsing::sql_parser::rows_for;
use aptx_rust::time::TimeFormat;
use aptx_rust::transformations::materialize;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

/// PCF stream of `n` contiguous one-minute intervals, alternating
/// probability every `run` intervals.
fn pcf_stream(n: usize, run: usize) -> String {
    let mut out = String::new();
    let start: i64 = 1_704_067_200_000;
    for i in 0..n {
        let p = if (i / run) % 2 == 0 { "1.0" } else { "0.5" };
        let t0 = start + i as i64 * 60_000;
        out.push_str(&format!("10.0:20.0 {} {} {} ", p, t0, t0 + 60_000));
    }
    out
}

fn bench_pcf_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("pcf_decoding");

    for &n in &[100usize, 1_000, 10_000] {
        let stream = pcf_stream(n, 50);
        group.bench_with_input(BenchmarkId::new("unix", n), &stream, |b, input| {
            b.iter(|| {
                let mut acc = WindowAccumulator::new();
                decode_pcf(black_box(input), 1, 1, TimeFormat::Unix, &mut acc).unwrap();
                black_box(acc.into_windows())
            });
        });
    }

    let stream = pcf_stream(1_000, 50);
    group.bench_function("decimalyear_1000", |b| {
        b.iter(|| {
            let mut acc = WindowAccumulator::new();
            decode_pcf(black_box(&stream), 1, 1, TimeFormat::DecimalYear, &mut acc).unwrap();
            black_box(acc.into_windows())
        });
    });

    group.finish();
}

fn bench_sql_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_rows");

    let lines: Vec<String> = (0..5_000)
        .map(|i| {
            if i % 3 == 0 {
                format!("insert into exposures (obs, exp, filter) values ({}, {}, 'F200W');", i / 10, i)
            } else {
                format!(
                    "insert into exposures (obs, exp, filter, dur) values ({}, {}, 'F444W', {}.5);",
                    i / 10,
                    i,
                    i
                )
            }
        })
        .collect();

    group.bench_function("rows_for_5000", |b| {
        b.iter(|| rows_for(black_box(&lines), "exposures").unwrap());
    });

    let rows = rows_for(&lines, "exposures").unwrap();
    group.bench_function("materialize_5000", |b| {
        b.iter(|| materialize(black_box(&rows)));
    });

    group.finish();
}

criterion_group!(benches, bench_pcf_decoding, bench_sql_rows);
criterion_main!(benches);
