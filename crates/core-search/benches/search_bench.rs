//! Find/replace throughput over large buffers.
//!
//! Run with: cargo bench -p core-search

use std::hint::black_box;

use core_search::{compile, count_matches, find_next, replace_all};
use core_text::Buffer;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

const LINE: &str = "The quick brown fox jumps over the lazy dog.\n";

fn buffer(lines: usize) -> Buffer {
    Buffer::new("bench", &LINE.repeat(lines))
}

fn bench_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("find");
    for lines in [1_000usize, 10_000] {
        let buf = buffer(lines);
        let sensitive = compile("lazy", true, false).unwrap();
        let folded = compile("THE", false, false).unwrap();
        let word = compile("the", false, true).unwrap();

        group.bench_with_input(BenchmarkId::new("last_line", lines), &buf, |b, buf| {
            let from = buf.len_chars() - LINE.len();
            b.iter(|| black_box(find_next(buf, &sensitive, black_box(from))))
        });
        group.bench_with_input(BenchmarkId::new("count_folded", lines), &buf, |b, buf| {
            b.iter(|| black_box(count_matches(buf, &folded)))
        });
        group.bench_with_input(BenchmarkId::new("count_whole_word", lines), &buf, |b, buf| {
            b.iter(|| black_box(count_matches(buf, &word)))
        });
    }
    group.finish();
}

fn bench_replace_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("replace_all");
    for lines in [1_000usize, 10_000] {
        let buf = buffer(lines);
        let query = compile("fox", true, false).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(lines), &buf, |b, buf| {
            b.iter(|| black_box(replace_all(buf, &query, "cat")))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_find, bench_replace_all);
criterion_main!(benches);
