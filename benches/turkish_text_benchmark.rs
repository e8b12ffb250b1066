use adres_resolver::turkish_text::{ascii_fold, lower, normalize_for_compare, title_word, tokenize};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn bench_turkish_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("TurkishText");

    let short = "İstanbul Kadıköy Moda Mahallesi Caferağa Sokak 10/A";
    let long = format!("{} {}", short.repeat(20), short);

    group.bench_function("lower_short", |b| b.iter(|| lower(black_box(short))));
    group.bench_function("title_word", |b| b.iter(|| title_word(black_box("istanbul"))));
    group.bench_function("normalize_for_compare_short", |b| {
        b.iter(|| normalize_for_compare(black_box(short)))
    });
    group.bench_function("normalize_for_compare_long", |b| {
        b.iter(|| normalize_for_compare(black_box(&long)))
    });
    group.bench_function("ascii_fold", |b| b.iter(|| ascii_fold(black_box(short))));
    group.bench_function("tokenize", |b| b.iter(|| tokenize(black_box(short))));

    group.finish();
}

criterion_group!(benches, bench_turkish_text);
criterion_main!(benches);
