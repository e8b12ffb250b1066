use adres_resolver::pipeline::Pipeline;
use adres_resolver::reference_db::ReferenceIndex;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn sample_index() -> ReferenceIndex {
    let (idx, _) = ReferenceIndex::build(vec![
        ("İstanbul".to_string(), "Kadıköy".to_string(), "Moda Mahallesi".to_string()),
        ("İstanbul".to_string(), "Kadıköy".to_string(), "Caferağa Mahallesi".to_string()),
        ("Ankara".to_string(), "Çankaya".to_string(), "Kızılay Mahallesi".to_string()),
    ]);
    idx
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pipeline");
    let idx = sample_index();
    let pipeline = Pipeline::new(&idx);

    group.bench_function("resolve_raw_misspelled", |b| {
        b.iter(|| pipeline.resolve(black_box("istbl kadikoy moda mah caferaga sk 10/a d:3")))
    });

    group.bench_function("resolve_already_clean", |b| {
        b.iter(|| pipeline.resolve(black_box("İstanbul Kadıköy Moda Mahallesi Caferağa Sokak 10/A")))
    });

    group.bench_function("resolve_province_only", |b| b.iter(|| pipeline.resolve(black_box("Ankara"))));

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
