use adres_resolver::matcher::Matcher;
use adres_resolver::reference_db::ReferenceIndex;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn sample_index() -> ReferenceIndex {
    let (idx, _) = ReferenceIndex::build(vec![
        ("İstanbul".to_string(), "Kadıköy".to_string(), "Moda Mahallesi".to_string()),
        ("Ankara".to_string(), "Çankaya".to_string(), "Kızılay Mahallesi".to_string()),
    ]);
    idx
}

fn bench_matcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("Matcher");
    let idx = sample_index();
    let matcher = Matcher::new(&idx);

    let a = "İstanbul Kadıköy Moda Mah. Caferağa Sk. 10";
    let b = "Istanbul Kadikoy Moda Mahallesi Caferaga Sokak No:10";

    group.bench_function("compare_near_duplicate", |b_| {
        b_.iter(|| matcher.compare(black_box(a), black_box(b)))
    });

    let c_addr = "Ankara Çankaya Kızılay Mahallesi";
    group.bench_function("compare_unrelated", |b_| {
        b_.iter(|| matcher.compare(black_box(a), black_box(c_addr)))
    });

    group.finish();
}

criterion_group!(benches, bench_matcher);
criterion_main!(benches);
