use adres_resolver::reference_db::ReferenceIndex;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::hint::black_box;

fn setup_index(districts_per_province: usize, neighborhoods_per_district: usize) -> ReferenceIndex {
    let provinces = ["İstanbul", "Ankara", "İzmir", "Bursa", "Antalya"];
    let mut rows = Vec::new();
    for province in provinces {
        for d in 0..districts_per_province {
            let district = format!("District{d}");
            for n in 0..neighborhoods_per_district {
                rows.push((province.to_string(), district.clone(), format!("Neighborhood{n} Mahallesi")));
            }
        }
    }
    let (idx, _) = ReferenceIndex::build(rows);
    idx
}

fn bench_reference_db(c: &mut Criterion) {
    let mut group = c.benchmark_group("ReferenceDB");

    group.bench_function("build_medium", |b| {
        b.iter_batched(|| (), |_| setup_index(20, 50), BatchSize::SmallInput)
    });

    let idx = setup_index(20, 50);

    group.bench_function("is_province_hit", |b| b.iter(|| idx.is_province(black_box("istanbul"))));

    group.bench_function("fuzzy_match_province_typo", |b| {
        b.iter(|| idx.fuzzy_match_province(black_box("istbul")))
    });

    group.bench_function("fuzzy_match_any_admin", |b| {
        b.iter(|| idx.fuzzy_match_any_admin(black_box("neighborhood3")))
    });

    group.finish();
}

criterion_group!(benches, bench_reference_db);
criterion_main!(benches);
