use adres_resolver::reference_db::ReferenceIndex;
use adres_resolver::similarity;

fn sample_index() -> ReferenceIndex {
    let (idx, _) = ReferenceIndex::build(vec![
        ("İstanbul".to_string(), "Kadıköy".to_string(), "Moda Mahallesi".to_string()),
        ("Ankara".to_string(), "Çankaya".to_string(), "Kızılay Mahallesi".to_string()),
    ]);
    idx
}

#[test]
fn spelling_variants_of_the_same_address_are_judged_a_match() {
    let idx = sample_index();
    let result = similarity(
        "İstanbul Kadıköy Moda Mah. Caferağa Sk. No:10",
        "istbl kadikoy moda mahallesi caferaga sokak 10",
        &idx,
    );

    assert!(result.match_decision, "overall {} should clear the match threshold", result.overall);
    assert!(result.breakdown.hierarchical > 0.5);
    assert!(result.breakdown.textual > 0.5);
}

#[test]
fn addresses_in_different_cities_are_judged_distinct() {
    let idx = sample_index();
    let result = similarity("İstanbul Kadıköy Moda Mahallesi", "Ankara Çankaya Kızılay Mahallesi", &idx);

    assert!(!result.match_decision);
    assert!(result.breakdown.hierarchical < 0.3);
}

#[test]
fn similarity_weights_sum_to_the_reported_overall_score() {
    let idx = sample_index();
    let result = similarity("İstanbul Kadıköy Moda Mahallesi 10", "İstanbul Kadıköy Moda Mahallesi 10", &idx);

    let reweighed = 0.40 * result.breakdown.semantic
        + 0.30 * result.breakdown.geographic
        + 0.20 * result.breakdown.textual
        + 0.10 * result.breakdown.hierarchical;
    assert!((result.overall - reweighed).abs() < 1e-4);
}
