use adres_resolver::pipeline::Pipeline;
use adres_resolver::reference_db::ReferenceIndex;
use adres_resolver::{resolve, PipelineStatus, PrecisionLevel};

fn sample_index() -> ReferenceIndex {
    let (idx, _) = ReferenceIndex::build(vec![
        ("İstanbul".to_string(), "Kadıköy".to_string(), "Moda Mahallesi".to_string()),
        ("İstanbul".to_string(), "Kadıköy".to_string(), "Caferağa Mahallesi".to_string()),
        ("Ankara".to_string(), "Çankaya".to_string(), "Kızılay Mahallesi".to_string()),
    ]);
    idx
}

#[test]
fn corrects_and_parses_a_heavily_misspelled_address() {
    let idx = sample_index();
    let result = resolve("istbl kadikoy moda mah caferaga sk 10", &idx);

    assert_eq!(result.status, PipelineStatus::Completed);
    assert_eq!(result.components.province_value(), Some("İstanbul"));
    assert_eq!(result.components.district_value(), Some("Kadıköy"));
    assert!(result.components.neighborhood_value().unwrap().starts_with("Moda"));
    assert!(result.components.street_value().unwrap().to_lowercase().contains("caferağa"));
    assert_eq!(result.components.building_no_value(), Some("10"));
    assert!(result.validation.is_valid);
}

#[test]
fn resolves_a_fully_qualified_address_with_building_level_detail() {
    let idx = sample_index();
    let pipeline = Pipeline::new(&idx);
    let result = pipeline.resolve("Ankara Çankaya Kızılay Mahallesi Atatürk Bulvarı No:25/A Daire:3");

    assert_eq!(result.components.province_value(), Some("Ankara"));
    assert_eq!(result.components.district_value(), Some("Çankaya"));
    assert!(result.components.neighborhood_value().unwrap().starts_with("Kızılay"));
    assert!(result.components.street_value().unwrap().to_lowercase().contains("atatürk"));
    assert_eq!(result.components.building_no_value(), Some("25/A"));
    assert_eq!(result.components.apartment_no_value(), Some("3"));
}

#[test]
fn famous_street_overrides_an_inconsistent_province() {
    let idx = sample_index();
    let result = resolve("Ankara Bağdat Caddesi 5", &idx);

    assert_eq!(result.components.province_value(), Some("İstanbul"));
    assert_eq!(result.components.district_value(), Some("Kadıköy"));
    assert!(!result.errors.is_empty(), "the province/street conflict should surface as an error");
}

#[test]
fn geocodes_with_coarser_alternatives_when_only_admin_hierarchy_is_known() {
    use adres_resolver::geocoder::CoordTables;

    let idx = sample_index();
    let mut tables = CoordTables::default();
    tables.neighborhood.insert("moda mahallesi".to_string(), (40.9816, 29.0275));
    tables.district.insert("kadıköy".to_string(), (40.99, 29.03));
    tables.province.insert("i̇stanbul".to_string(), (41.0082, 28.9784));

    let pipeline = Pipeline::new(&idx).with_coord_tables(tables);
    let result = pipeline.resolve("İstanbul Kadıköy Moda Mahallesi");

    assert_eq!(result.precision, PrecisionLevel::Neighborhood);
    assert!(result.coordinate.in_turkey_bounds());
}

#[test]
fn empty_raw_address_reports_error_status_not_a_panic() {
    let idx = sample_index();
    let result = resolve("   ", &idx);
    assert_eq!(result.status, PipelineStatus::Error);
    assert!(!result.errors.is_empty());
}
