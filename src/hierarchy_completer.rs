//! §4.5 HierarchyCompleter: infer missing administrative ancestors from the
//! reference DB's statistical frequency tables. Never overwrites a field the
//! parser already extracted.

use crate::reference_db::ReferenceIndex;
use crate::turkish_text::normalize_for_compare;
use crate::{AddressComponents, ComponentField, CorrectionEdit, EditKind};

pub struct HierarchyCompleter<'a> {
    idx: &'a ReferenceIndex,
}

impl<'a> HierarchyCompleter<'a> {
    pub fn new(idx: &'a ReferenceIndex) -> Self {
        Self { idx }
    }

    /// Fills in district/province when inferable, appending a `fuzzyAdminFix`
    /// edit marked as an inference for every field it completes.
    pub fn complete(&self, components: &mut AddressComponents) -> Vec<CorrectionEdit> {
        let mut edits = Vec::new();

        let province_norm = components.province_value().map(normalize_for_compare);
        let district_norm = components.district_value().map(normalize_for_compare);
        let neighborhood_norm = components.neighborhood_value().map(normalize_for_compare);

        if components.district.is_none() {
            if let (Some(province), Some(neighborhood)) = (&province_norm, &neighborhood_norm) {
                if let Some(district) = self.best_district_for(province, neighborhood) {
                    let display = self.idx.display(&district).unwrap_or(&district).to_string();
                    edits.push(CorrectionEdit {
                        kind: EditKind::FuzzyAdminFix,
                        original: String::new(),
                        replacement: format!("mahalle\u{2192}ilçe: inferred {display}"),
                    });
                    components.district = Some(ComponentField::new(display, 0.80));
                }
            }
        }

        if components.province.is_none() {
            if let Some(neighborhood) = &neighborhood_norm {
                if let Some(province) = self.best_province_for_neighborhood(neighborhood) {
                    let display = self.idx.display(&province).unwrap_or(&province).to_string();
                    edits.push(CorrectionEdit {
                        kind: EditKind::FuzzyAdminFix,
                        original: String::new(),
                        replacement: format!("mahalle\u{2192}il: inferred {display}"),
                    });
                    components.province = Some(ComponentField::new(display, 0.70));
                } else if let Some(district) = &district_norm {
                    if let Some(province) = self.idx.modal_province(district) {
                        let display = self.idx.display(province).unwrap_or(province).to_string();
                        edits.push(CorrectionEdit {
                            kind: EditKind::FuzzyAdminFix,
                            original: String::new(),
                            replacement: format!("ilçe\u{2192}il: inferred {display}"),
                        });
                        components.province = Some(ComponentField::new(display, 0.75));
                    }
                }
            } else if let Some(district) = &district_norm {
                if let Some(province) = self.idx.modal_province(district) {
                    let display = self.idx.display(province).unwrap_or(province).to_string();
                    edits.push(CorrectionEdit {
                        kind: EditKind::FuzzyAdminFix,
                        original: String::new(),
                        replacement: format!("ilçe\u{2192}il: inferred {display}"),
                    });
                    components.province = Some(ComponentField::new(display, 0.75));
                }
            }
        }

        edits
    }

    fn best_district_for(&self, province: &str, neighborhood: &str) -> Option<String> {
        let candidates = self.idx.neighborhood_to_districts.get(neighborhood)?;
        candidates
            .iter()
            .find(|(district, _)| self.idx.is_district_of(province, district))
            .map(|(district, _)| district.clone())
    }

    fn best_province_for_neighborhood(&self, neighborhood: &str) -> Option<String> {
        let candidates = self.idx.neighborhood_to_districts.get(neighborhood)?;
        let (district, _) = candidates.first()?;
        self.idx.modal_province(district).map(String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference_db::ReferenceIndex;

    fn sample_index() -> ReferenceIndex {
        let (idx, _) = ReferenceIndex::build(vec![
            ("İstanbul".to_string(), "Kadıköy".to_string(), "Moda Mahallesi".to_string()),
            ("Ankara".to_string(), "Çankaya".to_string(), "Kızılay Mahallesi".to_string()),
        ]);
        idx
    }

    #[test]
    fn infers_district_from_province_and_neighborhood() {
        let idx = sample_index();
        let completer = HierarchyCompleter::new(&idx);
        let mut components = AddressComponents {
            province: Some(ComponentField::new("İstanbul", 0.95)),
            neighborhood: Some(ComponentField::new("Moda Mahallesi", 0.95)),
            ..Default::default()
        };
        let edits = completer.complete(&mut components);
        assert_eq!(components.district_value(), Some("Kadıköy"));
        assert!(!edits.is_empty());
    }

    #[test]
    fn infers_province_from_district_only() {
        let idx = sample_index();
        let completer = HierarchyCompleter::new(&idx);
        let mut components = AddressComponents {
            district: Some(ComponentField::new("Çankaya", 0.90)),
            ..Default::default()
        };
        completer.complete(&mut components);
        assert_eq!(components.province_value(), Some("Ankara"));
    }

    #[test]
    fn never_overwrites_explicit_field() {
        let idx = sample_index();
        let completer = HierarchyCompleter::new(&idx);
        let mut components = AddressComponents {
            province: Some(ComponentField::new("Ankara", 0.95)),
            neighborhood: Some(ComponentField::new("Moda Mahallesi", 0.95)),
            ..Default::default()
        };
        completer.complete(&mut components);
        assert_eq!(components.province_value(), Some("Ankara"));
    }
}
