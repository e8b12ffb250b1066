//! §4.6 Validator: grades a component set's plausibility against the
//! reference DB and emits a structured verdict with suggestions.

use crate::reference_db::ReferenceIndex;
use crate::turkish_text::normalize_for_compare;
use crate::AddressComponents;

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub confidence: f64,
    pub completeness: f64,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub suggestions: Vec<String>,
}

pub struct Validator<'a> {
    idx: &'a ReferenceIndex,
}

impl<'a> Validator<'a> {
    pub fn new(idx: &'a ReferenceIndex) -> Self {
        Self { idx }
    }

    pub fn validate(&self, components: &AddressComponents) -> ValidationResult {
        let province = components.province_value().map(normalize_for_compare);
        let district = components.district_value().map(normalize_for_compare);
        let neighborhood = components.neighborhood_value().map(normalize_for_compare);

        let mut warnings = Vec::new();
        let mut errors = Vec::new();
        let mut suggestions = Vec::new();

        let (is_valid, mut confidence) = match (&province, &district, &neighborhood) {
            (Some(p), Some(d), Some(n)) => {
                if self.idx.is_neighborhood_of(p, d, n) {
                    (true, 0.95)
                } else if let Some((matched, score)) = self.idx.fuzzy_match_any_admin(n) {
                    if score >= 0.80 && self.idx.is_neighborhood_of(p, d, &matched) {
                        warnings.push(format!("neighborhood '{n}' accepted via fuzzy match to '{matched}'"));
                        (true, 0.75)
                    } else {
                        self.suggest(n, &mut suggestions);
                        (false, 0.0)
                    }
                } else {
                    self.suggest(n, &mut suggestions);
                    (false, 0.0)
                }
            }
            (Some(p), None, Some(n)) => {
                let found = self
                    .idx
                    .districts_of_province
                    .get(p)
                    .into_iter()
                    .flatten()
                    .any(|d| self.idx.is_neighborhood_of(p, d, n));
                if found {
                    (true, 0.70)
                } else {
                    self.suggest(n, &mut suggestions);
                    (false, 0.0)
                }
            }
            (Some(p), Some(d), None) => {
                if self.idx.is_district_of(p, d) {
                    (true, 0.65)
                } else {
                    self.suggest(d, &mut suggestions);
                    (false, 0.0)
                }
            }
            (Some(p), None, None) => {
                if self.idx.is_province(p) {
                    (true, 0.30)
                } else {
                    self.suggest(p, &mut suggestions);
                    (false, 0.0)
                }
            }
            _ => (false, 0.0),
        };

        if !is_valid && (district.is_some() || neighborhood.is_some()) && province.is_none() {
            errors.push("insufficient components to validate without a province".to_string());
        }

        if let (Some(postal), Some(p), Some(d)) = (components.postal_code_value(), &province, &district) {
            if let Some((expected_province, expected_district)) = self.idx.postal_codes.get(postal) {
                if expected_province != p || expected_district != d {
                    confidence = (confidence - 0.15).max(0.0);
                    errors.push(format!(
                        "postal code {postal} belongs to {expected_province}/{expected_district}, not {p}/{d}"
                    ));
                }
            }
        }

        ValidationResult {
            is_valid,
            confidence,
            completeness: self.completeness(components),
            warnings,
            errors,
            suggestions,
        }
    }

    fn suggest(&self, query: &str, suggestions: &mut Vec<String>) {
        let normalized = normalize_for_compare(query);
        let candidates = self
            .idx
            .provinces
            .iter()
            .map(String::as_str)
            .chain(self.idx.district_to_provinces.keys().map(String::as_str))
            .chain(self.idx.all_neighborhoods.iter().map(String::as_str));

        let mut scored: Vec<(String, f64)> = candidates
            .filter_map(|c| {
                let score = crate::fuzzy::composite_similarity(&normalized, c);
                (score > 0.5).then(|| (c.to_string(), score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        suggestions.extend(scored.into_iter().take(3).map(|(c, _)| c));
    }

    /// `0.7*(required/3) + 0.3*(optional/4)` (§4.6).
    fn completeness(&self, components: &AddressComponents) -> f64 {
        let required = [
            components.province.is_some(),
            components.district.is_some(),
            components.neighborhood.is_some(),
        ]
        .iter()
        .filter(|b| **b)
        .count();
        let optional = [
            components.street.is_some(),
            components.building_no.is_some(),
            components.apartment_no.is_some(),
            components.postal_code.is_some(),
        ]
        .iter()
        .filter(|b| **b)
        .count();
        0.7 * (required as f64 / 3.0) + 0.3 * (optional as f64 / 4.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference_db::ReferenceIndex;
    use crate::ComponentField;

    fn sample_index() -> ReferenceIndex {
        let (idx, _) = ReferenceIndex::build(vec![(
            "İstanbul".to_string(),
            "Kadıköy".to_string(),
            "Moda Mahallesi".to_string(),
        )]);
        idx
    }

    #[test]
    fn complete_valid_triple_scores_high() {
        let idx = sample_index();
        let validator = Validator::new(&idx);
        let components = AddressComponents {
            province: Some(ComponentField::new("İstanbul", 0.95)),
            district: Some(ComponentField::new("Kadıköy", 0.90)),
            neighborhood: Some(ComponentField::new("Moda Mahallesi", 0.95)),
            ..Default::default()
        };
        let result = validator.validate(&components);
        assert!(result.is_valid);
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn mismatched_triple_is_invalid_with_suggestions() {
        let idx = sample_index();
        let validator = Validator::new(&idx);
        let components = AddressComponents {
            province: Some(ComponentField::new("İstanbul", 0.95)),
            district: Some(ComponentField::new("Kadıköy", 0.90)),
            neighborhood: Some(ComponentField::new("Nonexistent Mahallesi", 0.80)),
            ..Default::default()
        };
        let result = validator.validate(&components);
        assert!(!result.is_valid);
    }

    #[test]
    fn province_only_scores_030() {
        let idx = sample_index();
        let validator = Validator::new(&idx);
        let components = AddressComponents {
            province: Some(ComponentField::new("İstanbul", 0.95)),
            ..Default::default()
        };
        let result = validator.validate(&components);
        assert!(result.is_valid);
        assert_eq!(result.confidence, 0.30);
    }
}
