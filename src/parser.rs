//! §4.4 Parser: typed component extraction via layered, position-sensitive
//! rules plus reference-DB membership checks. Later layers never overwrite a
//! field a higher-confidence earlier layer already assigned.

use crate::errors::ResolverError;
use crate::reference_db::ReferenceIndex;
use crate::turkish_text::normalize_for_compare;
use crate::{AddressComponents, ComponentField, CorrectionEdit, EditKind, StreetType};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref BUILDING_NO_RE: Regex = Regex::new(r"^\d+[/-]?[A-Za-z]?$").unwrap();
    static ref POSTAL_CODE_RE: Regex = Regex::new(r"^\d{5}$").unwrap();
}

const NEIGHBORHOOD_KEYWORDS: &[&str] = &["mahallesi", "mah.", "mah", "mh."];
const STREET_KEYWORDS: &[(&str, StreetType)] = &[
    ("caddesi", StreetType::Cadde),
    ("cadde", StreetType::Cadde),
    ("cd", StreetType::Cadde),
    ("cd.", StreetType::Cadde),
    ("sokak", StreetType::Sokak),
    ("sokağı", StreetType::Sokak),
    ("sk", StreetType::Sokak),
    ("sk.", StreetType::Sokak),
    ("bulvarı", StreetType::Bulvar),
    ("bulvar", StreetType::Bulvar),
    ("blv", StreetType::Bulvar),
    ("blv.", StreetType::Bulvar),
];
const APARTMENT_KEYWORDS: &[&str] = &["daire", "dair", "dr", "d"];
const FLOOR_KEYWORDS: &[&str] = &["kat", "k"];
const BLOCK_KEYWORDS: &[&str] = &["blok", "blk"];
const SITE_KEYWORDS: &[&str] = &["site", "sitesi"];

/// Famous street -> (district, province) it actually belongs to (§4.4,
/// Open Question resolution in DESIGN.md: only these three are shipped).
const FAMOUS_STREETS: &[(&str, &str, &str)] = &[
    ("bağdat", "kadıköy", "istanbul"),
    ("tunalı", "çankaya", "ankara"),
    ("kordon", "konak", "izmir"),
];

pub struct ParseResult {
    pub components: AddressComponents,
    pub edits: Vec<CorrectionEdit>,
    pub conflicts: Vec<ResolverError>,
    pub confidence: f64,
}

pub struct Parser<'a> {
    idx: &'a ReferenceIndex,
}

impl<'a> Parser<'a> {
    pub fn new(idx: &'a ReferenceIndex) -> Self {
        Self { idx }
    }

    pub fn parse(&self, corrected: &str) -> ParseResult {
        let tokens: Vec<&str> = corrected.split_whitespace().collect();
        let mut assigned: HashSet<usize> = HashSet::new();
        let mut components = AddressComponents::default();
        let mut edits = Vec::new();
        let mut conflicts = Vec::new();

        let province_idx = self.extract_province(&tokens, &mut assigned, &mut components);
        let neighborhood_span = self.extract_neighborhood_by_suffix(&tokens, &mut assigned, &mut components);
        self.extract_district(&tokens, province_idx, neighborhood_span, &mut assigned, &mut components);
        if components.neighborhood.is_none() {
            self.extract_orphan_neighborhood(&tokens, &mut assigned, &mut components);
        }
        self.extract_street(&tokens, &mut assigned, &mut components);
        self.extract_building_level(&tokens, &mut assigned, &mut components);
        self.extract_postal_code(&tokens, &mut assigned, &mut components);

        self.apply_famous_street_override(&mut components, &mut edits, &mut conflicts);

        let confidence = self.overall_confidence(&components);
        ParseResult { components, edits, conflicts, confidence }
    }

    fn extract_province(
        &self,
        tokens: &[&str],
        assigned: &mut HashSet<usize>,
        components: &mut AddressComponents,
    ) -> Option<usize> {
        for (i, token) in tokens.iter().enumerate() {
            let norm = normalize_for_compare(token);
            if self.idx.is_province(&norm) {
                let display = self.idx.display(&norm).unwrap_or(token).to_string();
                components.province = Some(ComponentField::new(display, 0.95));
                assigned.insert(i);
                return Some(i);
            }
        }
        // Fuzzy prefix: try the first one or two tokens.
        if !tokens.is_empty() {
            if let Some((matched, score)) = self.idx.fuzzy_match_province(tokens[0]) {
                let display = self.idx.display(&matched).unwrap_or(&matched).to_string();
                components.province = Some(ComponentField::new(display, 0.85 * score.min(1.0)));
                assigned.insert(0);
                return Some(0);
            }
        }
        if tokens.len() >= 2 {
            let prefix = format!("{} {}", tokens[0], tokens[1]);
            if let Some((matched, _)) = self.idx.fuzzy_match_province(&prefix) {
                let display = self.idx.display(&matched).unwrap_or(&matched).to_string();
                components.province = Some(ComponentField::new(display, 0.85));
                assigned.insert(0);
                assigned.insert(1);
                return Some(1);
            }
        }
        None
    }

    fn extract_neighborhood_by_suffix(
        &self,
        tokens: &[&str],
        assigned: &mut HashSet<usize>,
        components: &mut AddressComponents,
    ) -> Option<(usize, usize)> {
        let mut keyword_idx = None;
        for (i, token) in tokens.iter().enumerate().rev() {
            let norm = normalize_for_compare(token);
            if NEIGHBORHOOD_KEYWORDS.contains(&norm.as_str()) {
                keyword_idx = Some(i);
                break;
            }
        }
        let keyword_idx = keyword_idx?;

        let mut start = keyword_idx;
        let mut taken = 0;
        while start > 0 && taken < 3 && !assigned.contains(&(start - 1)) {
            start -= 1;
            taken += 1;
        }
        if start == keyword_idx {
            return None;
        }

        let name = tokens[start..keyword_idx].join(" ");
        let full = format!("{name} Mahallesi");
        components.neighborhood = Some(ComponentField::new(full, 0.95));
        for i in start..=keyword_idx {
            assigned.insert(i);
        }
        Some((start, keyword_idx))
    }

    fn extract_district(
        &self,
        tokens: &[&str],
        province_idx: Option<usize>,
        neighborhood_span: Option<(usize, usize)>,
        assigned: &mut HashSet<usize>,
        components: &mut AddressComponents,
    ) {
        let province_norm = components.province_value().map(normalize_for_compare);

        if let Some(pi) = province_idx {
            if let Some(next) = tokens.get(pi + 1) {
                if !assigned.contains(&(pi + 1)) {
                    let norm = normalize_for_compare(next);
                    let is_district = province_norm
                        .as_deref()
                        .is_some_and(|p| self.idx.is_district_of(p, &norm));
                    if is_district {
                        let display = self.idx.display(&norm).unwrap_or(next).to_string();
                        components.district = Some(ComponentField::new(display, 0.90));
                        assigned.insert(pi + 1);
                        return;
                    }
                    if let Some((matched, score)) = self.idx.fuzzy_match_district(next, province_norm.as_deref()) {
                        let display = self.idx.display(&matched).unwrap_or(&matched).to_string();
                        components.district = Some(ComponentField::new(display, 0.85 * score.min(1.0)));
                        assigned.insert(pi + 1);
                        return;
                    }
                }
            }
        }

        let scan_start = province_idx.map(|i| i + 1).unwrap_or(0);
        let scan_end = neighborhood_span.map(|(s, _)| s).unwrap_or(tokens.len());
        for i in scan_start..scan_end {
            if assigned.contains(&i) {
                continue;
            }
            let norm = normalize_for_compare(tokens[i]);
            let is_district = province_norm
                .as_deref()
                .map(|p| self.idx.is_district_of(p, &norm))
                .unwrap_or_else(|| self.idx.district_to_provinces.contains_key(&norm));
            if is_district {
                let display = self.idx.display(&norm).unwrap_or(tokens[i]).to_string();
                components.district = Some(ComponentField::new(display, 0.90));
                assigned.insert(i);
                return;
            }
        }

        for i in scan_start..scan_end {
            if assigned.contains(&i) {
                continue;
            }
            if let Some((matched, score)) = self.idx.fuzzy_match_district(tokens[i], province_norm.as_deref()) {
                let display = self.idx.display(&matched).unwrap_or(&matched).to_string();
                components.district = Some(ComponentField::new(display, 0.85 * score.min(1.0)));
                assigned.insert(i);
                return;
            }
        }
    }

    fn extract_orphan_neighborhood(
        &self,
        tokens: &[&str],
        assigned: &mut HashSet<usize>,
        components: &mut AddressComponents,
    ) {
        for (i, token) in tokens.iter().enumerate() {
            if assigned.contains(&i) {
                continue;
            }
            let norm = normalize_for_compare(token);
            if self.idx.is_neighborhood(&norm) {
                let display = self.idx.display(&norm).unwrap_or(token).to_string();
                components.neighborhood = Some(ComponentField::new(display, 0.80));
                assigned.insert(i);
                return;
            }
        }
    }

    fn extract_street(
        &self,
        tokens: &[&str],
        assigned: &mut HashSet<usize>,
        components: &mut AddressComponents,
    ) {
        for (i, token) in tokens.iter().enumerate() {
            if assigned.contains(&i) {
                continue;
            }
            let norm = normalize_for_compare(token);
            if let Some((_, street_type)) = STREET_KEYWORDS.iter().find(|(kw, _)| *kw == norm) {
                let mut start = i;
                let mut taken = 0;
                while start > 0 && taken < 3 && !assigned.contains(&(start - 1)) {
                    start -= 1;
                    taken += 1;
                }
                if start == i {
                    continue;
                }
                let name = tokens[start..i].join(" ");
                let full = format!("{name} {}", street_type.canonical_suffix());
                components.street = Some(ComponentField::new(full, 0.85));
                components.street_type = Some(*street_type);
                for j in start..=i {
                    assigned.insert(j);
                }
                return;
            }
        }
    }

    fn extract_building_level(
        &self,
        tokens: &[&str],
        assigned: &mut HashSet<usize>,
        components: &mut AddressComponents,
    ) {
        let mut i = 0;
        while i < tokens.len() {
            if assigned.contains(&i) {
                i += 1;
                continue;
            }
            let norm = normalize_for_compare(tokens[i]);

            if components.building_no.is_none() && BUILDING_NO_RE.is_match(tokens[i]) {
                components.building_no = Some(ComponentField::new(uppercase_trailing_letter(tokens[i]), 0.90));
                assigned.insert(i);
                i += 1;
                continue;
            }

            if APARTMENT_KEYWORDS.contains(&norm.as_str()) {
                if let Some(value) = tokens.get(i + 1) {
                    if !assigned.contains(&(i + 1)) {
                        components.apartment_no = Some(ComponentField::new(*value, 0.85));
                        assigned.insert(i);
                        assigned.insert(i + 1);
                        i += 2;
                        continue;
                    }
                }
            }

            if FLOOR_KEYWORDS.contains(&norm.as_str()) {
                if let Some(value) = tokens.get(i + 1) {
                    if !assigned.contains(&(i + 1)) {
                        components.floor = Some(ComponentField::new(*value, 0.80));
                        assigned.insert(i);
                        assigned.insert(i + 1);
                        i += 2;
                        continue;
                    }
                }
            }

            if BLOCK_KEYWORDS.contains(&norm.as_str()) {
                if let Some(value) = tokens.get(i + 1) {
                    if !assigned.contains(&(i + 1)) {
                        components.block = Some(ComponentField::new(value.to_uppercase(), 0.80));
                        assigned.insert(i);
                        assigned.insert(i + 1);
                        i += 2;
                        continue;
                    }
                }
            }

            if SITE_KEYWORDS.contains(&norm.as_str()) && i > 0 && !assigned.contains(&(i - 1)) {
                components.site = Some(ComponentField::new(tokens[i - 1], 0.75));
                assigned.insert(i - 1);
                assigned.insert(i);
            }

            i += 1;
        }
    }

    fn extract_postal_code(
        &self,
        tokens: &[&str],
        assigned: &mut HashSet<usize>,
        components: &mut AddressComponents,
    ) {
        for (i, token) in tokens.iter().enumerate() {
            if assigned.contains(&i) {
                continue;
            }
            if POSTAL_CODE_RE.is_match(token) {
                components.postal_code = Some(ComponentField::new(*token, 0.95));
                assigned.insert(i);
                return;
            }
        }
    }

    fn apply_famous_street_override(
        &self,
        components: &mut AddressComponents,
        edits: &mut Vec<CorrectionEdit>,
        conflicts: &mut Vec<ResolverError>,
    ) {
        let Some(street) = components.street_value().map(String::from) else {
            return;
        };
        let street_norm = normalize_for_compare(&street);
        let Some((token, expected_district, expected_province)) = FAMOUS_STREETS
            .iter()
            .find(|(token, _, _)| street_norm.contains(token))
        else {
            return;
        };

        let parsed_province = components.province_value().map(normalize_for_compare);
        if parsed_province.as_deref() == Some(*expected_province) {
            return;
        }

        conflicts.push(ResolverError::GeographicConflict {
            token: (*token).to_string(),
            expected_province: expected_province.to_string(),
            parsed_province: parsed_province.clone(),
        });

        let province_display = self.idx.display(expected_province).unwrap_or(expected_province).to_string();
        let district_display = self.idx.display(expected_district).unwrap_or(expected_district).to_string();

        edits.push(CorrectionEdit {
            kind: EditKind::FuzzyAdminFix,
            original: parsed_province.unwrap_or_default(),
            replacement: province_display.clone(),
        });

        components.province = Some(ComponentField::new(province_display, 0.90));
        components.district = Some(ComponentField::new(district_display, 0.90));
    }

    /// Mean of per-field confidences plus completeness bonuses, capped at 1.0 (§4.4).
    fn overall_confidence(&self, components: &AddressComponents) -> f64 {
        let fields = [
            components.province.as_ref(),
            components.district.as_ref(),
            components.neighborhood.as_ref(),
            components.street.as_ref(),
            components.building_no.as_ref(),
            components.apartment_no.as_ref(),
            components.floor.as_ref(),
            components.block.as_ref(),
            components.site.as_ref(),
            components.postal_code.as_ref(),
        ];
        let present: Vec<f64> = fields.into_iter().flatten().map(|f| f.confidence).collect();
        if present.is_empty() {
            return 0.0;
        }
        let mean = present.iter().sum::<f64>() / present.len() as f64;

        let mut bonus = 0.0;
        if components.province.is_some() && components.district.is_some() && components.neighborhood.is_some() {
            bonus += 0.15;
        }
        if components.street.is_some() && components.street_type.is_some() {
            bonus += 0.10;
        }
        if components.building_no.is_some() {
            bonus += 0.05;
        }
        (mean + bonus).min(1.0)
    }
}

fn uppercase_trailing_letter(token: &str) -> String {
    let mut chars: Vec<char> = token.chars().collect();
    if let Some(last) = chars.last_mut() {
        if last.is_alphabetic() {
            *last = last.to_ascii_uppercase();
        }
    }
    chars.into_iter().collect()
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
    fn extracts_full_hierarchy_and_street() {
        let idx = sample_index();
        let parser = Parser::new(&idx);
        let result = parser.parse("İstanbul Kadıköy Moda Mahallesi Caferağa Sokak 10/A");
        assert_eq!(result.components.province_value(), Some("İstanbul"));
        assert_eq!(result.components.district_value(), Some("Kadıköy"));
        assert!(result.components.neighborhood_value().unwrap().starts_with("Moda"));
        assert!(result.components.street_value().unwrap().ends_with("Sokak"));
        assert_eq!(result.components.building_no_value(), Some("10/A"));
    }

    #[test]
    fn resolves_province_and_district_from_dotted_abbreviations() {
        let idx = sample_index();
        let parser = Parser::new(&idx);
        let result = parser.parse("Ank. Çank. Kızılay Mahallesi Atatürk Bulvarı 25/A");
        assert_eq!(result.components.province_value(), Some("Ankara"));
        assert_eq!(result.components.district_value(), Some("Çankaya"));
    }

    #[test]
    fn famous_street_overrides_wrong_province() {
        let idx = sample_index();
        let parser = Parser::new(&idx);
        let result = parser.parse("Ankara Bağdat Caddesi 5");
        assert_eq!(result.components.province_value(), Some("İstanbul"));
        assert!(!result.conflicts.is_empty());
    }

    #[test]
    fn extracts_postal_code() {
        let idx = sample_index();
        let parser = Parser::new(&idx);
        let result = parser.parse("İstanbul Kadıköy Moda Mahallesi 34710");
        assert_eq!(result.components.postal_code_value(), Some("34710"));
    }

    #[test]
    fn building_number_preserves_compound_form() {
        let idx = sample_index();
        let parser = Parser::new(&idx);
        let result = parser.parse("İstanbul Kadıköy Moda Mahallesi 12-b");
        assert_eq!(result.components.building_no_value(), Some("12-B"));
    }
}
