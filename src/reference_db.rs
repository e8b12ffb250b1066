//! The administrative hierarchy (il → ilçe → mahalle) and postal-code index.
//!
//! Built once per process from the CSV files described in `SPEC_FULL.md` §6,
//! then shared read-only (behind an `Arc`) across every request. All derived
//! maps are keyed by [`crate::turkish_text::normalize_for_compare`] form;
//! callers normalize their own query before looking anything up.

use crate::fuzzy::{self, FUZZY_THRESHOLD};
use crate::turkish_text::{normalize_for_compare, title_word};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const MERKEZ: &str = "merkez";
const MAHALLE_SUFFIXES: &[&str] = &[" mahallesi", " mah.", " mh.", " mah"];

/// A single `(province, district, neighborhood)` row from the hierarchy file.
/// All three fields are non-empty by construction; see [`ReferenceIndex::add_row`]
/// for how blank/`Merkez` rows are handled instead of being rejected outright.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdminRecord {
    pub province: String,
    pub district: String,
    pub neighborhood: String,
}

/// Process-wide, read-only administrative index. Construct via
/// [`ReferenceIndex::build`] (from parsed rows) or [`crate::cache::ReferenceCache`]
/// (from a prior bincode snapshot).
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReferenceIndex {
    pub provinces: HashSet<String>,
    pub districts_of_province: HashMap<String, HashSet<String>>,
    pub neighborhoods_of_district: HashMap<(String, String), HashSet<String>>,
    pub all_neighborhoods: HashSet<String>,
    pub neighborhood_to_districts: HashMap<String, Vec<(String, usize)>>,
    pub district_to_provinces: HashMap<String, Vec<(String, usize)>>,
    pub postal_codes: HashMap<String, (String, String)>,

    /// normalized form -> display (title-cased) form, for every province,
    /// district, and neighborhood name seen. Used to render corrected output.
    pub display_names: HashMap<String, String>,

    // Working counters kept only during `build`, not serialized meaningfully
    // once built (kept for incremental `add_row` use from the CSV loader).
    #[serde(skip)]
    neighborhood_district_counts: HashMap<(String, String), usize>,
    #[serde(skip)]
    district_province_counts: HashMap<(String, String), usize>,
}

/// Count of rows successfully folded into the index vs. skipped as malformed.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildStats {
    pub accepted: usize,
    pub skipped: usize,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a fresh index from raw `(province, district, neighborhood)`
    /// triples as read from the hierarchy CSV. Blank province/district rows
    /// (or district == "Merkez") still contribute to `all_neighborhoods` but
    /// not to the hierarchy-constrained maps, per §4.2.
    pub fn build<I>(rows: I) -> (Self, BuildStats)
    where
        I: IntoIterator<Item = (String, String, String)>,
    {
        let mut idx = Self::new();
        let mut stats = BuildStats::default();

        for (province, district, neighborhood) in rows {
            if neighborhood.trim().is_empty() {
                stats.skipped += 1;
                warn!("skipping reference row with blank neighborhood");
                continue;
            }
            idx.add_row(&province, &district, &neighborhood);
            stats.accepted += 1;
        }

        idx.finalize_statistics();
        (idx, stats)
    }

    fn remember_display(&mut self, normalized: &str, raw: &str) {
        self.display_names
            .entry(normalized.to_string())
            .or_insert_with(|| {
                raw.split_whitespace()
                    .map(title_word)
                    .collect::<Vec<_>>()
                    .join(" ")
            });
    }

    /// Registers a neighborhood name both with and without a trailing
    /// "Mahallesi" suffix variant, so lookups tolerate either form.
    fn neighborhood_aliases(normalized: &str) -> Vec<String> {
        let mut aliases = vec![normalized.to_string()];
        for suffix in MAHALLE_SUFFIXES {
            if let Some(stripped) = normalized.strip_suffix(suffix) {
                if !stripped.is_empty() {
                    aliases.push(stripped.to_string());
                }
            }
        }
        aliases
    }

    fn add_row(&mut self, province: &str, district: &str, neighborhood: &str) {
        let province_norm = normalize_for_compare(province);
        let district_norm = normalize_for_compare(district);
        let neighborhood_norm = normalize_for_compare(neighborhood);

        let aliases = Self::neighborhood_aliases(&neighborhood_norm);
        for alias in &aliases {
            self.all_neighborhoods.insert(alias.clone());
            self.remember_display(alias, neighborhood);
        }

        let hierarchy_eligible =
            !province_norm.is_empty() && !district_norm.is_empty() && district_norm != MERKEZ;

        if !hierarchy_eligible {
            return;
        }

        self.provinces.insert(province_norm.clone());
        self.remember_display(&province_norm, province);

        self.districts_of_province
            .entry(province_norm.clone())
            .or_default()
            .insert(district_norm.clone());
        self.remember_display(&district_norm, district);

        for alias in &aliases {
            self.neighborhoods_of_district
                .entry((province_norm.clone(), district_norm.clone()))
                .or_default()
                .insert(alias.clone());

            *self
                .neighborhood_district_counts
                .entry((alias.clone(), district_norm.clone()))
                .or_insert(0) += 1;
        }

        *self
            .district_province_counts
            .entry((district_norm.clone(), province_norm.clone()))
            .or_insert(0) += 1;
    }

    /// Registers a `postal_code -> (province, district)` mapping parsed from
    /// the optional postal-code CSV.
    pub fn add_postal_code(&mut self, postal_code: &str, province: &str, district: &str) {
        let code = postal_code.trim();
        if code.len() != 5 || !code.chars().all(|c| c.is_ascii_digit()) {
            warn!("skipping malformed postal code row: {postal_code}");
            return;
        }
        self.postal_codes.insert(
            code.to_string(),
            (normalize_for_compare(province), normalize_for_compare(district)),
        );
    }

    fn finalize_statistics(&mut self) {
        let mut by_neighborhood: HashMap<String, Vec<(String, usize)>> = HashMap::new();
        for ((neighborhood, district), count) in self.neighborhood_district_counts.drain() {
            by_neighborhood.entry(neighborhood).or_default().push((district, count));
        }
        for districts in by_neighborhood.values_mut() {
            districts.sort_by(|a, b| b.1.cmp(&a.1));
        }
        self.neighborhood_to_districts = by_neighborhood;

        let mut by_district: HashMap<String, Vec<(String, usize)>> = HashMap::new();
        for ((district, province), count) in self.district_province_counts.drain() {
            by_district.entry(district).or_default().push((province, count));
        }
        for provinces in by_district.values_mut() {
            provinces.sort_by(|a, b| b.1.cmp(&a.1));
        }
        self.district_to_provinces = by_district;
    }

    pub fn is_province(&self, normalized: &str) -> bool {
        self.provinces.contains(normalized)
    }

    pub fn is_district_of(&self, province_norm: &str, normalized: &str) -> bool {
        self.districts_of_province
            .get(province_norm)
            .is_some_or(|set| set.contains(normalized))
    }

    pub fn is_neighborhood(&self, normalized: &str) -> bool {
        self.all_neighborhoods.contains(normalized)
    }

    pub fn is_neighborhood_of(&self, province_norm: &str, district_norm: &str, neighborhood_norm: &str) -> bool {
        self.neighborhoods_of_district
            .get(&(province_norm.to_string(), district_norm.to_string()))
            .is_some_or(|set| set.contains(neighborhood_norm))
    }

    pub fn display(&self, normalized: &str) -> Option<&str> {
        self.display_names.get(normalized).map(String::as_str)
    }

    /// Best fuzzy match for a province name, or `None` below [`FUZZY_THRESHOLD`].
    /// Tries an abbreviation-prefix match first (`"Ank."` -> `"ankara"`), since
    /// short dotted abbreviations never clear the composite-similarity floor.
    pub fn fuzzy_match_province(&self, query: &str) -> Option<(String, f64)> {
        let normalized = normalize_for_compare(query);
        if let Some((c, s)) = fuzzy::abbreviation_prefix_match(&normalized, self.provinces.iter().map(String::as_str)) {
            return Some((c.to_string(), s));
        }
        fuzzy::best_match(
            &normalized,
            self.provinces.iter().map(String::as_str),
            FUZZY_THRESHOLD,
        )
        .map(|(c, s)| (c.to_string(), s))
    }

    /// Best fuzzy match for a district name, optionally constrained to a
    /// known province's district set. Tries an abbreviation-prefix match
    /// first, for the same reason as [`Self::fuzzy_match_province`].
    pub fn fuzzy_match_district(&self, query: &str, province_norm: Option<&str>) -> Option<(String, f64)> {
        let normalized = normalize_for_compare(query);
        let candidates = || -> Box<dyn Iterator<Item = &str>> {
            match province_norm {
                Some(p) => Box::new(
                    self.districts_of_province
                        .get(p)
                        .into_iter()
                        .flat_map(|set| set.iter().map(String::as_str)),
                ),
                None => Box::new(self.district_to_provinces.keys().map(String::as_str)),
            }
        };
        if let Some((c, s)) = fuzzy::abbreviation_prefix_match(&normalized, candidates()) {
            return Some((c.to_string(), s));
        }
        fuzzy::best_match(&normalized, candidates(), FUZZY_THRESHOLD).map(|(c, s)| (c.to_string(), s))
    }

    /// Best fuzzy match against `provinces ∪ districts ∪ all_neighborhoods`,
    /// used by the corrector's fuzzy admin-correction pass (§4.3 step 4).
    pub fn fuzzy_match_any_admin(&self, query: &str) -> Option<(String, f64)> {
        let normalized = normalize_for_compare(query);
        let all_districts = self.district_to_provinces.keys().map(String::as_str);
        let candidates = self
            .provinces
            .iter()
            .map(String::as_str)
            .chain(all_districts)
            .chain(self.all_neighborhoods.iter().map(String::as_str));
        fuzzy::best_match(&normalized, candidates, FUZZY_THRESHOLD).map(|(c, s)| (c.to_string(), s))
    }

    /// The modal district for a neighborhood (ignoring province), i.e. the
    /// first entry of `neighborhood_to_districts[neighborhood]`.
    pub fn modal_district(&self, neighborhood_norm: &str) -> Option<&str> {
        self.neighborhood_to_districts
            .get(neighborhood_norm)
            .and_then(|v| v.first())
            .map(|(d, _)| d.as_str())
    }

    /// The modal province for a district, i.e. the first entry of
    /// `district_to_provinces[district]`.
    pub fn modal_province(&self, district_norm: &str) -> Option<&str> {
        self.district_to_provinces
            .get(district_norm)
            .and_then(|v| v.first())
            .map(|(p, _)| p.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rows() -> Vec<(String, String, String)> {
        vec![
            ("İstanbul".into(), "Kadıköy".into(), "Moda Mahallesi".into()),
            ("İstanbul".into(), "Kadıköy".into(), "Caferağa Mahallesi".into()),
            ("İstanbul".into(), "Beşiktaş".into(), "Levent Mahallesi".into()),
            ("Ankara".into(), "Çankaya".into(), "Kızılay Mahallesi".into()),
            ("".into(), "".into(), "Orphan Mahallesi".into()),
            ("İzmir".into(), "Merkez".into(), "Anonymous Mahallesi".into()),
        ]
    }

    #[test]
    fn build_populates_all_derived_maps() {
        let (idx, stats) = ReferenceIndex::build(sample_rows());
        assert_eq!(stats.accepted, 6);
        assert!(idx.is_province("istanbul"));
        assert!(idx.is_district_of("istanbul", "kadıköy"));
        assert!(idx.is_neighborhood("moda mahallesi"));
        assert!(idx.is_neighborhood("moda")); // suffix-stripped alias
    }

    #[test]
    fn merkez_and_blank_rows_are_orphans_only() {
        let (idx, _) = ReferenceIndex::build(sample_rows());
        assert!(idx.is_neighborhood("orphan mahallesi"));
        assert!(!idx.districts_of_province.values().any(|d| d.contains("merkez")));
        assert!(idx.is_neighborhood("anonymous mahallesi"));
        assert!(!idx.is_district_of("izmir", "merkez"));
    }

    #[test]
    fn fuzzy_match_province_tolerates_typos() {
        let (idx, _) = ReferenceIndex::build(sample_rows());
        let (matched, score) = idx.fuzzy_match_province("istbul").unwrap();
        assert_eq!(matched, "istanbul");
        assert!(score >= FUZZY_THRESHOLD);
    }

    #[test]
    fn modal_district_picks_highest_count() {
        let mut rows = sample_rows();
        // Add a second occurrence of "Levent Mahallesi" under a different district
        // to confirm the modal (most frequent) district wins.
        rows.push(("İstanbul".into(), "Beşiktaş".into(), "Levent Mahallesi".into()));
        rows.push(("İstanbul".into(), "Kartal".into(), "Levent Mahallesi".into()));
        let (idx, _) = ReferenceIndex::build(rows);
        assert_eq!(idx.modal_district("levent mahallesi"), Some("beşiktaş"));
    }

    #[test]
    fn postal_code_validation_rejects_non_five_digit() {
        let mut idx = ReferenceIndex::new();
        idx.add_postal_code("3440", "İstanbul", "Kadıköy");
        assert!(idx.postal_codes.is_empty());
        idx.add_postal_code("34710", "İstanbul", "Kadıköy");
        assert!(idx.postal_codes.contains_key("34710"));
    }
}
