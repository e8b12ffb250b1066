//! §4.8 Matcher: four-channel weighted similarity between two raw addresses,
//! with an explainable breakdown and a fixed-threshold match decision.

use crate::corrector::Corrector;
use crate::fuzzy::levenshtein_similarity;
use crate::geocoder::{CoordTables, Geocoder};
use crate::parser::Parser;
use crate::reference_db::ReferenceIndex;
use crate::turkish_text::ascii_fold;
use crate::{round4, AddressComponents, SimilarityBreakdown};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

const WEIGHT_SEMANTIC: f64 = 0.40;
const WEIGHT_GEOGRAPHIC: f64 = 0.30;
const WEIGHT_TEXTUAL: f64 = 0.20;
const WEIGHT_HIERARCHICAL: f64 = 0.10;
const MATCH_THRESHOLD: f64 = 0.60;
const GEO_DECAY_KM: f64 = 50.0 / 3.0;
const GEO_MISS_DISTANCE_KM: f64 = 50.0;

/// Neighboring-province adjacency pairs used by the geographic channel's
/// coordinate-free fallback (§4.8). Normalized province names.
const ADJACENT_PROVINCES: &[(&str, &str)] = &[
    ("istanbul", "kocaeli"),
    ("ankara", "konya"),
    ("izmir", "manisa"),
    ("izmir", "aydın"),
    ("bursa", "kocaeli"),
];

/// Injectable pre-trained sentence-embedding provider for the semantic
/// channel (§4.8, §9). The crate ships no implementation beyond the
/// token-overlap fallback; a host process may supply one.
pub trait EmbeddingProvider {
    fn embed(&self, text: &str) -> Option<Vec<f32>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub overall: f64,
    pub breakdown: SimilarityBreakdown,
    pub confidence: f64,
    pub match_decision: bool,
    pub contributions: HashMap<String, f64>,
    pub timing_ms: f64,
}

pub struct Matcher<'a> {
    idx: &'a ReferenceIndex,
    coord_tables: CoordTables,
    embedding_provider: Option<&'a dyn EmbeddingProvider>,
}

impl<'a> Matcher<'a> {
    pub fn new(idx: &'a ReferenceIndex) -> Self {
        Self { idx, coord_tables: CoordTables::default(), embedding_provider: None }
    }

    pub fn with_coord_tables(mut self, tables: CoordTables) -> Self {
        self.coord_tables = tables;
        self
    }

    pub fn with_embedding_provider(mut self, provider: &'a dyn EmbeddingProvider) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    pub fn compare(&self, raw_a: &str, raw_b: &str) -> MatchResult {
        let start = Instant::now();

        let corrector = Corrector::new(self.idx);
        let (corrected_a, _, _) = corrector.correct(raw_a);
        let (corrected_b, _, _) = corrector.correct(raw_b);

        let parser = Parser::new(self.idx);
        let components_a = parser.parse(&corrected_a).components;
        let components_b = parser.parse(&corrected_b).components;

        let semantic = self.semantic_channel(raw_a, raw_b, &components_a, &components_b);
        let geographic = self.geographic_channel(&components_a, &components_b);
        let textual = self.textual_channel(&corrected_a, &corrected_b);
        let hierarchical = self.hierarchical_channel(&components_a, &components_b);

        let breakdown = SimilarityBreakdown { semantic, geographic, textual, hierarchical };
        let overall = round4(
            WEIGHT_SEMANTIC * semantic
                + WEIGHT_GEOGRAPHIC * geographic
                + WEIGHT_TEXTUAL * textual
                + WEIGHT_HIERARCHICAL * hierarchical,
        );

        let channels = [semantic, geographic, textual, hierarchical];
        let high_channels = channels.iter().filter(|c| **c > 0.7).count();
        let mean = channels.iter().sum::<f64>() / 4.0;
        let variance = channels.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / 4.0;

        let mut confidence = overall;
        if high_channels >= 2 {
            confidence += 0.1;
        }
        if variance > 0.1 {
            confidence -= 0.1;
        }
        let confidence = round4(confidence.clamp(0.0, 1.0));

        let mut contributions = HashMap::new();
        contributions.insert("semantic".to_string(), round4(semantic * WEIGHT_SEMANTIC));
        contributions.insert("geographic".to_string(), round4(geographic * WEIGHT_GEOGRAPHIC));
        contributions.insert("textual".to_string(), round4(textual * WEIGHT_TEXTUAL));
        contributions.insert("hierarchical".to_string(), round4(hierarchical * WEIGHT_HIERARCHICAL));

        MatchResult {
            overall,
            breakdown,
            confidence,
            match_decision: overall >= MATCH_THRESHOLD,
            contributions,
            timing_ms: start.elapsed().as_secs_f64() * 1000.0,
        }
    }

    fn semantic_channel(
        &self,
        raw_a: &str,
        raw_b: &str,
        components_a: &AddressComponents,
        components_b: &AddressComponents,
    ) -> f64 {
        if let Some(provider) = self.embedding_provider {
            if let (Some(ea), Some(eb)) = (provider.embed(raw_a), provider.embed(raw_b)) {
                return cosine_similarity(&ea, &eb).clamp(0.0, 1.0);
            }
        }

        let tokens_a: HashSet<String> = raw_a.split_whitespace().map(|t| ascii_fold(t)).collect();
        let tokens_b: HashSet<String> = raw_b.split_whitespace().map(|t| ascii_fold(t)).collect();
        let union = tokens_a.union(&tokens_b).count().max(1);
        let intersection = tokens_a.intersection(&tokens_b).count();
        let jaccard = intersection as f64 / union as f64;

        let shared_admin = [
            fields_match(components_a.province_value(), components_b.province_value()),
            fields_match(components_a.district_value(), components_b.district_value()),
            fields_match(components_a.neighborhood_value(), components_b.neighborhood_value()),
        ]
        .iter()
        .filter(|m| **m)
        .count();
        let bonus = 0.1 * shared_admin.min(3) as f64;

        (jaccard + bonus).min(1.0)
    }

    fn geographic_channel(&self, a: &AddressComponents, b: &AddressComponents) -> f64 {
        let geocoder = Geocoder::new(&self.coord_tables);
        let ga = geocoder.geocode(a);
        let gb = geocoder.geocode(b);

        use crate::PrecisionLevel;
        if ga.precision != PrecisionLevel::None && gb.precision != PrecisionLevel::None {
            let distance = ga.coordinate.haversine_km(&gb.coordinate);
            if distance >= GEO_MISS_DISTANCE_KM {
                return 0.0;
            }
            return (-distance / GEO_DECAY_KM).exp().clamp(0.0, 1.0);
        }

        let province_a = a.province_value();
        let province_b = b.province_value();
        let district_a = a.district_value();
        let district_b = b.district_value();

        if fields_match(province_a, province_b) && fields_match(district_a, district_b) && district_a.is_some() {
            0.8
        } else if fields_match(province_a, province_b) {
            0.5
        } else if are_adjacent_provinces(province_a, province_b) {
            0.4
        } else {
            0.1
        }
    }

    fn textual_channel(&self, corrected_a: &str, corrected_b: &str) -> f64 {
        let tokens_a: HashSet<String> = corrected_a.split_whitespace().map(ascii_fold).collect();
        let tokens_b: HashSet<String> = corrected_b.split_whitespace().map(ascii_fold).collect();
        let max_len = tokens_a.len().max(tokens_b.len()).max(1);
        let token_set_ratio = tokens_a.intersection(&tokens_b).count() as f64 / max_len as f64;

        let char_ratio = levenshtein_similarity(&ascii_fold(corrected_a), &ascii_fold(corrected_b));
        (token_set_ratio + char_ratio) / 2.0
    }

    fn hierarchical_channel(&self, a: &AddressComponents, b: &AddressComponents) -> f64 {
        let fields: &[(Option<&str>, Option<&str>, f64)] = &[
            (a.province_value(), b.province_value(), 0.30),
            (a.district_value(), b.district_value(), 0.25),
            (a.neighborhood_value(), b.neighborhood_value(), 0.20),
            (a.street_value(), b.street_value(), 0.15),
            (a.building_no_value(), b.building_no_value(), 0.05),
            (a.apartment_no_value(), b.apartment_no_value(), 0.05),
        ];

        let mut numerator = 0.0;
        let mut denominator = 0.0;

        for (va, vb, weight) in fields {
            match (va, vb) {
                (None, None) => {}
                (Some(_), None) | (None, Some(_)) => denominator += 0.5 * weight,
                (Some(x), Some(y)) => {
                    let sim = pair_similarity(x, y);
                    numerator += weight * sim;
                    denominator += weight;
                }
            }
        }

        if denominator == 0.0 {
            0.0
        } else {
            numerator / denominator
        }
    }
}

fn fields_match(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => crate::turkish_text::normalize_for_compare(x) == crate::turkish_text::normalize_for_compare(y),
        _ => false,
    }
}

fn are_adjacent_provinces(a: Option<&str>, b: Option<&str>) -> bool {
    let (Some(a), Some(b)) = (a, b) else { return false };
    let na = crate::turkish_text::normalize_for_compare(a);
    let nb = crate::turkish_text::normalize_for_compare(b);
    ADJACENT_PROVINCES
        .iter()
        .any(|(x, y)| (*x == na && *y == nb) || (*x == nb && *y == na))
}

fn pair_similarity(a: &str, b: &str) -> f64 {
    let na = crate::turkish_text::normalize_for_compare(a);
    let nb = crate::turkish_text::normalize_for_compare(b);
    if na == nb {
        1.0
    } else if na.contains(&nb) || nb.contains(&na) {
        0.8
    } else {
        let tokens_a: HashSet<&str> = na.split_whitespace().collect();
        let tokens_b: HashSet<&str> = nb.split_whitespace().collect();
        let union = tokens_a.union(&tokens_b).count().max(1);
        tokens_a.intersection(&tokens_b).count() as f64 / union as f64
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)) as f64
}
