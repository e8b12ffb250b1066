//! Turkish postal address resolution: correction, parsing, hierarchical
//! completion, validation, similarity, geocoding, and duplicate clustering.
//!
//! The three library entry points mirror the external interface in
//! `SPEC_FULL.md` §6:
//!
//! - [`resolve`] — the full per-address pipeline (§4.10).
//! - [`similarity`] — four-channel comparison of two raw addresses (§4.8).
//! - [`deduplicate`] — batch clustering by similarity threshold (§4.9).

pub mod cache;
pub mod config;
pub mod corrector;
pub mod duplicate_clusterer;
pub mod errors;
pub mod fuzzy;
pub mod geocoder;
pub mod hierarchy_completer;
pub mod loaders;
pub mod matcher;
pub mod parser;
pub mod pipeline;
pub mod reference_db;
pub mod timing;
pub mod turkish_text;
pub mod validator;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use duplicate_clusterer::ClusterStats;
pub use errors::{ResolverError, Result};
pub use matcher::MatchResult;
pub use pipeline::PipelineResult;
pub use reference_db::ReferenceIndex;

/// Turkey's bounding box (§3): any coordinate outside is invalid.
pub const TURKEY_LAT_RANGE: (f64, f64) = (35.8, 42.1);
pub const TURKEY_LON_RANGE: (f64, f64) = (25.7, 44.8);

/// A decimal-degree WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: round6(latitude),
            longitude: round6(longitude),
        }
    }

    pub fn zero() -> Self {
        Self { latitude: 0.0, longitude: 0.0 }
    }

    /// Whether this coordinate falls within Turkey's bounding box (§3).
    pub fn in_turkey_bounds(&self) -> bool {
        (TURKEY_LAT_RANGE.0..=TURKEY_LAT_RANGE.1).contains(&self.latitude)
            && (TURKEY_LON_RANGE.0..=TURKEY_LON_RANGE.1).contains(&self.longitude)
    }

    /// Great-circle distance in km, Earth radius 6371 km (§4.8).
    pub fn haversine_km(&self, other: &Coordinate) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();
        EARTH_RADIUS_KM * c
    }
}

pub(crate) fn round6(x: f64) -> f64 {
    (x * 1_000_000.0).round() / 1_000_000.0
}

pub(crate) fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Ordered precision tiers a geocode result can land on (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrecisionLevel {
    None,
    Province,
    District,
    Neighborhood,
    Street,
}

impl PrecisionLevel {
    /// The default confidence assigned to this precision tier (§3).
    pub fn default_confidence(self) -> f64 {
        match self {
            PrecisionLevel::Street => 0.95,
            PrecisionLevel::Neighborhood => 0.85,
            PrecisionLevel::District => 0.75,
            PrecisionLevel::Province => 0.50,
            PrecisionLevel::None => 0.0,
        }
    }
}

/// The canonical street-type suffix forms (glossary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreetType {
    Sokak,
    Cadde,
    Bulvar,
    Yol,
}

impl StreetType {
    /// The canonical display suffix, e.g. `Sokak`, `Caddesi`, `Bulvarı`.
    pub fn canonical_suffix(self) -> &'static str {
        match self {
            StreetType::Sokak => "Sokak",
            StreetType::Cadde => "Caddesi",
            StreetType::Bulvar => "Bulvarı",
            StreetType::Yol => "Yolu",
        }
    }
}

/// A single extracted field with its per-field confidence (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentField {
    pub value: String,
    pub confidence: f64,
}

impl ComponentField {
    pub fn new(value: impl Into<String>, confidence: f64) -> Self {
        Self { value: value.into(), confidence }
    }
}

/// Typed, optional-per-field address components (§3, §9: never a stringly-keyed bag).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressComponents {
    pub province: Option<ComponentField>,
    pub district: Option<ComponentField>,
    pub neighborhood: Option<ComponentField>,
    pub street: Option<ComponentField>,
    pub street_type: Option<StreetType>,
    pub building_no: Option<ComponentField>,
    pub apartment_no: Option<ComponentField>,
    pub floor: Option<ComponentField>,
    pub block: Option<ComponentField>,
    pub site: Option<ComponentField>,
    pub postal_code: Option<ComponentField>,
}

impl AddressComponents {
    pub fn province_value(&self) -> Option<&str> {
        self.province.as_ref().map(|f| f.value.as_str())
    }
    pub fn district_value(&self) -> Option<&str> {
        self.district.as_ref().map(|f| f.value.as_str())
    }
    pub fn neighborhood_value(&self) -> Option<&str> {
        self.neighborhood.as_ref().map(|f| f.value.as_str())
    }
    pub fn street_value(&self) -> Option<&str> {
        self.street.as_ref().map(|f| f.value.as_str())
    }
    pub fn building_no_value(&self) -> Option<&str> {
        self.building_no.as_ref().map(|f| f.value.as_str())
    }
    pub fn apartment_no_value(&self) -> Option<&str> {
        self.apartment_no.as_ref().map(|f| f.value.as_str())
    }
    pub fn postal_code_value(&self) -> Option<&str> {
        self.postal_code.as_ref().map(|f| f.value.as_str())
    }
}

/// A single correction applied by the [`corrector`] or [`hierarchy_completer`] (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionEdit {
    pub kind: EditKind,
    pub original: String,
    pub replacement: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditKind {
    AbbreviationExpansion,
    SpellingFix,
    FuzzyAdminFix,
    CharacterFix,
    CaseFix,
}

/// The four similarity channels (§3, §4.8), each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityBreakdown {
    pub semantic: f64,
    pub geographic: f64,
    pub textual: f64,
    pub hierarchical: f64,
}

/// Per-address pipeline outcome (§3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStatus {
    Completed,
    Error,
}

/// Convenience wrapper: resolves a single raw address through the full
/// pipeline (§4.10). Equivalent to `pipeline::Pipeline::new(idx).resolve(raw)`.
pub fn resolve(raw: &str, idx: &ReferenceIndex) -> PipelineResult {
    pipeline::Pipeline::new(idx).resolve(raw)
}

/// Convenience wrapper: computes the four-channel similarity between two raw
/// addresses (§4.8).
pub fn similarity(raw_a: &str, raw_b: &str, idx: &ReferenceIndex) -> MatchResult {
    matcher::Matcher::new(idx).compare(raw_a, raw_b)
}

/// Convenience wrapper: partitions a batch of raw addresses into duplicate
/// groups at `threshold` (§4.9).
pub fn deduplicate(
    raws: &[String],
    threshold: f64,
    idx: &ReferenceIndex,
) -> (Vec<Vec<usize>>, ClusterStats) {
    duplicate_clusterer::DuplicateClusterer::new(idx, threshold).cluster(raws)
}

pub(crate) fn step_timings_map(pairs: Vec<(&str, f64)>) -> HashMap<String, f64> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
