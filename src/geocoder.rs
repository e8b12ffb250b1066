//! §4.7 Geocoder: picks the finest available precision level from four
//! coordinate lookup tables, falling back through coarser levels and
//! discarding any out-of-bounds hit.

use crate::turkish_text::normalize_for_compare;
use crate::{AddressComponents, Coordinate, PrecisionLevel};
use log::warn;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct CoordTables {
    pub street: HashMap<String, (f64, f64)>,
    pub neighborhood: HashMap<String, (f64, f64)>,
    pub district: HashMap<String, (f64, f64)>,
    pub province: HashMap<String, (f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub coordinate: Coordinate,
    pub precision: PrecisionLevel,
    pub confidence: f64,
    pub alternatives: Vec<(PrecisionLevel, Coordinate)>,
}

pub struct Geocoder<'a> {
    tables: &'a CoordTables,
}

impl<'a> Geocoder<'a> {
    pub fn new(tables: &'a CoordTables) -> Self {
        Self { tables }
    }

    pub fn geocode(&self, components: &AddressComponents) -> GeocodeResult {
        let hits = self.all_hits(components);

        let Some((best_level, best_coord)) = hits.first().copied() else {
            return GeocodeResult {
                coordinate: Coordinate::zero(),
                precision: PrecisionLevel::None,
                confidence: 0.0,
                alternatives: Vec::new(),
            };
        };

        let alternatives = hits.into_iter().skip(1).collect();
        GeocodeResult {
            coordinate: best_coord,
            precision: best_level,
            confidence: best_level.default_confidence(),
            alternatives,
        }
    }

    /// Every precision level with an in-bounds coordinate hit, ordered finest
    /// (street) to coarsest (province) per §4.7 — the first entry is the
    /// chosen result, the rest are the explainability alternatives.
    fn all_hits(&self, components: &AddressComponents) -> Vec<(PrecisionLevel, Coordinate)> {
        let mut hits = Vec::new();

        if let Some(street) = components.street_value() {
            if let Some(coord) = self.lookup_in_bounds(&self.tables.street, street, "street") {
                hits.push((PrecisionLevel::Street, coord));
            }
        }

        if let Some(neighborhood) = components.neighborhood_value() {
            let composite_key = match (components.neighborhood_value(), components.district_value()) {
                (Some(n), Some(d)) => Some(format!("{n}_{d}")),
                _ => None,
            };
            let coord = composite_key
                .as_deref()
                .and_then(|k| self.lookup_in_bounds(&self.tables.neighborhood, k, "neighborhood"))
                .or_else(|| self.lookup_in_bounds(&self.tables.neighborhood, neighborhood, "neighborhood"));
            if let Some(coord) = coord {
                hits.push((PrecisionLevel::Neighborhood, coord));
            }
        }

        if let Some(district) = components.district_value() {
            if let Some(coord) = self.lookup_in_bounds(&self.tables.district, district, "district") {
                hits.push((PrecisionLevel::District, coord));
            }
        }

        if let Some(province) = components.province_value() {
            if let Some(coord) = self.lookup_in_bounds(&self.tables.province, province, "province") {
                hits.push((PrecisionLevel::Province, coord));
            }
        }

        hits
    }

    fn lookup_in_bounds(&self, table: &HashMap<String, (f64, f64)>, key: &str, level: &str) -> Option<Coordinate> {
        let normalized = normalize_for_compare(key);
        let (lat, lon) = *table.get(&normalized)?;
        let coord = Coordinate::new(lat, lon);
        if coord.in_turkey_bounds() {
            Some(coord)
        } else {
            warn!("discarding out-of-bounds {level} coordinate for '{key}': ({lat}, {lon})");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ComponentField;

    fn sample_tables() -> CoordTables {
        let mut tables = CoordTables::default();
        tables.neighborhood.insert("moda mahallesi".to_string(), (40.9816, 29.0275));
        tables.province.insert("i̇stanbul".to_string(), (41.0082, 28.9784));
        tables.province.insert("istanbul".to_string(), (41.0082, 28.9784));
        tables.district.insert("paris".to_string(), (48.8566, 2.3522));
        tables
    }

    #[test]
    fn falls_back_to_neighborhood_when_no_street() {
        let tables = sample_tables();
        let geocoder = Geocoder::new(&tables);
        let components = AddressComponents {
            neighborhood: Some(ComponentField::new("Moda Mahallesi", 0.95)),
            ..Default::default()
        };
        let result = geocoder.geocode(&components);
        assert_eq!(result.precision, PrecisionLevel::Neighborhood);
    }

    #[test]
    fn out_of_bounds_coordinate_falls_through() {
        let tables = sample_tables();
        let geocoder = Geocoder::new(&tables);
        let components = AddressComponents {
            district: Some(ComponentField::new("Paris", 0.90)),
            ..Default::default()
        };
        let result = geocoder.geocode(&components);
        assert_eq!(result.precision, PrecisionLevel::None);
    }

    #[test]
    fn no_components_gives_none_precision() {
        let tables = CoordTables::default();
        let geocoder = Geocoder::new(&tables);
        let result = geocoder.geocode(&AddressComponents::default());
        assert_eq!(result.precision, PrecisionLevel::None);
        assert_eq!(result.coordinate, Coordinate::zero());
    }

    #[test]
    fn reports_coarser_alternatives_for_explainability() {
        let mut tables = sample_tables();
        tables.district.insert("kadıköy".to_string(), (40.99, 29.03));
        let geocoder = Geocoder::new(&tables);
        let components = AddressComponents {
            district: Some(ComponentField::new("Kadıköy", 0.90)),
            neighborhood: Some(ComponentField::new("Moda Mahallesi", 0.95)),
            ..Default::default()
        };
        let result = geocoder.geocode(&components);
        assert_eq!(result.precision, PrecisionLevel::Neighborhood);
        assert_eq!(result.alternatives.len(), 1);
        assert_eq!(result.alternatives[0].0, PrecisionLevel::District);
    }
}
