//! Parsers for the external reference and configuration files in §6:
//! the hierarchy/postal CSVs and the abbreviation/spelling/coordinate JSON
//! files. Kept separate from [`crate::reference_db`] so the index itself has
//! no I/O dependency and can be built from any row source (tests build it
//! from literal tuples).

use crate::errors::{ResolverError, Result};
use log::warn;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct HierarchyRow {
    il_adi: String,
    ilce_adi: String,
    mahalle_adi: String,
    #[serde(default)]
    #[allow(dead_code)]
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostalRow {
    postal_code: String,
    il: String,
    ilce: String,
}

/// Reads the hierarchy CSV (`il_adi, ilce_adi, mahalle_adi[, source]`),
/// returning `(province, district, neighborhood)` triples. A row that fails
/// to deserialize is logged and skipped (`MalformedReference`), never fatal.
pub fn load_hierarchy_csv(path: &Path) -> Result<Vec<(String, String, String)>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        ResolverError::ReferenceUnavailable(format!("{}: {e}", path.display()))
    })?;

    let mut rows = Vec::new();
    for result in reader.deserialize::<HierarchyRow>() {
        match result {
            Ok(row) => rows.push((row.il_adi, row.ilce_adi, row.mahalle_adi)),
            Err(e) => warn!("skipping malformed hierarchy row in {}: {e}", path.display()),
        }
    }
    Ok(rows)
}

/// Reads the postal-code CSV (`postal_code, il, ilce`), returning
/// `(postal_code, province, district)` triples.
pub fn load_postal_csv(path: &Path) -> Result<Vec<(String, String, String)>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        ResolverError::ReferenceUnavailable(format!("{}: {e}", path.display()))
    })?;

    let mut rows = Vec::new();
    for result in reader.deserialize::<PostalRow>() {
        match result {
            Ok(row) => rows.push((row.postal_code, row.il, row.ilce)),
            Err(e) => warn!("skipping malformed postal row in {}: {e}", path.display()),
        }
    }
    Ok(rows)
}

/// Parses the abbreviation JSON (flat or categorized) into a flat
/// `abbreviation -> full_form` map, registering both the bare key and a
/// trailing-`.` variant.
pub fn load_abbreviations_json(path: &Path) -> Result<HashMap<String, String>> {
    let raw = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let mut out = HashMap::new();
    flatten_abbreviation_value(&value, &mut out);
    Ok(out)
}

fn flatten_abbreviation_value(value: &serde_json::Value, out: &mut HashMap<String, String>) {
    match value {
        serde_json::Value::Object(map) => {
            for (k, v) in map {
                if k.starts_with("_comment") {
                    continue;
                }
                match v {
                    serde_json::Value::String(full_form) => insert_abbrev(out, k, full_form),
                    serde_json::Value::Object(_) => flatten_abbreviation_value(v, out),
                    _ => {}
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                if let (Some(abbrev), Some(full_form)) = (
                    item.get("abbreviation").and_then(|v| v.as_str()),
                    item.get("full_form").and_then(|v| v.as_str()),
                ) {
                    insert_abbrev(out, abbrev, full_form);
                }
            }
        }
        _ => {}
    }
}

fn insert_abbrev(out: &mut HashMap<String, String>, abbrev: &str, full_form: &str) {
    let abbrev_lower = abbrev.to_lowercase();
    let full_lower = full_form.to_lowercase();
    let bare = abbrev_lower.trim_end_matches('.').to_string();
    out.insert(bare.clone(), full_lower.clone());
    out.insert(format!("{bare}."), full_lower);
}

/// Parses the spelling-correction JSON: a flat `misspelling -> canonical` map,
/// keys lowercased.
pub fn load_spelling_json(path: &Path) -> Result<HashMap<String, String>> {
    let raw = std::fs::read_to_string(path)?;
    let map: HashMap<String, String> = serde_json::from_str(&raw)?;
    Ok(map.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect())
}

/// Parses a coordinate file, either JSON (`{key: [lat, lon]}`) or CSV
/// (`key,lat,lon`), detected from the file extension.
pub fn load_coords(path: &Path) -> Result<HashMap<String, (f64, f64)>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_coords_json(path),
        _ => load_coords_csv(path),
    }
}

fn load_coords_json(path: &Path) -> Result<HashMap<String, (f64, f64)>> {
    let raw = std::fs::read_to_string(path)?;
    let map: HashMap<String, (f64, f64)> = serde_json::from_str(&raw)?;
    Ok(map)
}

fn load_coords_csv(path: &Path) -> Result<HashMap<String, (f64, f64)>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        ResolverError::ReferenceUnavailable(format!("{}: {e}", path.display()))
    })?;
    let mut out = HashMap::new();
    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping malformed coordinate row in {}: {e}", path.display());
                continue;
            }
        };
        if record.len() < 3 {
            continue;
        }
        let (key, lat, lon) = (record[0].to_string(), record[1].parse::<f64>(), record[2].parse::<f64>());
        match (lat, lon) {
            (Ok(lat), Ok(lon)) => {
                out.insert(key, (lat, lon));
            }
            _ => warn!("skipping non-numeric coordinate row in {}", path.display()),
        }
    }
    Ok(out)
}
