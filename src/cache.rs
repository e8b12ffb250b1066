//! §4.2a ReferenceCache: persists a built [`ReferenceIndex`] to a compact
//! binary file so repeated process startups against the same hierarchy file
//! skip re-parsing tens of thousands of CSV rows. Purely an optimization —
//! a missing, stale, or unwritable cache never affects correctness, only
//! startup latency.

use crate::errors::{ResolverError, Result};
use crate::loaders;
use crate::reference_db::ReferenceIndex;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::SystemTime;

#[derive(Debug, Serialize, Deserialize)]
struct Fingerprint {
    hierarchy_len: u64,
    hierarchy_modified: Option<u64>,
    postal_len: u64,
    postal_modified: Option<u64>,
}

#[derive(Deserialize)]
struct CacheFileOwned {
    fingerprint: Fingerprint,
    index: ReferenceIndex,
}

#[derive(Serialize)]
struct CacheFileRef<'a> {
    fingerprint: &'a Fingerprint,
    index: &'a ReferenceIndex,
}

fn fingerprint_of(path: &Path) -> (u64, Option<u64>) {
    match std::fs::metadata(path) {
        Ok(meta) => {
            let modified = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
                .map(|d| d.as_secs());
            (meta.len(), modified)
        }
        Err(_) => (0, None),
    }
}

fn current_fingerprint(hierarchy_path: &Path, postal_path: Option<&Path>) -> Fingerprint {
    let (hierarchy_len, hierarchy_modified) = fingerprint_of(hierarchy_path);
    let (postal_len, postal_modified) = postal_path
        .map(fingerprint_of)
        .unwrap_or((0, None));
    Fingerprint {
        hierarchy_len,
        hierarchy_modified,
        postal_len,
        postal_modified,
    }
}

/// Loads a `ReferenceIndex` from `cache_path` if present and fingerprint-fresh
/// against `hierarchy_path`/`postal_path`; otherwise builds it from CSV via
/// [`loaders`] and (best-effort) writes it back to `cache_path`.
pub fn load_or_build(
    hierarchy_path: &Path,
    postal_path: Option<&Path>,
    cache_path: Option<&Path>,
) -> Result<ReferenceIndex> {
    let fingerprint = current_fingerprint(hierarchy_path, postal_path);

    if let Some(cache_path) = cache_path {
        if let Some(index) = try_load_fresh(cache_path, &fingerprint) {
            info!("loaded reference index from cache {}", cache_path.display());
            return Ok(index);
        }
    }

    let rows = loaders::load_hierarchy_csv(hierarchy_path)?;
    let (mut index, stats) = ReferenceIndex::build(rows);
    info!(
        "built reference index from {}: {} rows accepted, {} skipped",
        hierarchy_path.display(),
        stats.accepted,
        stats.skipped
    );

    if let Some(postal_path) = postal_path {
        for (code, province, district) in loaders::load_postal_csv(postal_path)? {
            index.add_postal_code(&code, &province, &district);
        }
    }

    if let Some(cache_path) = cache_path {
        if let Err(e) = save(cache_path, &fingerprint, &index) {
            warn!("failed to write reference cache {}: {e}", cache_path.display());
        }
    }

    Ok(index)
}

fn try_load_fresh(cache_path: &Path, expected: &Fingerprint) -> Option<ReferenceIndex> {
    let file = File::open(cache_path).ok()?;
    let cached: CacheFileOwned = bincode::deserialize_from(BufReader::new(file)).ok()?;
    if cached.fingerprint.hierarchy_len == expected.hierarchy_len
        && cached.fingerprint.hierarchy_modified == expected.hierarchy_modified
        && cached.fingerprint.postal_len == expected.postal_len
        && cached.fingerprint.postal_modified == expected.postal_modified
    {
        Some(cached.index)
    } else {
        None
    }
}

fn save(cache_path: &Path, fingerprint: &Fingerprint, index: &ReferenceIndex) -> Result<()> {
    let file = File::create(cache_path)?;
    let cache_file = CacheFileRef { fingerprint, index };
    bincode::serialize_into(BufWriter::new(file), &cache_file)
        .map_err(|e| ResolverError::Cache(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cache_round_trips_an_index() {
        let mut hierarchy = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(hierarchy, "il_adi,ilce_adi,mahalle_adi").unwrap();
        writeln!(hierarchy, "İstanbul,Kadıköy,Moda Mahallesi").unwrap();
        hierarchy.flush().unwrap();

        let cache_dir = tempfile::tempdir().unwrap();
        let cache_path = cache_dir.path().join("ref.bin");

        let first = load_or_build(hierarchy.path(), None, Some(&cache_path)).unwrap();
        assert!(cache_path.exists());

        let second = load_or_build(hierarchy.path(), None, Some(&cache_path)).unwrap();
        assert_eq!(first.provinces, second.provinces);
        assert_eq!(first.all_neighborhoods, second.all_neighborhoods);
    }

    #[test]
    fn stale_cache_is_rebuilt() {
        let mut hierarchy = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(hierarchy, "il_adi,ilce_adi,mahalle_adi").unwrap();
        writeln!(hierarchy, "İstanbul,Kadıköy,Moda Mahallesi").unwrap();
        hierarchy.flush().unwrap();

        let cache_dir = tempfile::tempdir().unwrap();
        let cache_path = cache_dir.path().join("ref.bin");
        load_or_build(hierarchy.path(), None, Some(&cache_path)).unwrap();

        writeln!(hierarchy, "Ankara,Çankaya,Kızılay Mahallesi").unwrap();
        hierarchy.flush().unwrap();

        let rebuilt = load_or_build(hierarchy.path(), None, Some(&cache_path)).unwrap();
        assert!(rebuilt.is_province("ankara"));
    }
}
