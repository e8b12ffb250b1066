//! Resolves CLI flags into a single [`ResolverConfig`] consumed by startup
//! (§3, §4.11). Kept separate from `main.rs` so a library caller can build
//! one directly without going through `clap`.

use std::path::PathBuf;

/// The resolved form of the CLI/environment surface in §6.
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    pub hierarchy_path: PathBuf,
    pub postal_path: Option<PathBuf>,
    pub abbrev_path: Option<PathBuf>,
    pub spelling_path: Option<PathBuf>,
    pub coords_dir: Option<PathBuf>,
    pub embedding_endpoint: Option<String>,
    pub cache_path: Option<PathBuf>,
}

impl ResolverConfig {
    pub fn new(hierarchy_path: impl Into<PathBuf>) -> Self {
        Self {
            hierarchy_path: hierarchy_path.into(),
            ..Default::default()
        }
    }

    pub fn with_postal(mut self, path: impl Into<PathBuf>) -> Self {
        self.postal_path = Some(path.into());
        self
    }

    pub fn with_abbrev(mut self, path: impl Into<PathBuf>) -> Self {
        self.abbrev_path = Some(path.into());
        self
    }

    pub fn with_spelling(mut self, path: impl Into<PathBuf>) -> Self {
        self.spelling_path = Some(path.into());
        self
    }

    pub fn with_coords_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.coords_dir = Some(path.into());
        self
    }

    pub fn with_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_paths() {
        let cfg = ResolverConfig::new("hierarchy.csv")
            .with_postal("postal.csv")
            .with_cache("ref.bin");
        assert_eq!(cfg.hierarchy_path, PathBuf::from("hierarchy.csv"));
        assert_eq!(cfg.postal_path, Some(PathBuf::from("postal.csv")));
        assert_eq!(cfg.cache_path, Some(PathBuf::from("ref.bin")));
        assert!(cfg.abbrev_path.is_none());
    }
}
