//! Typed error hierarchy for the resolver pipeline.

use thiserror::Error;

/// Everything that can go wrong while building a [`crate::reference_db::ReferenceIndex`]
/// or resolving a single address.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("required reference file unavailable: {0}")]
    ReferenceUnavailable(String),

    #[error("malformed reference row skipped: {0}")]
    MalformedReference(String),

    #[error("geographic conflict: token '{token}' implies {expected_province}, but parsed province was {parsed_province:?}")]
    GeographicConflict {
        token: String,
        expected_province: String,
        parsed_province: Option<String>,
    },

    #[error("confidence {0:.2} is below the advisory floor")]
    LowConfidence(f64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cache (de)serialization error: {0}")]
    Cache(String),
}

impl ResolverError {
    /// Maps a startup-fatal error to the process exit code documented in the CLI surface.
    pub fn exit_code(&self) -> i32 {
        match self {
            ResolverError::ReferenceUnavailable(_) | ResolverError::Io(_) => 3,
            ResolverError::Csv(_) | ResolverError::Json(_) | ResolverError::Cache(_) => 2,
            ResolverError::InvalidInput(_)
            | ResolverError::MalformedReference(_)
            | ResolverError::GeographicConflict { .. }
            | ResolverError::LowConfidence(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, ResolverError>;
