//! §4.10 Pipeline: orchestrates Corrector -> Parser -> HierarchyCompleter ->
//! Validator -> Geocoder for a single address, collecting per-stage timings
//! and a final weighted confidence.

use crate::corrector::Corrector;
use crate::errors::ResolverError;
use crate::geocoder::{CoordTables, Geocoder};
use crate::hierarchy_completer::HierarchyCompleter;
use crate::parser::Parser;
use crate::reference_db::ReferenceIndex;
use crate::timing::Timer;
use crate::validator::{Validator, ValidationResult};
use crate::{step_timings_map, AddressComponents, Coordinate, CorrectionEdit, PipelineStatus, PrecisionLevel};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    pub input: String,
    pub corrected: String,
    pub components: AddressComponents,
    pub edits: Vec<CorrectionEdit>,
    pub validation: ValidationResult,
    pub precision: PrecisionLevel,
    pub coordinate: Coordinate,
    pub confidence: f64,
    pub step_timings_ms: HashMap<String, f64>,
    pub status: PipelineStatus,
    pub errors: Vec<String>,
    pub suggestions: Vec<String>,
}

pub struct Pipeline<'a> {
    idx: &'a ReferenceIndex,
    coord_tables: CoordTables,
    abbreviations: Option<HashMap<String, String>>,
    spelling: Option<HashMap<String, String>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(idx: &'a ReferenceIndex) -> Self {
        Self {
            idx,
            coord_tables: CoordTables::default(),
            abbreviations: None,
            spelling: None,
        }
    }

    pub fn with_coord_tables(mut self, tables: CoordTables) -> Self {
        self.coord_tables = tables;
        self
    }

    pub fn with_abbreviations(mut self, abbreviations: HashMap<String, String>) -> Self {
        self.abbreviations = Some(abbreviations);
        self
    }

    pub fn with_spelling(mut self, spelling: HashMap<String, String>) -> Self {
        self.spelling = Some(spelling);
        self
    }

    /// Runs the full per-address pipeline (§4.10). `best_match` defaults to
    /// `0` when no comparison against another address is requested.
    pub fn resolve(&self, raw: &str) -> PipelineResult {
        self.resolve_with_best_match(raw, 0.0)
    }

    pub fn resolve_with_best_match(&self, raw: &str, best_match: f64) -> PipelineResult {
        let trimmed = raw.trim();
        if trimmed.chars().count() < 5 {
            let reason = if trimmed.is_empty() {
                "empty input".to_string()
            } else {
                "fewer than 5 usable characters".to_string()
            };
            return PipelineResult {
                input: raw.to_string(),
                corrected: String::new(),
                components: AddressComponents::default(),
                edits: Vec::new(),
                validation: ValidationResult {
                    is_valid: false,
                    confidence: 0.0,
                    completeness: 0.0,
                    warnings: Vec::new(),
                    errors: Vec::new(),
                    suggestions: Vec::new(),
                },
                precision: PrecisionLevel::None,
                coordinate: Coordinate::zero(),
                confidence: 0.0,
                step_timings_ms: HashMap::new(),
                status: PipelineStatus::Error,
                errors: vec![ResolverError::InvalidInput(reason).to_string()],
                suggestions: Vec::new(),
            };
        }

        let mut timings = Vec::new();
        let mut errors = Vec::new();

        let mut corrector = Corrector::new(self.idx);
        if let Some(abbrev) = self.abbreviations.clone() {
            corrector = corrector.with_abbreviations(abbrev);
        }
        if let Some(spelling) = self.spelling.clone() {
            corrector = corrector.with_spelling(spelling);
        }
        let correction_timer = Timer::new("corrector");
        let (corrected, mut edits, correction_confidence) = corrector.correct(raw);
        timings.push(("corrector", correction_timer.elapsed_ms()));

        let parser = Parser::new(self.idx);
        let parse_timer = Timer::new("parser");
        let mut parse_result = parser.parse(&corrected);
        timings.push(("parser", parse_timer.elapsed_ms()));
        edits.append(&mut parse_result.edits);
        for conflict in parse_result.conflicts {
            errors.push(conflict.to_string());
        }

        let completer = HierarchyCompleter::new(self.idx);
        let completion_timer = Timer::new("hierarchy_completer");
        let mut completion_edits = completer.complete(&mut parse_result.components);
        timings.push(("hierarchy_completer", completion_timer.elapsed_ms()));
        edits.append(&mut completion_edits);

        let validator = Validator::new(self.idx);
        let validation_timer = Timer::new("validator");
        let validation = validator.validate(&parse_result.components);
        timings.push(("validator", validation_timer.elapsed_ms()));
        errors.extend(validation.errors.iter().cloned());
        let mut suggestions = validation.warnings.clone();
        suggestions.extend(validation.suggestions.iter().cloned());

        let geocoder = Geocoder::new(&self.coord_tables);
        let geocode_timer = Timer::new("geocoder");
        let geocode = geocoder.geocode(&parse_result.components);
        timings.push(("geocoder", geocode_timer.elapsed_ms()));

        let confidence = crate::round4(
            0.35 * validation.confidence
                + 0.25 * parse_result.confidence
                + 0.15 * correction_confidence
                + 0.25 * best_match,
        );

        if confidence < 0.3 {
            suggestions.push(ResolverError::LowConfidence(confidence).to_string());
        }

        PipelineResult {
            input: raw.to_string(),
            corrected,
            components: parse_result.components,
            edits,
            validation,
            precision: geocode.precision,
            coordinate: geocode.coordinate,
            confidence,
            step_timings_ms: step_timings_map(timings),
            status: PipelineStatus::Completed,
            errors,
            suggestions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference_db::ReferenceIndex;

    fn sample_index() -> ReferenceIndex {
        let (idx, _) = ReferenceIndex::build(vec![(
            "İstanbul".to_string(),
            "Kadıköy".to_string(),
            "Moda Mahallesi".to_string(),
        )]);
        idx
    }

    #[test]
    fn resolves_a_full_address() {
        let idx = sample_index();
        let pipeline = Pipeline::new(&idx);
        let result = pipeline.resolve("istbl kadikoy moda mah caferaga sk 10");
        assert_eq!(result.status, PipelineStatus::Completed);
        assert!(result.corrected.contains("İstanbul"));
        assert_eq!(result.components.province_value(), Some("İstanbul"));
        assert!(result.confidence > 0.0);
    }

    #[test]
    fn empty_input_produces_error_status() {
        let idx = sample_index();
        let pipeline = Pipeline::new(&idx);
        let result = pipeline.resolve("   ");
        assert_eq!(result.status, PipelineStatus::Error);
        assert!(!result.errors.is_empty());
    }

    #[test]
    fn short_input_is_rejected_before_the_pipeline_runs() {
        let idx = sample_index();
        let pipeline = Pipeline::new(&idx);
        let result = pipeline.resolve("ab");
        assert_eq!(result.status, PipelineStatus::Error);
        assert!(result.errors[0].contains("invalid input"));
    }

    #[test]
    fn unresolvable_input_surfaces_a_low_confidence_advisory() {
        let idx = sample_index();
        let pipeline = Pipeline::new(&idx);
        let result = pipeline.resolve("zzzzz qqqqq wwwww");
        assert!(result.confidence < 0.3, "expected low confidence, got {}", result.confidence);
        assert!(result.suggestions.iter().any(|s| s.contains("advisory floor")));
    }

    #[test]
    fn corrected_has_no_leading_trailing_or_double_whitespace() {
        let idx = sample_index();
        let pipeline = Pipeline::new(&idx);
        let result = pipeline.resolve("  istanbul   kadikoy  moda mah  ");
        assert_eq!(result.corrected, result.corrected.trim());
        assert!(!result.corrected.contains("  "));
    }
}
