//! §4.3 Corrector: raw line -> normalized, spelling-corrected,
//! abbreviation-expanded string, plus the trail of edits applied.

use crate::reference_db::ReferenceIndex;
use crate::turkish_text::{preserve_turkish, title_word};
use crate::{CorrectionEdit, EditKind};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref BUILDING_NUMBER_RE: Regex = Regex::new(r"^\d+[/-]?[A-Za-z]?$").unwrap();
    static ref DIGIT_ONLY_RE: Regex = Regex::new(r"^\d+$").unwrap();
    static ref COMBINING_ARTIFACT_RE: Regex = Regex::new(r"[\u{0307}\u{0302}]").unwrap();
    static ref COLON_GLUED_RE: Regex = Regex::new(r"(\p{L}+):(?=[\p{L}\p{N}])").unwrap();
}

/// Splits `"No:25/A"`/`"Daire:3"`-style colon-glued keyword/value pairs into
/// separate words before whitespace tokenization, the way they would read if
/// written with a space. Left untouched otherwise: a keyword with nothing
/// glued to it (`"No:"` at end of string) never reaches step 2 as its own
/// meaningful token anyway.
fn split_colon_glued_tokens(s: &str) -> String {
    COLON_GLUED_RE.replace_all(s, "$1 ").to_string()
}

const MIN_FUZZY_TOKEN_LEN: usize = 3;

/// The common-misspelling table from §4.3 step 3, `{misspelling -> canonical}`.
/// Covers forms the fuzzy admin pass (step 4) cannot reach because the
/// canonical form isn't itself a province/district/neighborhood (e.g. a
/// street-name component like `atatürk`). External callers may supersede/extend
/// this via `Corrector::with_spelling`.
pub fn default_spelling_corrections() -> HashMap<String, String> {
    let pairs: &[(&str, &str)] = &[
        ("istbl", "istanbul"),
        ("istanbull", "istanbul"),
        ("kadikoy", "kadıköy"),
        ("atatuk", "atatürk"),
        ("ataturk", "atatürk"),
        ("bagdat", "bağdat"),
        ("caferaga", "caferağa"),
        ("kizilay", "kızılay"),
        ("cankaya", "çankaya"),
        ("uskudar", "üsküdar"),
        ("besiktas", "beşiktaş"),
        ("sisli", "şişli"),
        ("gaziosmanpasa", "gaziosmanpaşa"),
        ("bahcelievler", "bahçelievler"),
        ("kucukcekmece", "küçükçekmece"),
    ];
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// The abbreviation table from §4.3 step 2, `{abbreviation -> full form}`.
/// External callers may supersede/extend this via `Corrector::with_abbreviations`.
pub fn default_abbreviations() -> HashMap<String, String> {
    let pairs: &[(&str, &str)] = &[
        ("mah", "mahallesi"),
        ("mh", "mahallesi"),
        ("sk", "sokak"),
        ("sok", "sokak"),
        ("cd", "caddesi"),
        ("cad", "caddesi"),
        ("blv", "bulvarı"),
        ("bulv", "bulvarı"),
        ("no", "numara"),
        ("num", "numara"),
        ("d", "daire"),
        ("dr", "daire"),
        ("kt", "kat"),
        ("apt", "apartmanı"),
        ("bl", "blok"),
        ("st", "sitesi"),
    ];
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

pub struct Corrector<'a> {
    idx: &'a ReferenceIndex,
    abbreviations: HashMap<String, String>,
    spelling: HashMap<String, String>,
}

impl<'a> Corrector<'a> {
    pub fn new(idx: &'a ReferenceIndex) -> Self {
        Self {
            idx,
            abbreviations: default_abbreviations(),
            spelling: default_spelling_corrections(),
        }
    }

    pub fn with_abbreviations(mut self, abbreviations: HashMap<String, String>) -> Self {
        self.abbreviations = abbreviations;
        self
    }

    pub fn with_spelling(mut self, spelling: HashMap<String, String>) -> Self {
        self.spelling = spelling;
        self
    }

    /// Runs the strict six-step pipeline from §4.3 and returns the corrected
    /// string, the ordered edit trail, and the correction confidence.
    pub fn correct(&self, raw: &str) -> (String, Vec<CorrectionEdit>, f64) {
        if raw.trim().is_empty() {
            return (raw.to_string(), Vec::new(), 0.0);
        }

        let mut edits = Vec::new();
        let preserved = preserve_turkish(raw);
        let despaced = split_colon_glued_tokens(&preserved);

        let tokens: Vec<String> = despaced.split_whitespace().map(String::from).collect();
        let tokens = self.expand_abbreviations(tokens, &mut edits);
        let tokens = self.fix_spelling(tokens, &mut edits);
        let mut low_confidence_fuzzy_edits = 0usize;
        let tokens = self.fuzzy_correct(tokens, &mut edits, &mut low_confidence_fuzzy_edits);
        let tokens = self.fix_characters(tokens);
        let final_tokens = self.title_case(tokens);

        let corrected = final_tokens.join(" ");
        let confidence = self.confidence(edits.len(), low_confidence_fuzzy_edits);
        (corrected, edits, confidence)
    }

    fn expand_abbreviations(&self, tokens: Vec<String>, edits: &mut Vec<CorrectionEdit>) -> Vec<String> {
        tokens
            .into_iter()
            .map(|token| {
                if BUILDING_NUMBER_RE.is_match(&token) {
                    return token;
                }
                let bare = token.trim_end_matches('.');
                let key = bare.to_lowercase();
                if let Some(full_form) = self.abbreviations.get(&key) {
                    edits.push(CorrectionEdit {
                        kind: EditKind::AbbreviationExpansion,
                        original: token.clone(),
                        replacement: full_form.clone(),
                    });
                    full_form.clone()
                } else {
                    token
                }
            })
            .collect()
    }

    fn fix_spelling(&self, tokens: Vec<String>, edits: &mut Vec<CorrectionEdit>) -> Vec<String> {
        tokens
            .into_iter()
            .map(|token| {
                let key = token.to_lowercase();
                if let Some(canonical) = self.spelling.get(&key) {
                    edits.push(CorrectionEdit {
                        kind: EditKind::SpellingFix,
                        original: token.clone(),
                        replacement: canonical.clone(),
                    });
                    canonical.clone()
                } else {
                    token
                }
            })
            .collect()
    }

    fn fuzzy_correct(
        &self,
        tokens: Vec<String>,
        edits: &mut Vec<CorrectionEdit>,
        low_confidence_count: &mut usize,
    ) -> Vec<String> {
        tokens
            .into_iter()
            .map(|token| {
                if token.chars().count() < MIN_FUZZY_TOKEN_LEN
                    || BUILDING_NUMBER_RE.is_match(&token)
                    || DIGIT_ONLY_RE.is_match(&token)
                {
                    return token;
                }
                match self.idx.fuzzy_match_any_admin(&token) {
                    Some((matched, score)) if matched != token.to_lowercase() => {
                        if score < 0.85 {
                            *low_confidence_count += 1;
                        }
                        let replacement = self.idx.display(&matched).map(String::from).unwrap_or(matched);
                        edits.push(CorrectionEdit {
                            kind: EditKind::FuzzyAdminFix,
                            original: token.clone(),
                            replacement: replacement.clone(),
                        });
                        replacement
                    }
                    _ => token,
                }
            })
            .collect()
    }

    fn fix_characters(&self, tokens: Vec<String>) -> Vec<String> {
        tokens
            .into_iter()
            .map(|t| COMBINING_ARTIFACT_RE.replace_all(&t, "").to_string())
            .collect()
    }

    fn title_case(&self, tokens: Vec<String>) -> Vec<String> {
        tokens
            .into_iter()
            .map(|token| {
                if DIGIT_ONLY_RE.is_match(&token) {
                    token
                } else if BUILDING_NUMBER_RE.is_match(&token) {
                    token.to_uppercase()
                } else {
                    token.split(' ').map(title_word).collect::<Vec<_>>().join(" ")
                }
            })
            .collect()
    }

    /// `min(1.0, 0.7 + 0.05*numEdits)`, reduced `0.1` per low-confidence fuzzy edit (§4.3).
    fn confidence(&self, num_edits: usize, low_confidence_fuzzy_edits: usize) -> f64 {
        let base = (0.7 + 0.05 * num_edits as f64).min(1.0);
        (base - 0.1 * low_confidence_fuzzy_edits as f64).max(0.0)
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
    fn expands_known_abbreviations() {
        let idx = sample_index();
        let corrector = Corrector::new(&idx);
        let (corrected, edits, _) = corrector.correct("moda mah");
        assert!(corrected.to_lowercase().contains("mahallesi"));
        assert!(edits.iter().any(|e| e.kind == EditKind::AbbreviationExpansion));
    }

    #[test]
    fn preserves_building_number_tokens() {
        let idx = sample_index();
        let corrector = Corrector::new(&idx);
        let (corrected, _, _) = corrector.correct("moda mah 10/a");
        assert!(corrected.contains("10/A"));
    }

    #[test]
    fn fuzzy_corrects_misspelled_neighborhood() {
        let idx = sample_index();
        let corrector = Corrector::new(&idx);
        let (corrected, edits, _) = corrector.correct("istanbul kadikoy modaa");
        assert!(edits.iter().any(|e| e.kind == EditKind::FuzzyAdminFix));
        assert!(corrected.to_lowercase().contains("moda"));
    }

    #[test]
    fn splits_colon_glued_building_and_apartment_tokens() {
        let idx = sample_index();
        let corrector = Corrector::new(&idx);
        let (corrected, _, _) = corrector.correct("moda mah No:25/A Daire:3");
        assert!(corrected.contains("25/A"), "got {corrected:?}");
        assert!(!corrected.contains("25/a"), "trailing letter must not be lowercased: {corrected:?}");
        assert!(corrected.contains("Daire"));
        assert!(corrected.contains('3'));
    }

    #[test]
    fn empty_input_yields_zero_confidence() {
        let idx = sample_index();
        let corrector = Corrector::new(&idx);
        let (corrected, edits, confidence) = corrector.correct("   ");
        assert!(edits.is_empty());
        assert_eq!(confidence, 0.0);
        assert_eq!(corrected, "   ");
    }
}
