//! Turkish-aware case correction, normalization, and tokenization.
//!
//! Turkish casing is not Unicode-default: `İ`/`i` and `I`/`ı` are distinct pairs,
//! and the generic Unicode case tables get this wrong for administrative text
//! (`ISTANBUL`.to_lowercase() != "istanbul" under the Turkish alphabet). Every
//! operation here applies the Turkish-specific mapping first, then falls back
//! to the generic Unicode rule for everything else.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

/// Administrative names that must never be re-cased by [`title_word`].
pub const PROTECTED_LITERALS: &[&str] = &["İstanbul", "İzmir", "İzmit", "İçel", "İnönü"];

lazy_static! {
    static ref PROTECTED_SET: HashSet<&'static str> = PROTECTED_LITERALS.iter().copied().collect();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
    static ref COMBINING_DOT_ABOVE: Regex = RegexBuilder::new(r"\u{0307}").build().unwrap();
    static ref SURROUNDING_PUNCT_RE: Regex =
        Regex::new(r"^[^\p{L}\p{N}/\-]+|[^\p{L}\p{N}/\-]+$").unwrap();
    static ref TOKEN_RE: Regex = RegexBuilder::new(r"[\p{L}]+(?:[./][\p{L}]+)*|\d+[/\-]?[\p{L}]?|\S+")
        .case_insensitive(false)
        .build()
        .unwrap();
}

/// Lowercases `s` using the Turkish dotted/dotless-I mapping, then the generic
/// Unicode rule for everything else.
pub fn lower(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'İ' => out.push('i'),
            'I' => out.push('ı'),
            'Ç' => out.push('ç'),
            'Ğ' => out.push('ğ'),
            'Ö' => out.push('ö'),
            'Ş' => out.push('ş'),
            'Ü' => out.push('ü'),
            _ => out.extend(c.to_lowercase()),
        }
    }
    out
}

/// Upper-cases `s` using the Turkish dotted/dotless-I mapping.
pub fn upper(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'i' => out.push('İ'),
            'ı' => out.push('I'),
            'ç' => out.push('Ç'),
            'ğ' => out.push('Ğ'),
            'ö' => out.push('Ö'),
            'ş' => out.push('Ş'),
            'ü' => out.push('Ü'),
            _ => out.extend(c.to_uppercase()),
        }
    }
    out
}

/// Title-cases a single word: first character upper-cased per the Turkish rule,
/// the rest lower-cased. Words in [`PROTECTED_LITERALS`] round-trip unchanged.
pub fn title_word(s: &str) -> String {
    if PROTECTED_SET.contains(s) {
        return s.to_string();
    }

    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => {
            let rest: String = chars.as_str().to_string();
            let upper_first = match first {
                'i' => "İ".to_string(),
                'ı' => "I".to_string(),
                'ç' => "Ç".to_string(),
                'ğ' => "Ğ".to_string(),
                'ö' => "Ö".to_string(),
                'ş' => "Ş".to_string(),
                'ü' => "Ü".to_string(),
                other => other.to_uppercase().collect(),
            };
            format!("{upper_first}{}", lower(&rest))
        }
    }
}

/// Normalizes text into the canonical comparison form used by every hash-indexed
/// lookup in [`crate::reference_db`]: NFC, Turkish lowercase, collapsed internal
/// whitespace, trimmed, with surrounding punctuation stripped (except `/`, `-`,
/// and digits, which are left in place since they can be load-bearing for
/// building numbers).
pub fn normalize_for_compare(s: &str) -> String {
    let nfc: String = s.nfc().collect();
    let lowered = lower(&nfc);
    let collapsed = WHITESPACE_RE.replace_all(lowered.trim(), " ").to_string();
    SURROUNDING_PUNCT_RE.replace_all(&collapsed, "").to_string()
}

/// Folds Turkish letters down to their closest ASCII form. Used only to build
/// fuzzy/phonetic indexes; never for user-visible output.
pub fn ascii_fold(s: &str) -> String {
    let lowered = lower(s);
    let mut out = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        match c {
            'ç' => out.push('c'),
            'ğ' => out.push('g'),
            'ı' => out.push('i'),
            'ö' => out.push('o'),
            'ş' => out.push('s'),
            'ü' => out.push('u'),
            other => out.push(other),
        }
    }
    out
}

/// Strips control codepoints and known combining-mark artifacts (a stray
/// `U+0307` COMBINING DOT ABOVE is the most common OCR/encoding defect seen on
/// dotless-ı text) while leaving legitimate Turkish letters untouched. This is
/// the pre-step run before any correction logic.
pub fn preserve_turkish(s: &str) -> String {
    let without_controls: String = s
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    let without_combining = COMBINING_DOT_ABOVE.replace_all(&without_controls, "");
    WHITESPACE_RE
        .replace_all(without_combining.trim(), " ")
        .to_string()
}

/// Splits text into whitespace/punctuation-delimited tokens, Turkish-aware:
/// letter runs (including an internal `.`/`/` as in "mah." or abbreviations),
/// digit runs with an optional compound suffix letter (`10/A`, `12-b`), and a
/// catch-all for anything else (keeps CEP-like and punctuation-heavy tokens
/// intact instead of fragmenting them).
pub fn tokenize(s: &str) -> Vec<String> {
    TOKEN_RE.find_iter(s).map(|m| m.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_handles_dotted_and_dotless_i() {
        assert_eq!(lower("İSTANBUL"), "istanbul");
        assert_eq!(lower("IĞDIR"), "ığdır");
    }

    #[test]
    fn title_word_round_trips_protected_literals() {
        assert_eq!(title_word("İstanbul"), "İstanbul");
        assert_eq!(title_word("İzmit"), "İzmit");
    }

    #[test]
    fn title_word_handles_turkish_first_letters() {
        assert_eq!(title_word("istanbul"), "İstanbul");
        assert_eq!(title_word("ığdır"), "Iğdır");
        assert_eq!(title_word("çankaya"), "Çankaya");
        assert_eq!(title_word("şişli"), "Şişli");
        assert_eq!(title_word("üsküdar"), "Üsküdar");
    }

    #[test]
    fn lower_of_title_word_is_idempotent_under_lower() {
        for s in ["istanbul", "çankaya", "ığdır", "şişli", "üsküdar", "ankara"] {
            assert_eq!(lower(&title_word(s)), lower(s));
        }
    }

    #[test]
    fn normalize_for_compare_collapses_whitespace_and_case() {
        assert_eq!(
            normalize_for_compare("  Kadıköy   Moda  Mahallesi "),
            "kadıköy moda mahallesi"
        );
    }

    #[test]
    fn normalize_for_compare_keeps_building_number_punctuation() {
        assert_eq!(normalize_for_compare("10/A"), "10/a");
        assert_eq!(normalize_for_compare("12-B."), "12-b");
    }

    #[test]
    fn ascii_fold_strips_turkish_diacritics() {
        assert_eq!(ascii_fold("Çağlayan Şişli Üsküdar Iğdır"), "caglayan sisli uskudar igdir");
    }

    #[test]
    fn preserve_turkish_removes_combining_dot_above() {
        let with_artifact = "i\u{0307}stanbul";
        assert_eq!(preserve_turkish(with_artifact), "istanbul");
    }

    #[test]
    fn tokenize_keeps_compound_building_numbers_as_single_tokens() {
        let tokens = tokenize("Caferağa Sokak 10/A Daire:3");
        assert!(tokens.iter().any(|t| t == "10/A"));
    }
}
