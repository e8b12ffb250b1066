//! Weighted fuzzy string matching shared by the corrector, parser, and
//! reference DB: a composite of edit distance (Turkish-confusable-aware),
//! ASCII-folded phonetic distance, and substring containment.

use crate::turkish_text::ascii_fold;

/// Default acceptance threshold for fuzzy administrative-name matching (§4.2).
pub const FUZZY_THRESHOLD: f64 = 0.80;

const CONFUSABLE_GROUPS: &[&[char]] = &[
    &['c', 'ç'],
    &['s', 'ş'],
    &['i', 'ı'],
    &['o', 'ö'],
    &['u', 'ü'],
    &['g', 'ğ'],
];

fn confusable_group_of(c: char) -> Option<usize> {
    CONFUSABLE_GROUPS.iter().position(|group| group.contains(&c))
}

/// Substitution cost between two characters: 0 for an exact match, 0.1 for a
/// Turkish-confusable pair (`c↔ç, s↔ş, i↔ı, o↔ö, u↔ü, g↔ğ`), 1.0 otherwise.
fn substitution_cost(a: char, b: char) -> f64 {
    if a == b {
        return 0.0;
    }
    match (confusable_group_of(a), confusable_group_of(b)) {
        (Some(ga), Some(gb)) if ga == gb => 0.1,
        _ => 1.0,
    }
}

/// Weighted Levenshtein distance: insertion/deletion cost 1.0, substitution
/// cost per [`substitution_cost`].
fn weighted_edit_distance(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());

    if n == 0 {
        return m as f64;
    }
    if m == 0 {
        return n as f64;
    }

    let mut prev: Vec<f64> = (0..=m).map(|j| j as f64).collect();
    let mut curr: Vec<f64> = vec![0.0; m + 1];

    for i in 1..=n {
        curr[0] = i as f64;
        for j in 1..=m {
            let sub_cost = substitution_cost(a[i - 1], b[j - 1]);
            let deletion = prev[j] + 1.0;
            let insertion = curr[j - 1] + 1.0;
            let substitution = prev[j - 1] + sub_cost;
            curr[j] = deletion.min(insertion).min(substitution);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[m]
}

/// `1 - dist/max(len(a), len(b))`, clamped to `[0, 1]`.
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count()).max(1);
    let dist = weighted_edit_distance(a, b);
    (1.0 - dist / max_len as f64).clamp(0.0, 1.0)
}

/// 1.0 if either string contains the other, else 0.0.
pub fn substring_score(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a.contains(b) || b.contains(a) {
        1.0
    } else {
        0.0
    }
}

/// `0.6*levenshtein + 0.3*phonetic(ascii-folded) + 0.1*substring` (§4.2).
/// Both inputs are expected to already be in `normalize_for_compare` form.
pub fn composite_similarity(query_norm: &str, candidate_norm: &str) -> f64 {
    let lev = levenshtein_similarity(query_norm, candidate_norm);
    let phonetic = levenshtein_similarity(&ascii_fold(query_norm), &ascii_fold(candidate_norm));
    let sub = substring_score(query_norm, candidate_norm);
    0.6 * lev + 0.3 * phonetic + 0.1 * sub
}

/// Length prefilter from §5: a candidate whose length differs from the query
/// by more than `ceil((1-threshold)*max(len))` cannot reach `threshold`
/// similarity, so it can be skipped before computing the full composite score.
pub fn length_prefilter_ok(query_len: usize, candidate_len: usize, threshold: f64) -> bool {
    let max_len = query_len.max(candidate_len) as f64;
    let allowed = ((1.0 - threshold) * max_len).ceil() as usize;
    query_len.abs_diff(candidate_len) <= allowed
}

/// The best candidate (by composite similarity) from `candidates` whose score
/// is at least `threshold`, or `None` if no candidate qualifies. `candidates`
/// must already be in `normalize_for_compare` form.
pub fn best_match<'a, I>(query_norm: &str, candidates: I, threshold: f64) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let query_len = query_norm.chars().count();
    let mut best: Option<(&str, f64)> = None;

    for candidate in candidates {
        if !length_prefilter_ok(query_len, candidate.chars().count(), threshold) {
            continue;
        }
        let score = composite_similarity(query_norm, candidate);
        if score >= threshold {
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((candidate, score)),
            }
        }
    }

    best
}

/// Shortest administrative abbreviation a query can sensibly stand for, e.g.
/// `"ank"` (from `"Ank."`) against `"ankara"`, or `"çank"` against
/// `"çankaya"`. `composite_similarity` underscores these: the edit distance
/// from a 3-4 character abbreviation to its full form is large relative to
/// the abbreviation's own length, so the weighted score never clears
/// [`FUZZY_THRESHOLD`]. A strict prefix match of at least 3 characters is
/// treated as a full match instead. `candidates` must already be in
/// `normalize_for_compare` form.
pub fn abbreviation_prefix_match<'a, I>(query_norm: &str, candidates: I) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    if query_norm.chars().count() < 3 {
        return None;
    }
    candidates
        .into_iter()
        .filter(|candidate| candidate.starts_with(query_norm) && *candidate != query_norm)
        .min_by_key(|candidate| candidate.len())
        .map(|candidate| (candidate, 1.0))
}
