//! Similarity primitives on a shared 0-100 scale.
//!
//! Every metric returns 100 for identical inputs, so weighted sums of
//! different metrics stay comparable. Min-max normalization is the only
//! function here that is not a similarity; it feeds [`euclidean`].

use std::collections::HashSet;

/// Top of the shared similarity scale.
pub const MAX_SIMILARITY: f64 = 100.0;

/// Position-wise string similarity.
///
/// Compares characters at equal positions. When lengths differ the
/// trailing positions of the longer string count as mismatches.
/// Two empty strings are identical.
pub fn hamming(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let len = a.len().max(b.len());
    if len == 0 {
        return MAX_SIMILARITY;
    }

    let matches = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    let mismatches = len - matches;

    MAX_SIMILARITY * (1.0 - mismatches as f64 / len as f64)
}

/// Map each value linearly onto [0, 1] for the range `[min, max]`.
///
/// Values outside the range are not clamped and land outside [0, 1].
/// A degenerate range maps everything to 0.
pub fn min_max_norm(values: &[f64], min: f64, max: f64) -> Vec<f64> {
    let span = max - min;
    if span == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - min) / span).collect()
}

/// Euclidean distance turned into a similarity: `100 / (1 + d)`.
///
/// Missing trailing components of the shorter vector read as 0.
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    let len = a.len().max(b.len());
    let sum: f64 = (0..len)
        .map(|i| {
            let diff = a.get(i).copied().unwrap_or(0.0) - b.get(i).copied().unwrap_or(0.0);
            diff * diff
        })
        .sum();

    MAX_SIMILARITY / (1.0 + sum.sqrt())
}

/// Token-set overlap: `100 * |A ∩ B| / |A ∪ B|`.
///
/// Both strings are split on `delimiter`; empty tokens are dropped.
/// Two empty sets are identical.
pub fn jaccard(a: &str, b: &str, delimiter: &str) -> f64 {
    let a = tokens(a, delimiter);
    let b = tokens(b, delimiter);

    let union = a.union(&b).count();
    if union == 0 {
        return MAX_SIMILARITY;
    }
    let intersection = a.intersection(&b).count();

    MAX_SIMILARITY * intersection as f64 / union as f64
}

fn tokens<'a>(s: &'a str, delimiter: &str) -> HashSet<&'a str> {
    s.split(delimiter).filter(|t| !t.is_empty()).collect()
}

/// Weighted mean of `(score, weight)` terms. Zero total weight gives 0.
pub fn weighted_mean(terms: &[(f64, f64)]) -> f64 {
    let total_weight: f64 = terms.iter().map(|(_, w)| w).sum();
    if total_weight == 0.0 {
        return 0.0;
    }
    terms.iter().map(|(score, w)| score * w).sum::<f64>() / total_weight
}
