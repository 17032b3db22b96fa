//! Fuzzy textual similarity between two response bodies.
//!
//! The measure is the Sørensen–Dice coefficient over character bigram
//! multisets, computed after stripping all whitespace so that re-indented
//! markup does not count as a difference.

use std::collections::HashMap;
use std::fmt;

/// Normalized closeness of two bodies, in `[0, 1]` where `1` means identical.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct SimilarityScore(f64);

impl SimilarityScore {
    /// Score of two identical bodies.
    pub const IDENTICAL: Self = Self(1.0);

    /// Score of two bodies sharing no bigram.
    pub const DISJOINT: Self = Self(0.0);

    /// Returns the raw value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for SimilarityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Computes the similarity of two bodies.
///
/// Symmetric, deterministic, `1.0` for bodies equal up to whitespace, and
/// `0.0` when either side has fewer than two non-whitespace characters and
/// they differ.
#[must_use]
pub fn similarity(a: &str, b: &str) -> SimilarityScore {
    let a: Vec<char> = a.chars().filter(|c| !c.is_whitespace()).collect();
    let b: Vec<char> = b.chars().filter(|c| !c.is_whitespace()).collect();

    if a == b {
        return SimilarityScore::IDENTICAL;
    }
    if a.len() < 2 || b.len() < 2 {
        return SimilarityScore::DISJOINT;
    }

    let mut remaining: HashMap<(char, char), usize> = HashMap::with_capacity(a.len());
    for pair in a.windows(2) {
        *remaining.entry((pair[0], pair[1])).or_default() += 1;
    }

    let mut shared = 0usize;
    for pair in b.windows(2) {
        if let Some(count) = remaining.get_mut(&(pair[0], pair[1]))
            && *count > 0
        {
            *count -= 1;
            shared += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let score = (2 * shared) as f64 / (a.len() + b.len() - 2) as f64;
    SimilarityScore(score)
}
