//! Fuzzy product-name matching.
//!
//! Scores a query against a name with a best-alignment edit distance: the
//! query may match anywhere inside the name at no cost for the skipped
//! prefix and suffix, and adjacent transpositions count as one edit. The
//! distance is normalized by the query length, so 0.0 is an exact
//! (substring) match and 1.0 shares nothing.

use fieldvoice_core::chemical::ChemicalMatch;

pub struct FuzzyMatcher {
    threshold: f64,
}

impl FuzzyMatcher {
    /// `threshold` is the largest admitted score (0.0 = exact only, 1.0 = anything).
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Score `pattern` against `text`; `None` when either is blank.
    pub fn score(pattern: &str, text: &str) -> Option<f64> {
        let pattern: Vec<char> = pattern.trim().to_lowercase().chars().collect();
        let text: Vec<char> = text.trim().to_lowercase().chars().collect();
        if pattern.is_empty() || text.is_empty() {
            return None;
        }
        let distance = best_alignment_distance(&pattern, &text);
        Some((distance as f64 / pattern.len() as f64).min(1.0))
    }

    /// Indices of admitted candidates with their scores, best first.
    /// Ties keep candidate order.
    pub fn rank(&self, pattern: &str, candidates: &[ChemicalMatch]) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> = candidates
            .iter()
            .enumerate()
            .filter_map(|(i, c)| Self::score(pattern, &c.name).map(|s| (i, s)))
            .filter(|(_, s)| *s <= self.threshold)
            .collect();

        ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}

/// Minimum edits to turn `pattern` into some substring of `text`.
fn best_alignment_distance(pattern: &[char], text: &[char]) -> usize {
    let m = pattern.len();
    let n = text.len();

    // Row 0 is all zeros: the match may start anywhere in `text`.
    let mut matrix: Vec<Vec<usize>> = vec![vec![0; n + 1]; m + 1];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }

    for i in 1..=m {
        for j in 1..=n {
            let cost = usize::from(pattern[i - 1] != text[j - 1]);

            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);

            if i > 1 && j > 1 && pattern[i - 1] == text[j - 2] && pattern[i - 2] == text[j - 1] {
                matrix[i][j] = matrix[i][j].min(matrix[i - 2][j - 2] + 1);
            }
        }
    }

    // ...and end anywhere.
    matrix[m].iter().copied().min().unwrap_or(m)
}
