use serde::{Deserialize, Serialize};

/// A 2D pixel location attached to a feature.
pub type Location = [f64; 2];

/// Describes what the value returned by a score function means.
///
/// All scores are ordered so that lower is better, the type only tells whether
/// zero is the best possible value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchScoreType {
    /// An error norm, zero is a perfect match.
    NormError,
    /// A negated correlation, can be negative and has no fixed minimum.
    Correlation,
}

impl MatchScoreType {
    /// Returns true if a score of zero is the best possible score.
    pub fn is_zero_minimum(&self) -> bool {
        matches!(self, MatchScoreType::NormError)
    }
}

/// A claimed correspondence between a source and a destination feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssociatedIndex {
    /// Index of the feature in the source list.
    pub src: usize,
    /// Index of the feature in the destination list.
    pub dst: usize,
    /// Score of the match, lower is better.
    pub fit_score: f64,
}

impl AssociatedIndex {
    /// Create a new association.
    pub fn new(src: usize, dst: usize, fit_score: f64) -> Self {
        Self {
            src,
            dst,
            fit_score,
        }
    }
}

/// Per-source output of the greedy matcher.
///
/// Both vectors are indexed by the source feature. `pairs[i]` is the matched
/// destination and `fit_quality[i]` its score. Unmatched sources hold `None`
/// and the maximum fit error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GreedyMatches {
    /// Matched destination index for each source.
    pub pairs: Vec<Option<usize>>,
    /// Score of the match for each source.
    pub fit_quality: Vec<f64>,
}

impl GreedyMatches {
    /// Number of source features.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if there were no source features.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of matched source features.
    pub fn num_matched(&self) -> usize {
        self.pairs.iter().filter(|p| p.is_some()).count()
    }

    /// Convert the pairs into a list of associations ordered by source index.
    pub fn to_associations(&self) -> Vec<AssociatedIndex> {
        self.pairs
            .iter()
            .zip(self.fit_quality.iter())
            .enumerate()
            .filter_map(|(src, (dst, &fit))| dst.map(|dst| AssociatedIndex::new(src, dst, fit)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_type_zero_minimum() {
        assert!(MatchScoreType::NormError.is_zero_minimum());
        assert!(!MatchScoreType::Correlation.is_zero_minimum());
    }

    #[test]
    fn test_greedy_matches_to_associations() {
        let matches = GreedyMatches {
            pairs: vec![Some(2), None, Some(0)],
            fit_quality: vec![0.5, f64::MAX, 1.5],
        };
        assert_eq!(matches.len(), 3);
        assert_eq!(matches.num_matched(), 2);
        assert_eq!(
            matches.to_associations(),
            vec![AssociatedIndex::new(0, 2, 0.5), AssociatedIndex::new(2, 0, 1.5)]
        );
    }
}
