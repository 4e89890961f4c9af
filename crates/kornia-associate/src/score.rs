use std::sync::Arc;

use num_traits::AsPrimitive;

use crate::descriptor::Descriptor;
use crate::hamming::HammingTable8;
use crate::types::MatchScoreType;

/// Scores how well two descriptors match, lower is better.
///
/// Implementations must be pure: the score depends only on the two arguments.
pub trait ScoreAssociation<D>: Send + Sync {
    /// Compute the fit score between two descriptors.
    fn score(&self, a: &D, b: &D) -> f64;

    /// The meaning of the returned score.
    fn score_type(&self) -> MatchScoreType;
}

impl<D, S: ScoreAssociation<D> + ?Sized> ScoreAssociation<D> for Arc<S> {
    fn score(&self, a: &D, b: &D) -> f64 {
        (**self).score(a, b)
    }

    fn score_type(&self) -> MatchScoreType {
        (**self).score_type()
    }
}

/// Euclidean (L2) distance between two descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreEuclidean;

/// Squared Euclidean distance between two descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreEuclideanSq;

/// Sum of absolute differences between two descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreSad;

#[inline]
fn squared_distance<T: AsPrimitive<f64>>(a: &[T], b: &[T]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x.as_() - y.as_();
            d * d
        })
        .sum()
}

impl<D: Descriptor> ScoreAssociation<D> for ScoreEuclidean {
    fn score(&self, a: &D, b: &D) -> f64 {
        squared_distance(a.values(), b.values()).sqrt()
    }

    fn score_type(&self) -> MatchScoreType {
        MatchScoreType::NormError
    }
}

impl<D: Descriptor> ScoreAssociation<D> for ScoreEuclideanSq {
    fn score(&self, a: &D, b: &D) -> f64 {
        squared_distance(a.values(), b.values())
    }

    fn score_type(&self) -> MatchScoreType {
        MatchScoreType::NormError
    }
}

impl<D: Descriptor> ScoreAssociation<D> for ScoreSad {
    fn score(&self, a: &D, b: &D) -> f64 {
        a.values()
            .iter()
            .zip(b.values().iter())
            .map(|(&x, &y)| (x.as_() - y.as_()).abs())
            .sum()
    }

    fn score_type(&self) -> MatchScoreType {
        MatchScoreType::NormError
    }
}

/// Normalized cross correlation between two descriptors.
///
/// The correlation is in `[-1, 1]` with 1 being a perfect match, so the
/// negated value is returned to keep lower scores better. Descriptors with
/// zero variance correlate to zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreNcc;

impl<D: Descriptor> ScoreAssociation<D> for ScoreNcc {
    fn score(&self, a: &D, b: &D) -> f64 {
        let (a, b) = (a.values(), b.values());
        let n = a.len().min(b.len());
        if n == 0 {
            return 0.0;
        }

        let mean_a = a[..n].iter().map(|x| x.as_()).sum::<f64>() / n as f64;
        let mean_b = b[..n].iter().map(|x| x.as_()).sum::<f64>() / n as f64;

        let (mut cross, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
        for (&x, &y) in a.iter().zip(b.iter()) {
            let dx = x.as_() - mean_a;
            let dy = y.as_() - mean_b;
            cross += dx * dy;
            var_a += dx * dx;
            var_b += dy * dy;
        }

        let denom = (var_a * var_b).sqrt();
        if denom == 0.0 {
            return 0.0;
        }
        -cross / denom
    }

    fn score_type(&self) -> MatchScoreType {
        MatchScoreType::Correlation
    }
}

/// Hamming distance between binary descriptors packed into bytes.
#[derive(Debug, Clone)]
pub struct ScoreHamming {
    table: Arc<HammingTable8>,
}

impl ScoreHamming {
    /// Create a score function sharing an existing lookup table.
    pub fn new(table: Arc<HammingTable8>) -> Self {
        Self { table }
    }
}

impl Default for ScoreHamming {
    fn default() -> Self {
        Self::new(Arc::new(HammingTable8::new()))
    }
}

impl<D: AsRef<[u8]>> ScoreAssociation<D> for ScoreHamming {
    fn score(&self, a: &D, b: &D) -> f64 {
        self.table.distance(a.as_ref(), b.as_ref()) as f64
    }

    fn score_type(&self) -> MatchScoreType {
        MatchScoreType::NormError
    }
}
