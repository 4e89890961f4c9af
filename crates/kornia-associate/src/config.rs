use serde::{Deserialize, Serialize};

use crate::error::AssociateError;
use crate::parallel::ExecutionStrategy;
use crate::types::MatchScoreType;

/// Maximum allowed distance between the locations of two associated features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxDistance {
    /// Distance in pixels.
    Absolute(f64),
    /// Fraction of the largest image side.
    Relative(f64),
}

impl MaxDistance {
    /// Resolve the distance in pixels for an image of the given size.
    pub fn compute(&self, width: usize, height: usize) -> f64 {
        match *self {
            MaxDistance::Absolute(pixels) => pixels,
            MaxDistance::Relative(fraction) => fraction * width.max(height) as f64,
        }
    }

    fn validate(&self) -> Result<(), AssociateError> {
        let (name, value) = match *self {
            MaxDistance::Absolute(v) => ("max_distance", v),
            MaxDistance::Relative(v) => ("max_distance_fraction", v),
        };
        if value.is_nan() || value < 0.0 {
            return Err(AssociateError::InvalidParameter { name, value });
        }
        Ok(())
    }
}

impl Default for MaxDistance {
    fn default() -> Self {
        MaxDistance::Absolute(f64::INFINITY)
    }
}

/// Configuration for the greedy associators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigAssociateGreedy {
    /// Only keep matches which are the best in both directions.
    pub backwards_validation: bool,
    /// Reject a match if `best > ratio * second_best`. Values `>= 1` disable the test.
    pub score_ratio_threshold: f64,
    /// Apply the ratio test on the square root of the scores.
    pub ratio_uses_sqrt: bool,
    /// Matches with a score above this value are rejected. `None` means unbounded.
    pub max_error_threshold: Option<f64>,
    /// Maximum distance between feature locations, only used by 2D associators.
    pub max_distance: MaxDistance,
    /// How the loop over source features is executed.
    pub strategy: ExecutionStrategy,
}

impl Default for ConfigAssociateGreedy {
    fn default() -> Self {
        Self {
            backwards_validation: true,
            score_ratio_threshold: 1.0,
            ratio_uses_sqrt: false,
            max_error_threshold: None,
            max_distance: MaxDistance::default(),
            strategy: ExecutionStrategy::default(),
        }
    }
}

impl ConfigAssociateGreedy {
    /// Check that every threshold is within its valid range.
    pub fn validate(&self) -> Result<(), AssociateError> {
        validate_ratio(self.score_ratio_threshold)?;
        validate_max_error(self.max_error_threshold)?;
        self.max_distance.validate()
    }

    /// The maximum fit error with `None` resolved to [`f64::MAX`].
    pub fn max_fit_error(&self) -> f64 {
        self.max_error_threshold.unwrap_or(f64::MAX)
    }
}

/// Configuration for the nearest neighbor associator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigAssociateNearestNeighbor {
    /// Reject a match if `best > ratio * second_best`. Values `>= 1` disable the test.
    pub score_ratio_threshold: f64,
    /// The search returns squared distances, apply the ratio test on their square root.
    pub ratio_uses_sqrt: bool,
    /// Neighbors farther than this are ignored, in the units of the search. `None` means unbounded.
    pub max_error_threshold: Option<f64>,
    /// How the loop over source features is executed.
    pub strategy: ExecutionStrategy,
}

impl Default for ConfigAssociateNearestNeighbor {
    fn default() -> Self {
        Self {
            score_ratio_threshold: 0.8,
            ratio_uses_sqrt: true,
            max_error_threshold: None,
            strategy: ExecutionStrategy::default(),
        }
    }
}

impl ConfigAssociateNearestNeighbor {
    /// Check that every threshold is within its valid range.
    pub fn validate(&self) -> Result<(), AssociateError> {
        validate_ratio(self.score_ratio_threshold)?;
        validate_max_error(self.max_error_threshold)
    }
}

fn validate_ratio(ratio: f64) -> Result<(), AssociateError> {
    if ratio.is_nan() || ratio <= 0.0 {
        return Err(AssociateError::InvalidParameter {
            name: "score_ratio_threshold",
            value: ratio,
        });
    }
    Ok(())
}

fn validate_max_error(max_error: Option<f64>) -> Result<(), AssociateError> {
    match max_error {
        Some(value) if value.is_nan() => Err(AssociateError::InvalidParameter {
            name: "max_error_threshold",
            value,
        }),
        _ => Ok(()),
    }
}

/// Ratio test threshold applied directly on the scores.
///
/// `sqrt(b1 / b2) <= r` is equivalent to `b1 <= r^2 * b2` for non-negative scores.
pub(crate) fn effective_ratio(ratio: f64, uses_sqrt: bool) -> f64 {
    if uses_sqrt {
        ratio * ratio
    } else {
        ratio
    }
}

/// Fails if the ratio test is enabled for scores without a zero minimum.
///
/// `best <= ratio * second_best` only ranks ambiguity for non-negative scores.
pub(crate) fn check_ratio_score_type(
    ratio: f64,
    score_type: MatchScoreType,
) -> Result<(), AssociateError> {
    if ratio < 1.0 && !score_type.is_zero_minimum() {
        return Err(AssociateError::InvalidParameter {
            name: "score_ratio_threshold",
            value: ratio,
        });
    }
    Ok(())
}
