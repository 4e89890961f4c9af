use std::marker::PhantomData;

use crate::config::{check_ratio_score_type, effective_ratio, ConfigAssociateGreedy, MaxDistance};
use crate::distance::{EuclideanSqDistance, ImageDistance};
use crate::error::AssociateError;
use crate::parallel::{map_indices, map_rows, ExecutionStrategy};
use crate::score::ScoreAssociation;
use crate::types::{GreedyMatches, Location};

/// Greedy association of descriptors.
///
/// Every source descriptor is compared against every destination descriptor and
/// the best scoring destination is selected independently for each source. The
/// search has an `O(N*M)` cost in time and memory, the full score matrix is kept
/// for the ratio test and the backwards validation. Large inputs should use a
/// nearest neighbor search instead.
///
/// When two destinations have the same score the one examined last wins.
pub struct AssociateGreedy<D, S> {
    score: S,
    max_fit_error: f64,
    ratio_test: f64,
    ratio_uses_sqrt: bool,
    backwards_validation: bool,
    strategy: ExecutionStrategy,
    _descriptor: PhantomData<fn(&D)>,
}

impl<D: Sync, S: ScoreAssociation<D>> AssociateGreedy<D, S> {
    /// Create a greedy associator from its configuration.
    ///
    /// The `max_distance` of the configuration is ignored, see [`AssociateGreedy2D`].
    ///
    /// # Errors
    ///
    /// Fails if a threshold is out of range, or if the ratio test is enabled
    /// with a score whose minimum is not zero.
    pub fn new(score: S, config: &ConfigAssociateGreedy) -> Result<Self, AssociateError> {
        config.validate()?;
        check_ratio_score_type(config.score_ratio_threshold, score.score_type())?;
        if config.ratio_uses_sqrt && config.score_ratio_threshold >= 1.0 {
            log::warn!("ratio_uses_sqrt has no effect while the ratio test is disabled");
        }
        Ok(Self {
            score,
            max_fit_error: config.max_fit_error(),
            ratio_test: config.score_ratio_threshold,
            ratio_uses_sqrt: config.ratio_uses_sqrt,
            backwards_validation: config.backwards_validation,
            strategy: config.strategy,
            _descriptor: PhantomData,
        })
    }

    /// The score function.
    pub fn score(&self) -> &S {
        &self.score
    }

    /// Maximum allowed fit score, also reported as the fit quality of unmatched sources.
    pub fn max_fit_error(&self) -> f64 {
        self.max_fit_error
    }

    /// Set the maximum fit score. `None` removes the bound.
    pub fn set_max_fit_error(&mut self, max_fit_error: Option<f64>) {
        self.max_fit_error = max_fit_error.unwrap_or(f64::MAX);
    }

    /// Set the ratio test threshold. Values `>= 1` disable the test.
    pub fn set_ratio_test(&mut self, ratio: f64) -> Result<(), AssociateError> {
        if ratio.is_nan() || ratio <= 0.0 {
            return Err(AssociateError::InvalidParameter {
                name: "score_ratio_threshold",
                value: ratio,
            });
        }
        check_ratio_score_type(ratio, self.score.score_type())?;
        self.ratio_test = ratio;
        Ok(())
    }

    /// Returns true if matches must be the best in both directions.
    pub fn backwards_validation(&self) -> bool {
        self.backwards_validation
    }

    /// Enable or disable the backwards validation.
    pub fn set_backwards_validation(&mut self, enabled: bool) {
        self.backwards_validation = enabled;
    }

    /// Set how the loop over source features is executed.
    pub fn set_strategy(&mut self, strategy: ExecutionStrategy) {
        self.strategy = strategy;
    }

    /// Associate every source descriptor with its best destination.
    ///
    /// # Arguments
    ///
    /// * `src` - The source descriptors.
    /// * `dst` - The destination descriptors.
    ///
    /// # Returns
    ///
    /// The matched destination and fit score for every source.
    pub fn associate(&self, src: &[D], dst: &[D]) -> Result<GreedyMatches, AssociateError> {
        self.associate_gated(src, dst, |_, _| true)
    }

    /// Associate descriptors, only scoring the pairs accepted by `gate`.
    pub(crate) fn associate_gated<G>(
        &self,
        src: &[D],
        dst: &[D],
        gate: G,
    ) -> Result<GreedyMatches, AssociateError>
    where
        G: Fn(usize, usize) -> bool + Sync,
    {
        let (n, m) = (src.len(), dst.len());
        if n == 0 || m == 0 {
            return Ok(GreedyMatches {
                pairs: vec![None; n],
                fit_quality: vec![self.max_fit_error; n],
            });
        }

        // row i holds the scores of src[i] against every destination
        let mut scores = vec![f64::INFINITY; n * m];
        let best = map_rows(self.strategy, &mut scores, m, |i, row| {
            Ok(self.best_in_row(&src[i], i, dst, &gate, row))
        })?;

        let best = if self.backwards_validation {
            let scores = &scores;
            map_indices(
                self.strategy,
                n,
                || (),
                |_, i| Ok(best[i].filter(|&(j, fit)| is_best_in_column(scores, m, i, j, fit))),
            )?
        } else {
            best
        };

        let (pairs, fit_quality): (Vec<_>, Vec<_>) = best
            .into_iter()
            .map(|b| match b {
                Some((j, fit)) => (Some(j), fit),
                None => (None, self.max_fit_error),
            })
            .unzip();

        let matches = GreedyMatches { pairs, fit_quality };
        log::debug!(
            "greedy association matched {} of {} sources against {} destinations",
            matches.num_matched(),
            n,
            m
        );
        Ok(matches)
    }

    /// Score one source against all destinations and select its best match.
    fn best_in_row<G>(
        &self,
        a: &D,
        i: usize,
        dst: &[D],
        gate: &G,
        row: &mut [f64],
    ) -> Option<(usize, f64)>
    where
        G: Fn(usize, usize) -> bool,
    {
        let mut best_score = self.max_fit_error;
        let mut best_index = None;
        for (j, (b, cell)) in dst.iter().zip(row.iter_mut()).enumerate() {
            if !gate(i, j) {
                *cell = f64::INFINITY;
                continue;
            }
            let fit = self.score.score(a, b);
            *cell = fit;
            if fit <= best_score {
                best_score = fit;
                best_index = Some(j);
            }
        }
        let best_index = best_index?;

        // a perfect match is never rejected by the ratio test
        if self.ratio_test < 1.0 && best_score != 0.0 {
            let second_best = row
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != best_index)
                .fold(f64::INFINITY, |acc, (_, &fit)| acc.min(fit));
            let ratio = effective_ratio(self.ratio_test, self.ratio_uses_sqrt);
            if best_score > ratio * second_best {
                return None;
            }
        }

        Some((best_index, best_score))
    }
}

/// Returns true if no source other than `i` scores `fit` or better against destination `j`.
fn is_best_in_column(scores: &[f64], m: usize, i: usize, j: usize, fit: f64) -> bool {
    scores
        .iter()
        .skip(j)
        .step_by(m)
        .enumerate()
        .all(|(k, &other)| k == i || other > fit)
}

/// Greedy association restricted to features whose locations are close.
///
/// A destination is only considered when the distance between its location and
/// the location of the source is at most the maximum distance. The maximum is
/// inclusive and expressed in the units of the [`ImageDistance`], squared pixels
/// for the default [`EuclideanSqDistance`].
///
/// The gate only skips the descriptor scores. The `N*M` score matrix is still
/// allocated on every call and every location pair is visited, so memory and
/// the location checks stay `O(N*M)` however small the maximum distance is.
pub struct AssociateGreedy2D<D, S, F = EuclideanSqDistance> {
    greedy: AssociateGreedy<D, S>,
    distance: F,
    max_distance: MaxDistance,
    max_distance_units: Option<f64>,
}

impl<D: Sync, S: ScoreAssociation<D>> AssociateGreedy2D<D, S, EuclideanSqDistance> {
    /// Create a spatially gated greedy associator using the squared Euclidean distance.
    pub fn new(score: S, config: &ConfigAssociateGreedy) -> Result<Self, AssociateError> {
        Self::with_distance(score, EuclideanSqDistance, config)
    }
}

impl<D: Sync, S: ScoreAssociation<D>, F: ImageDistance> AssociateGreedy2D<D, S, F> {
    /// Create a spatially gated greedy associator with a custom distance function.
    pub fn with_distance(
        score: S,
        distance: F,
        config: &ConfigAssociateGreedy,
    ) -> Result<Self, AssociateError> {
        let greedy = AssociateGreedy::new(score, config)?;
        let max_distance_units = match config.max_distance {
            MaxDistance::Absolute(pixels) => Some(distance.convert_pixel_distance(pixels)),
            MaxDistance::Relative(_) => None,
        };
        Ok(Self {
            greedy,
            distance,
            max_distance: config.max_distance,
            max_distance_units,
        })
    }

    /// Resolve the maximum distance for images of the given size.
    pub fn initialize(&mut self, width: usize, height: usize) {
        let pixels = self.max_distance.compute(width, height);
        self.max_distance_units = Some(self.distance.convert_pixel_distance(pixels));
    }

    /// The underlying greedy associator.
    pub fn greedy(&self) -> &AssociateGreedy<D, S> {
        &self.greedy
    }

    /// Mutable access to the underlying greedy associator.
    pub fn greedy_mut(&mut self) -> &mut AssociateGreedy<D, S> {
        &mut self.greedy
    }

    /// The maximum distance in the units of the distance function, if resolved.
    pub fn max_distance_units(&self) -> Option<f64> {
        self.max_distance_units
    }

    /// Set the maximum distance directly in the units of the distance function.
    pub fn set_max_distance_units(&mut self, units: f64) -> Result<(), AssociateError> {
        if units.is_nan() || units < 0.0 {
            return Err(AssociateError::InvalidParameter {
                name: "max_distance",
                value: units,
            });
        }
        self.max_distance_units = Some(units);
        Ok(())
    }

    /// Associate located descriptors.
    ///
    /// # Arguments
    ///
    /// * `src_locations` - Locations of the source features.
    /// * `src` - The source descriptors.
    /// * `dst_locations` - Locations of the destination features.
    /// * `dst` - The destination descriptors.
    ///
    /// # Errors
    ///
    /// Fails before any work if a location list and its descriptor list differ
    /// in length, or if a relative distance was not resolved with [`Self::initialize`].
    pub fn associate(
        &self,
        src_locations: &[Location],
        src: &[D],
        dst_locations: &[Location],
        dst: &[D],
    ) -> Result<GreedyMatches, AssociateError> {
        check_locations("source", src_locations, src)?;
        check_locations("destination", dst_locations, dst)?;
        let max_units = self
            .max_distance_units
            .ok_or(AssociateError::NotInitialized)?;

        self.greedy.associate_gated(src, dst, |i, j| {
            self.distance.distance(&src_locations[i], &dst_locations[j]) <= max_units
        })
    }
}

pub(crate) fn check_locations<D>(
    name: &'static str,
    locations: &[Location],
    descriptors: &[D],
) -> Result<(), AssociateError> {
    if locations.len() != descriptors.len() {
        return Err(AssociateError::MismatchedLengths {
            left_name: name,
            left_len: locations.len(),
            right_name: "descriptors",
            right_len: descriptors.len(),
        });
    }
    Ok(())
}
