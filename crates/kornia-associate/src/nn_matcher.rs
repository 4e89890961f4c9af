use std::marker::PhantomData;

use crate::config::{check_ratio_score_type, effective_ratio, ConfigAssociateNearestNeighbor};
use crate::describe::{Associate, AssociateDescription};
use crate::error::AssociateError;
use crate::nn::{NearestNeighbor, NnData};
use crate::parallel::{map_indices, ExecutionStrategy};
use crate::types::{AssociatedIndex, MatchScoreType};

/// Association of descriptors through a nearest neighbor search.
///
/// The destination descriptors are indexed by the search, every source is then
/// matched with its closest destination. With the ratio test enabled the two
/// closest destinations are requested and the match is kept if
/// `d0 <= ratio * d1`.
///
/// Each source is matched at most once but several sources can share the same
/// destination.
pub struct AssociateNearestNeighbor<D, N> {
    search: N,
    src: Vec<D>,
    num_destination: usize,
    matches: Vec<AssociatedIndex>,
    max_distance: Option<f64>,
    ratio_test: f64,
    ratio_uses_sqrt: bool,
    strategy: ExecutionStrategy,
    _descriptor: PhantomData<fn(&D)>,
}

impl<D, N> AssociateNearestNeighbor<D, N>
where
    D: Clone + Sync,
    N: NearestNeighbor<D>,
{
    /// Create the associator around a nearest neighbor search.
    ///
    /// Fails if the ratio test is enabled for a search whose distances have no
    /// zero minimum.
    pub fn new(search: N, config: &ConfigAssociateNearestNeighbor) -> Result<Self, AssociateError> {
        config.validate()?;
        check_ratio_score_type(config.score_ratio_threshold, search.score_type())?;
        if config.ratio_uses_sqrt && config.score_ratio_threshold >= 1.0 {
            log::warn!("ratio_uses_sqrt has no effect while the ratio test is disabled");
        }
        Ok(Self {
            search,
            src: Vec::new(),
            num_destination: 0,
            matches: Vec::new(),
            max_distance: config.max_error_threshold,
            ratio_test: config.score_ratio_threshold,
            ratio_uses_sqrt: config.ratio_uses_sqrt,
            strategy: config.strategy,
            _descriptor: PhantomData,
        })
    }

    /// The nearest neighbor search.
    pub fn search(&self) -> &N {
        &self.search
    }

    /// Set the ratio test threshold. Values `>= 1` disable the test.
    pub fn set_ratio_test(&mut self, ratio: f64) -> Result<(), AssociateError> {
        if ratio.is_nan() || ratio <= 0.0 {
            return Err(AssociateError::InvalidParameter {
                name: "score_ratio_threshold",
                value: ratio,
            });
        }
        check_ratio_score_type(ratio, self.search.score_type())?;
        self.ratio_test = ratio;
        Ok(())
    }

    /// Apply the ratio test on the square root of the distances.
    pub fn set_ratio_uses_sqrt(&mut self, uses_sqrt: bool) {
        self.ratio_uses_sqrt = uses_sqrt;
    }

    /// Set how the loop over source features is executed.
    pub fn set_strategy(&mut self, strategy: ExecutionStrategy) {
        self.strategy = strategy;
    }

    /// Number of neighbors requested for every source.
    fn num_neighbors(&self) -> usize {
        if self.ratio_test < 1.0 {
            2
        } else {
            1
        }
    }

    /// Decide the match of one source from the neighbors returned by the search.
    fn select(
        &self,
        src: usize,
        requested: usize,
        results: &mut [NnData],
    ) -> Result<Option<AssociatedIndex>, AssociateError> {
        match results.len() {
            0 => Ok(None),
            1 => Ok(Some(AssociatedIndex::new(src, results[0].index, results[0].distance))),
            2 if requested == 2 => {
                results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
                let (best, second) = (results[0], results[1]);
                let ratio = effective_ratio(self.ratio_test, self.ratio_uses_sqrt);
                Ok((best.distance <= ratio * second.distance)
                    .then(|| AssociatedIndex::new(src, best.index, best.distance)))
            }
            found => Err(AssociateError::UnexpectedNeighborCount { requested, found }),
        }
    }
}

impl<D, N> Associate for AssociateNearestNeighbor<D, N>
where
    D: Clone + Sync,
    N: NearestNeighbor<D>,
{
    fn associate(&mut self) -> Result<(), AssociateError> {
        let num_neighbors = self.num_neighbors();
        let src = &self.src;

        let selected = map_indices(self.strategy, src.len(), Vec::<NnData>::new, |results, i| {
            self.search
                .find_nearest(&src[i], self.max_distance, num_neighbors, results)?;
            self.select(i, num_neighbors, results)
        })?;
        self.matches = selected.into_iter().flatten().collect();

        log::debug!(
            "nearest neighbor association matched {} of {} sources against {} destinations",
            self.matches.len(),
            self.src.len(),
            self.num_destination
        );
        Ok(())
    }

    fn matches(&self) -> &[AssociatedIndex] {
        &self.matches
    }

    fn num_source(&self) -> usize {
        self.src.len()
    }

    fn num_destination(&self) -> usize {
        self.num_destination
    }

    fn set_max_score_threshold(&mut self, score: Option<f64>) {
        self.max_distance = score;
    }

    fn score_type(&self) -> MatchScoreType {
        self.search.score_type()
    }

    fn unique_source(&self) -> bool {
        true
    }

    fn unique_destination(&self) -> bool {
        false
    }
}

impl<D, N> AssociateDescription<D> for AssociateNearestNeighbor<D, N>
where
    D: Clone + Sync,
    N: NearestNeighbor<D>,
{
    fn set_source(&mut self, src: &[D]) {
        self.src = src.to_vec();
    }

    fn set_destination(&mut self, dst: &[D]) {
        self.search.set_points(dst);
        self.num_destination = dst.len();
    }
}
