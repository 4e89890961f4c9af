use crate::distance::{EuclideanSqDistance, ImageDistance};
use crate::error::AssociateError;
use crate::greedy::{check_locations, AssociateGreedy, AssociateGreedy2D};
use crate::score::ScoreAssociation;
use crate::types::{AssociatedIndex, GreedyMatches, Location, MatchScoreType};
use crate::unassociated::{find_unassociated_destination, find_unassociated_source};
use crate::unique::UniqueByScore;

/// Common interface of the association algorithms.
///
/// The features are provided through [`AssociateDescription`] or
/// [`AssociateDescription2D`], then [`Associate::associate`] computes the
/// matches. Every call rebuilds the results from scratch.
pub trait Associate {
    /// Associate the current source and destination features.
    fn associate(&mut self) -> Result<(), AssociateError>;

    /// The matches found by the last call to [`Associate::associate`].
    fn matches(&self) -> &[AssociatedIndex];

    /// Number of source features.
    fn num_source(&self) -> usize;

    /// Number of destination features.
    fn num_destination(&self) -> usize;

    /// Source features without a match, in ascending order.
    fn unassociated_source(&self) -> Result<Vec<usize>, AssociateError> {
        find_unassociated_source(self.matches(), self.num_source())
    }

    /// Destination features without a match, in ascending order.
    fn unassociated_destination(&self) -> Result<Vec<usize>, AssociateError> {
        find_unassociated_destination(self.matches(), self.num_destination())
    }

    /// Set the maximum score of a match. `None` removes the bound.
    fn set_max_score_threshold(&mut self, score: Option<f64>);

    /// Meaning of the scores of the matches.
    fn score_type(&self) -> MatchScoreType;

    /// Returns true if every source feature appears in at most one match.
    fn unique_source(&self) -> bool;

    /// Returns true if every destination feature appears in at most one match.
    fn unique_destination(&self) -> bool;
}

/// Association of feature descriptors.
pub trait AssociateDescription<D>: Associate {
    /// Set the source descriptors.
    fn set_source(&mut self, src: &[D]);

    /// Set the destination descriptors.
    fn set_destination(&mut self, dst: &[D]);
}

/// Association of feature descriptors with known image locations.
pub trait AssociateDescription2D<D>: Associate {
    /// Provide the image size, required before a relative maximum distance can be used.
    fn initialize(&mut self, width: usize, height: usize);

    /// Set the source features. Locations and descriptors must have the same length.
    fn set_source(&mut self, locations: &[Location], src: &[D]) -> Result<(), AssociateError>;

    /// Set the destination features. Locations and descriptors must have the same length.
    fn set_destination(&mut self, locations: &[Location], dst: &[D])
        -> Result<(), AssociateError>;
}

/// [`AssociateGreedy`] exposed through [`AssociateDescription`].
///
/// Sources are always unique, destinations are unique when the backwards
/// validation is enabled.
pub struct AssociateGreedyDesc<D, S> {
    greedy: AssociateGreedy<D, S>,
    src: Vec<D>,
    dst: Vec<D>,
    pairs: GreedyMatches,
    matches: Vec<AssociatedIndex>,
}

impl<D, S> AssociateGreedyDesc<D, S>
where
    D: Clone + Sync,
    S: ScoreAssociation<D>,
{
    /// Wrap a greedy associator.
    pub fn new(greedy: AssociateGreedy<D, S>) -> Self {
        Self {
            greedy,
            src: Vec::new(),
            dst: Vec::new(),
            pairs: GreedyMatches::default(),
            matches: Vec::new(),
        }
    }

    /// The wrapped associator.
    pub fn greedy(&self) -> &AssociateGreedy<D, S> {
        &self.greedy
    }

    /// Mutable access to the wrapped associator.
    pub fn greedy_mut(&mut self) -> &mut AssociateGreedy<D, S> {
        &mut self.greedy
    }

    /// Per-source output of the last association.
    pub fn pairs(&self) -> &GreedyMatches {
        &self.pairs
    }
}

impl<D, S> Associate for AssociateGreedyDesc<D, S>
where
    D: Clone + Sync,
    S: ScoreAssociation<D>,
{
    fn associate(&mut self) -> Result<(), AssociateError> {
        self.pairs = self.greedy.associate(&self.src, &self.dst)?;
        self.matches = self.pairs.to_associations();
        Ok(())
    }

    fn matches(&self) -> &[AssociatedIndex] {
        &self.matches
    }

    fn num_source(&self) -> usize {
        self.src.len()
    }

    fn num_destination(&self) -> usize {
        self.dst.len()
    }

    fn set_max_score_threshold(&mut self, score: Option<f64>) {
        self.greedy.set_max_fit_error(score);
    }

    fn score_type(&self) -> MatchScoreType {
        self.greedy.score().score_type()
    }

    fn unique_source(&self) -> bool {
        true
    }

    fn unique_destination(&self) -> bool {
        self.greedy.backwards_validation()
    }
}

impl<D, S> AssociateDescription<D> for AssociateGreedyDesc<D, S>
where
    D: Clone + Sync,
    S: ScoreAssociation<D>,
{
    fn set_source(&mut self, src: &[D]) {
        self.src = src.to_vec();
    }

    fn set_destination(&mut self, dst: &[D]) {
        self.dst = dst.to_vec();
    }
}

/// [`AssociateGreedy2D`] exposed through [`AssociateDescription2D`].
pub struct AssociateGreedyDesc2D<D, S, F = EuclideanSqDistance> {
    greedy: AssociateGreedy2D<D, S, F>,
    src_locations: Vec<Location>,
    src: Vec<D>,
    dst_locations: Vec<Location>,
    dst: Vec<D>,
    pairs: GreedyMatches,
    matches: Vec<AssociatedIndex>,
}

impl<D, S, F> AssociateGreedyDesc2D<D, S, F>
where
    D: Clone + Sync,
    S: ScoreAssociation<D>,
    F: ImageDistance,
{
    /// Wrap a spatially gated greedy associator.
    pub fn new(greedy: AssociateGreedy2D<D, S, F>) -> Self {
        Self {
            greedy,
            src_locations: Vec::new(),
            src: Vec::new(),
            dst_locations: Vec::new(),
            dst: Vec::new(),
            pairs: GreedyMatches::default(),
            matches: Vec::new(),
        }
    }

    /// The wrapped associator.
    pub fn greedy(&self) -> &AssociateGreedy2D<D, S, F> {
        &self.greedy
    }

    /// Mutable access to the wrapped associator.
    pub fn greedy_mut(&mut self) -> &mut AssociateGreedy2D<D, S, F> {
        &mut self.greedy
    }

    /// Per-source output of the last association.
    pub fn pairs(&self) -> &GreedyMatches {
        &self.pairs
    }
}

impl<D, S, F> Associate for AssociateGreedyDesc2D<D, S, F>
where
    D: Clone + Sync,
    S: ScoreAssociation<D>,
    F: ImageDistance,
{
    fn associate(&mut self) -> Result<(), AssociateError> {
        self.pairs = self.greedy.associate(
            &self.src_locations,
            &self.src,
            &self.dst_locations,
            &self.dst,
        )?;
        self.matches = self.pairs.to_associations();
        Ok(())
    }

    fn matches(&self) -> &[AssociatedIndex] {
        &self.matches
    }

    fn num_source(&self) -> usize {
        self.src.len()
    }

    fn num_destination(&self) -> usize {
        self.dst.len()
    }

    fn set_max_score_threshold(&mut self, score: Option<f64>) {
        self.greedy.greedy_mut().set_max_fit_error(score);
    }

    fn score_type(&self) -> MatchScoreType {
        self.greedy.greedy().score().score_type()
    }

    fn unique_source(&self) -> bool {
        true
    }

    fn unique_destination(&self) -> bool {
        self.greedy.greedy().backwards_validation()
    }
}

impl<D, S, F> AssociateDescription2D<D> for AssociateGreedyDesc2D<D, S, F>
where
    D: Clone + Sync,
    S: ScoreAssociation<D>,
    F: ImageDistance,
{
    fn initialize(&mut self, width: usize, height: usize) {
        self.greedy.initialize(width, height);
    }

    fn set_source(&mut self, locations: &[Location], src: &[D]) -> Result<(), AssociateError> {
        check_locations("source", locations, src)?;
        self.src_locations = locations.to_vec();
        self.src = src.to_vec();
        Ok(())
    }

    fn set_destination(
        &mut self,
        locations: &[Location],
        dst: &[D],
    ) -> Result<(), AssociateError> {
        check_locations("destination", locations, dst)?;
        self.dst_locations = locations.to_vec();
        self.dst = dst.to_vec();
        Ok(())
    }
}

/// Exposes an [`AssociateDescription`] as an [`AssociateDescription2D`] by
/// ignoring the feature locations.
pub struct AssociateDescTo2D<A> {
    alg: A,
}

impl<A> AssociateDescTo2D<A> {
    /// Wrap an association which does not use locations.
    pub fn new(alg: A) -> Self {
        Self { alg }
    }

    /// The wrapped association.
    pub fn inner(&self) -> &A {
        &self.alg
    }

    /// Mutable access to the wrapped association.
    pub fn inner_mut(&mut self) -> &mut A {
        &mut self.alg
    }
}

impl<A: Associate> Associate for AssociateDescTo2D<A> {
    fn associate(&mut self) -> Result<(), AssociateError> {
        self.alg.associate()
    }

    fn matches(&self) -> &[AssociatedIndex] {
        self.alg.matches()
    }

    fn num_source(&self) -> usize {
        self.alg.num_source()
    }

    fn num_destination(&self) -> usize {
        self.alg.num_destination()
    }

    fn set_max_score_threshold(&mut self, score: Option<f64>) {
        self.alg.set_max_score_threshold(score);
    }

    fn score_type(&self) -> MatchScoreType {
        self.alg.score_type()
    }

    fn unique_source(&self) -> bool {
        self.alg.unique_source()
    }

    fn unique_destination(&self) -> bool {
        self.alg.unique_destination()
    }
}

impl<D, A: AssociateDescription<D>> AssociateDescription2D<D> for AssociateDescTo2D<A> {
    fn initialize(&mut self, _width: usize, _height: usize) {}

    fn set_source(&mut self, locations: &[Location], src: &[D]) -> Result<(), AssociateError> {
        check_locations("source", locations, src)?;
        self.alg.set_source(src);
        Ok(())
    }

    fn set_destination(
        &mut self,
        locations: &[Location],
        dst: &[D],
    ) -> Result<(), AssociateError> {
        check_locations("destination", locations, dst)?;
        self.alg.set_destination(dst);
        Ok(())
    }
}

/// Makes the output of an association unique by removing ambiguous matches.
///
/// Only the sides which the wrapped association does not already guarantee are
/// filtered, see [`UniqueByScore`].
pub struct AssociateUniqueByScore<A> {
    alg: A,
    check_source: bool,
    check_destination: bool,
    matches: Vec<AssociatedIndex>,
}

impl<A: Associate> AssociateUniqueByScore<A> {
    /// Wrap an association.
    ///
    /// # Arguments
    ///
    /// * `alg` - The association to filter.
    /// * `check_source` - Enforce unique source features.
    /// * `check_destination` - Enforce unique destination features.
    pub fn new(alg: A, check_source: bool, check_destination: bool) -> Self {
        Self {
            alg,
            check_source,
            check_destination,
            matches: Vec::new(),
        }
    }

    /// The wrapped association.
    pub fn inner(&self) -> &A {
        &self.alg
    }

    /// Mutable access to the wrapped association.
    pub fn inner_mut(&mut self) -> &mut A {
        &mut self.alg
    }
}

impl<A: Associate> Associate for AssociateUniqueByScore<A> {
    fn associate(&mut self) -> Result<(), AssociateError> {
        self.alg.associate()?;

        let filter = UniqueByScore::new(
            self.check_source && !self.alg.unique_source(),
            self.check_destination && !self.alg.unique_destination(),
        );
        self.matches = filter.process(
            self.alg.matches(),
            self.alg.num_source(),
            self.alg.num_destination(),
        )?;
        Ok(())
    }

    fn matches(&self) -> &[AssociatedIndex] {
        &self.matches
    }

    fn num_source(&self) -> usize {
        self.alg.num_source()
    }

    fn num_destination(&self) -> usize {
        self.alg.num_destination()
    }

    fn set_max_score_threshold(&mut self, score: Option<f64>) {
        self.alg.set_max_score_threshold(score);
    }

    fn score_type(&self) -> MatchScoreType {
        self.alg.score_type()
    }

    fn unique_source(&self) -> bool {
        self.check_source || self.alg.unique_source()
    }

    fn unique_destination(&self) -> bool {
        self.check_destination || self.alg.unique_destination()
    }
}

impl<D, A: AssociateDescription<D>> AssociateDescription<D> for AssociateUniqueByScore<A> {
    fn set_source(&mut self, src: &[D]) {
        self.alg.set_source(src);
    }

    fn set_destination(&mut self, dst: &[D]) {
        self.alg.set_destination(dst);
    }
}

impl<D, A: AssociateDescription2D<D>> AssociateDescription2D<D> for AssociateUniqueByScore<A> {
    fn initialize(&mut self, width: usize, height: usize) {
        self.alg.initialize(width, height);
    }

    fn set_source(&mut self, locations: &[Location], src: &[D]) -> Result<(), AssociateError> {
        self.alg.set_source(locations, src)
    }

    fn set_destination(
        &mut self,
        locations: &[Location],
        dst: &[D],
    ) -> Result<(), AssociateError> {
        self.alg.set_destination(locations, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigAssociateGreedy, MaxDistance};
    use crate::parallel::ExecutionStrategy;
    use crate::score::{ScoreNcc, ScoreSad};

    fn config(backwards: bool) -> ConfigAssociateGreedy {
        ConfigAssociateGreedy {
            backwards_validation: backwards,
            max_error_threshold: Some(10.0),
            strategy: ExecutionStrategy::Serial,
            ..Default::default()
        }
    }

    fn descs(values: &[f64]) -> Vec<[f64; 1]> {
        values.iter().map(|&v| [v]).collect()
    }

    fn greedy_desc(
        backwards: bool,
    ) -> Result<AssociateGreedyDesc<[f64; 1], ScoreSad>, AssociateError> {
        let greedy = AssociateGreedy::new(ScoreSad, &config(backwards))?;
        let mut alg = AssociateGreedyDesc::new(greedy);
        alg.set_source(&descs(&[1.0, 2.0, 3.0, 8.0]));
        alg.set_destination(&descs(&[3.0, 4.0, 1.0, 10.0]));
        Ok(alg)
    }

    #[test]
    fn test_greedy_desc() -> Result<(), AssociateError> {
        let mut alg = greedy_desc(true)?;
        alg.associate()?;
        assert_eq!(
            alg.matches(),
            &[
                AssociatedIndex::new(0, 2, 0.0),
                AssociatedIndex::new(2, 0, 0.0),
                AssociatedIndex::new(3, 3, 2.0),
            ]
        );
        assert_eq!(alg.unassociated_source()?, vec![1]);
        assert_eq!(alg.unassociated_destination()?, vec![1]);
        assert_eq!(alg.pairs().len(), 4);
        assert!(alg.unique_source());
        assert!(alg.unique_destination());
        assert_eq!(alg.score_type(), MatchScoreType::NormError);

        alg.greedy_mut().set_backwards_validation(false);
        assert!(!alg.unique_destination());
        Ok(())
    }

    #[test]
    fn test_unique_wrapper_filters_destination() -> Result<(), AssociateError> {
        let mut alg = AssociateUniqueByScore::new(greedy_desc(false)?, true, true);
        alg.associate()?;
        // without validation sources 0 and 1 both pick destination 2
        assert_eq!(alg.inner().matches().len(), 4);
        assert_eq!(
            alg.matches(),
            &[
                AssociatedIndex::new(2, 0, 0.0),
                AssociatedIndex::new(0, 2, 0.0),
                AssociatedIndex::new(3, 3, 2.0),
            ]
        );
        assert!(alg.unique_source());
        assert!(alg.unique_destination());
        Ok(())
    }

    #[test]
    fn test_unique_wrapper_keeps_unique_side() -> Result<(), AssociateError> {
        let mut alg = AssociateUniqueByScore::new(greedy_desc(true)?, true, true);
        alg.associate()?;
        assert_eq!(alg.matches(), alg.inner().matches());
        Ok(())
    }

    #[test]
    fn test_desc_to_2d() -> Result<(), AssociateError> {
        let mut alg = AssociateDescTo2D::new(greedy_desc(true)?);
        let src = descs(&[1.0, 2.0]);
        let dst = descs(&[2.0]);
        assert!(alg.set_source(&[[0.0, 0.0]], &src).is_err());

        alg.set_source(&[[0.0, 0.0], [500.0, 500.0]], &src)?;
        alg.set_destination(&[[100.0, 100.0]], &dst)?;
        alg.associate()?;
        assert_eq!(alg.matches(), &[AssociatedIndex::new(1, 0, 0.0)]);
        assert_eq!(alg.num_source(), 2);
        assert_eq!(alg.num_destination(), 1);
        Ok(())
    }

    #[test]
    fn test_greedy_desc_2d() -> Result<(), AssociateError> {
        let cfg = ConfigAssociateGreedy {
            max_distance: MaxDistance::Relative(0.01),
            ..config(false)
        };
        let mut alg = AssociateGreedyDesc2D::new(AssociateGreedy2D::new(ScoreSad, &cfg)?);
        alg.set_source(&[[0.0, 0.0], [50.0, 50.0]], &descs(&[1.0, 1.0]))?;
        alg.set_destination(&[[3.0, 4.0]], &descs(&[1.0]))?;
        assert_eq!(alg.associate(), Err(AssociateError::NotInitialized));

        // 1% of 500 pixels
        alg.initialize(500, 200);
        alg.associate()?;
        assert_eq!(alg.matches(), &[AssociatedIndex::new(0, 0, 0.0)]);
        assert_eq!(alg.unassociated_source()?, vec![1]);
        assert!(alg.unassociated_destination()?.is_empty());

        let res = alg.set_destination(&[[3.0, 4.0]], &descs(&[1.0, 2.0]));
        assert!(matches!(res, Err(AssociateError::MismatchedLengths { .. })));
        Ok(())
    }

    #[test]
    fn test_greedy_desc_2d_repeated_associate() -> Result<(), AssociateError> {
        let cfg = ConfigAssociateGreedy {
            max_distance: MaxDistance::Absolute(5.0),
            ..config(true)
        };
        let mut alg = AssociateGreedyDesc2D::new(AssociateGreedy2D::new(ScoreSad, &cfg)?);
        let src_loc: Vec<Location> = (0..12)
            .map(|i| [(i % 4) as f64 * 3.0, (i / 4) as f64 * 3.0])
            .collect();
        let dst_loc: Vec<Location> = (0..10)
            .map(|i| [(i % 4) as f64 * 3.0 + 1.0, (i / 4) as f64 * 3.0])
            .collect();
        let src = (0..12).map(|i| [i as f64 * 1.1]).collect::<Vec<_>>();
        let dst = (0..10).map(|i| [i as f64 * 1.1 + 0.05]).collect::<Vec<_>>();
        alg.set_source(&src_loc, &src)?;
        alg.set_destination(&dst_loc, &dst)?;
        alg.initialize(100, 100);

        alg.associate()?;
        let (matches, pairs) = (alg.matches().to_vec(), alg.pairs().clone());
        assert_eq!(matches.len(), 10);
        assert!(matches.iter().all(|m| m.src == m.dst));

        alg.associate()?;
        assert_eq!(matches, alg.matches());
        assert_eq!(&pairs, alg.pairs());
        assert_eq!(alg.unassociated_source()?, vec![10, 11]);
        Ok(())
    }

    #[test]
    fn test_score_type_forwarded() -> Result<(), AssociateError> {
        let alg = AssociateGreedyDesc::<[f64; 3], _>::new(AssociateGreedy::new(
            ScoreNcc,
            &ConfigAssociateGreedy::default(),
        )?);
        let alg = AssociateUniqueByScore::new(alg, false, false);
        assert_eq!(alg.score_type(), MatchScoreType::Correlation);
        Ok(())
    }
}
