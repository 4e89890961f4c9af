use crate::config::{ConfigAssociateGreedy, ConfigAssociateNearestNeighbor};
use crate::describe::{AssociateGreedyDesc, AssociateGreedyDesc2D};
use crate::error::AssociateError;
use crate::greedy::{AssociateGreedy, AssociateGreedy2D};
use crate::nn::{ExhaustiveNeighbor, KdTreeNeighbor};
use crate::nn_matcher::AssociateNearestNeighbor;
use crate::score::ScoreAssociation;

/// Greedy association of descriptors.
///
/// Example:
///
/// ```
/// use kornia_associate::{factory, Associate, AssociateDescription, ConfigAssociateGreedy};
/// use kornia_associate::score::ScoreSad;
///
/// let config = ConfigAssociateGreedy::default();
/// let mut alg = factory::greedy::<[f64; 2], _>(&config, ScoreSad).unwrap();
/// alg.set_source(&[[1.0f64, 2.0], [5.0, 5.0]]);
/// alg.set_destination(&[[5.0f64, 4.0], [1.0, 2.5]]);
/// alg.associate().unwrap();
///
/// assert_eq!(alg.matches().len(), 2);
/// assert_eq!(alg.matches()[0].dst, 1);
/// ```
pub fn greedy<D, S>(
    config: &ConfigAssociateGreedy,
    score: S,
) -> Result<AssociateGreedyDesc<D, S>, AssociateError>
where
    D: Clone + Sync,
    S: ScoreAssociation<D>,
{
    Ok(AssociateGreedyDesc::new(AssociateGreedy::new(score, config)?))
}

/// Greedy association of descriptors restricted to nearby image locations.
pub fn greedy_2d<D, S>(
    config: &ConfigAssociateGreedy,
    score: S,
) -> Result<AssociateGreedyDesc2D<D, S>, AssociateError>
where
    D: Clone + Sync,
    S: ScoreAssociation<D>,
{
    Ok(AssociateGreedyDesc2D::new(AssociateGreedy2D::new(score, config)?))
}

/// Nearest neighbor association of `K` dimensional points through a kd-tree.
///
/// The kd-tree reports squared Euclidean distances, `ratio_uses_sqrt` should be
/// enabled to apply the ratio test on Euclidean distances.
pub fn kd_tree<const K: usize>(
    config: &ConfigAssociateNearestNeighbor,
) -> Result<AssociateNearestNeighbor<[f64; K], KdTreeNeighbor<K>>, AssociateError> {
    AssociateNearestNeighbor::new(KdTreeNeighbor::new(), config)
}

/// Nearest neighbor association through a brute force search.
pub fn exhaustive<D, S>(
    config: &ConfigAssociateNearestNeighbor,
    score: S,
) -> Result<AssociateNearestNeighbor<D, ExhaustiveNeighbor<D, S>>, AssociateError>
where
    D: Clone + Send + Sync,
    S: ScoreAssociation<D>,
{
    AssociateNearestNeighbor::new(ExhaustiveNeighbor::new(score), config)
}
