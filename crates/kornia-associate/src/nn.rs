use std::collections::hash_map::{Entry, HashMap};

use kiddo::{KdTree, SquaredEuclidean};

use crate::error::AssociateError;
use crate::score::ScoreAssociation;
use crate::types::MatchScoreType;

/// A neighbor found by a nearest neighbor search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NnData {
    /// Index of the neighbor in the searched points.
    pub index: usize,
    /// Distance to the neighbor, in the units of the search.
    pub distance: f64,
}

/// A nearest neighbor index over a set of descriptors.
///
/// The search must be deterministic and return neighbors sorted by ascending
/// distance. A single index is queried concurrently, every query writes into a
/// caller owned result buffer.
pub trait NearestNeighbor<D>: Send + Sync {
    /// Replace the searched points.
    fn set_points(&mut self, points: &[D]);

    /// Number of searched points.
    fn len(&self) -> usize;

    /// Returns true if there are no points to search.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Meaning of the returned distances.
    fn score_type(&self) -> MatchScoreType {
        MatchScoreType::NormError
    }

    /// Find the `num_neighbors` points closest to `point`.
    ///
    /// # Arguments
    ///
    /// * `point` - The query descriptor.
    /// * `max_distance` - Neighbors farther than this are ignored, inclusive. `None` for unbounded.
    /// * `num_neighbors` - Maximum number of neighbors to return.
    /// * `results` - Cleared and filled with the neighbors sorted by distance.
    fn find_nearest(
        &self,
        point: &D,
        max_distance: Option<f64>,
        num_neighbors: usize,
        results: &mut Vec<NnData>,
    ) -> Result<(), AssociateError>;
}

/// Brute force nearest neighbor search using a descriptor score as distance.
///
/// Neighbors with equal distance are returned in index order.
pub struct ExhaustiveNeighbor<D, S> {
    score: S,
    points: Vec<D>,
}

impl<D, S> ExhaustiveNeighbor<D, S> {
    /// Create an empty search using the given score as distance.
    pub fn new(score: S) -> Self {
        Self {
            score,
            points: Vec::new(),
        }
    }
}

impl<D, S> NearestNeighbor<D> for ExhaustiveNeighbor<D, S>
where
    D: Clone + Send + Sync,
    S: ScoreAssociation<D>,
{
    fn set_points(&mut self, points: &[D]) {
        self.points = points.to_vec();
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn score_type(&self) -> MatchScoreType {
        self.score.score_type()
    }

    fn find_nearest(
        &self,
        point: &D,
        max_distance: Option<f64>,
        num_neighbors: usize,
        results: &mut Vec<NnData>,
    ) -> Result<(), AssociateError> {
        results.clear();
        if num_neighbors == 0 {
            return Ok(());
        }

        let max_distance = max_distance.unwrap_or(f64::INFINITY);
        for (index, p) in self.points.iter().enumerate() {
            let distance = self.score.score(point, p);
            if distance.is_nan() || distance > max_distance {
                continue;
            }
            if results.len() == num_neighbors
                && results.last().is_some_and(|worst| distance >= worst.distance)
            {
                continue;
            }
            let pos = results.partition_point(|r| r.distance <= distance);
            results.insert(pos, NnData { index, distance });
            results.truncate(num_neighbors);
        }
        Ok(())
    }
}

/// Nearest neighbor search backed by a kd-tree.
///
/// Distances are squared Euclidean distances. Identical points are stored once
/// in the tree, neighbors at the same point are returned in index order.
pub struct KdTreeNeighbor<const K: usize> {
    tree: KdTree<f64, K>,
    // indices of the points sharing each distinct location of the tree
    groups: Vec<Vec<usize>>,
    len: usize,
}

impl<const K: usize> KdTreeNeighbor<K> {
    /// Create an empty search.
    pub fn new() -> Self {
        Self {
            tree: KdTree::new(),
            groups: Vec::new(),
            len: 0,
        }
    }
}

impl<const K: usize> Default for KdTreeNeighbor<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Bit pattern of a point with `-0.0` folded into `0.0`.
fn point_key<const K: usize>(point: &[f64; K]) -> [u64; K] {
    point.map(|v| (v + 0.0).to_bits())
}

impl<const K: usize> NearestNeighbor<[f64; K]> for KdTreeNeighbor<K> {
    fn set_points(&mut self, points: &[[f64; K]]) {
        // kiddo leaves cannot hold more than their bucket size at one point
        let mut tree: KdTree<f64, K> = KdTree::with_capacity(points.len().max(1));
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut lookup: HashMap<[u64; K], usize> = HashMap::with_capacity(points.len());
        for (idx, p) in points.iter().enumerate() {
            match lookup.entry(point_key(p)) {
                Entry::Occupied(entry) => groups[*entry.get()].push(idx),
                Entry::Vacant(entry) => {
                    entry.insert(groups.len());
                    tree.add(p, groups.len() as u64);
                    groups.push(vec![idx]);
                }
            }
        }
        self.tree = tree;
        self.groups = groups;
        self.len = points.len();
    }

    fn len(&self) -> usize {
        self.len
    }

    fn find_nearest(
        &self,
        point: &[f64; K],
        max_distance: Option<f64>,
        num_neighbors: usize,
        results: &mut Vec<NnData>,
    ) -> Result<(), AssociateError> {
        results.clear();
        if num_neighbors == 0 || self.len == 0 {
            return Ok(());
        }

        let max_distance = max_distance.unwrap_or(f64::INFINITY);
        let neighbors = self.tree.nearest_n::<SquaredEuclidean>(point, num_neighbors);
        for nn in neighbors.into_iter().filter(|nn| nn.distance <= max_distance) {
            let Some(group) = self.groups.get(nn.item as usize) else {
                continue;
            };
            results.extend(group.iter().map(|&index| NnData {
                index,
                distance: nn.distance,
            }));
            if results.len() >= num_neighbors {
                break;
            }
        }
        results.truncate(num_neighbors);
        Ok(())
    }
}
