#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Kornia Associate
//!
//! Matching of feature descriptors between two images.
//!
//! ## Key Features
//!
//! - **Greedy association**: exhaustive best match search with ratio test and backwards validation
//! - **Spatial gating**: only associate features whose image locations are close
//! - **Nearest neighbor association**: kd-tree or brute force search
//! - **Uniqueness**: drop ambiguous matches sharing the same feature
//! - **Parallel execution**: every algorithm returns the same output for any [`ExecutionStrategy`]
//!
//! ## Example: greedy association
//!
//! ```rust
//! use kornia_associate::{AssociateGreedy, ConfigAssociateGreedy};
//! use kornia_associate::score::ScoreSad;
//!
//! let config = ConfigAssociateGreedy {
//!     max_error_threshold: Some(10.0),
//!     ..Default::default()
//! };
//! let alg = AssociateGreedy::new(ScoreSad, &config)?;
//!
//! let src = [[1.0f64], [2.0], [3.0], [8.0]];
//! let dst = [[3.0f64], [4.0], [1.0], [10.0]];
//! let matches = alg.associate(&src, &dst)?;
//!
//! assert_eq!(matches.pairs, vec![Some(2), None, Some(0), Some(3)]);
//! # Ok::<(), kornia_associate::AssociateError>(())
//! ```

/// Traits shared by the association algorithms and their adapters.
pub mod describe;

/// Descriptor abstraction used by the score functions.
pub mod descriptor;

/// Distance functions between image locations.
pub mod distance;

/// Error types for the association module.
pub mod error;

/// Helpers building association algorithms from their configuration.
pub mod factory;

/// Greedy association of descriptors.
pub mod greedy;

/// Lookup table for the Hamming distance of binary descriptors.
pub mod hamming;

/// Nearest neighbor searches.
pub mod nn;

/// Association through a nearest neighbor search.
pub mod nn_matcher;

/// module containing parallelization utilities.
pub mod parallel;

/// Score functions between two descriptors.
pub mod score;

/// Common association types.
pub mod types;

/// Features missing from a list of matches.
pub mod unassociated;

/// Removal of ambiguous matches.
pub mod unique;

mod config;

pub use config::{ConfigAssociateGreedy, ConfigAssociateNearestNeighbor, MaxDistance};
pub use describe::{
    Associate, AssociateDescTo2D, AssociateDescription, AssociateDescription2D,
    AssociateGreedyDesc, AssociateGreedyDesc2D, AssociateUniqueByScore,
};
pub use error::AssociateError;
pub use greedy::{AssociateGreedy, AssociateGreedy2D};
pub use nn_matcher::AssociateNearestNeighbor;
pub use parallel::{ExecutionStrategy, ParallelError};
pub use types::{AssociatedIndex, GreedyMatches, Location, MatchScoreType};
pub use unassociated::{find_unassociated_destination, find_unassociated_source};
pub use unique::UniqueByScore;
