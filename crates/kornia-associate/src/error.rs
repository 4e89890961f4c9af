use crate::parallel::ParallelError;

/// An error type for the association module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AssociateError {
    /// Two lists that must be indexed in lockstep have different lengths.
    #[error("Mismatched lengths: {left_name} ({left_len}) != {right_name} ({right_len})")]
    MismatchedLengths {
        /// Label for the left-hand list
        left_name: &'static str,
        /// Length of the left-hand list
        left_len: usize,
        /// Label for the right-hand list
        right_name: &'static str,
        /// Length of the right-hand list
        right_len: usize,
    },

    /// A configuration value is outside of its valid range.
    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter {
        /// Name of the parameter
        name: &'static str,
        /// The rejected value
        value: f64,
    },

    /// A match references a feature index outside of its set.
    #[error("Index {index} is out of bounds for a set of size {size}")]
    IndexOutOfBounds {
        /// The offending index
        index: usize,
        /// The size of the set
        size: usize,
    },

    /// The nearest neighbor search returned more neighbors than requested.
    #[error("Nearest neighbor search returned {found} neighbors, expected at most {requested}")]
    UnexpectedNeighborCount {
        /// Number of neighbors requested
        requested: usize,
        /// Number of neighbors returned
        found: usize,
    },

    /// A relative maximum distance needs the image size before association.
    #[error("The associator must be initialized with the image size before use")]
    NotInitialized,

    /// Error related to the parallel execution.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}
