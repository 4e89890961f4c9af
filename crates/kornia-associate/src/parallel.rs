use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AssociateError;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The minimum block length must be valid.
    #[error("block length must be > 0 for ParallelBlocks strategy")]
    InvalidBlockLength(usize),

    /// Rows must contain at least one element.
    #[error("row length must be > 0")]
    InvalidRowLength,
}

/// Controls how the loop over source features is executed.
///
/// Every strategy produces exactly the same output: each source feature is
/// processed independently and results are gathered in index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExecutionStrategy {
    /// Use the global Rayon thread pool to process every source feature in parallel.
    #[default]
    ParallelElements,

    /// Use the global Rayon thread pool, splitting work into blocks of at least
    /// the given number of source features.
    ///
    /// Larger blocks reduce scheduling overhead when the destination set is small.
    ParallelBlocks(usize),

    /// Run sequentially on the current thread.
    Serial,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    /// Use this primarily for benchmarking or specific isolation needs.
    Fixed(usize),
}

impl ExecutionStrategy {
    fn min_len(&self) -> Result<usize, ParallelError> {
        match *self {
            ExecutionStrategy::ParallelBlocks(0) => Err(ParallelError::InvalidBlockLength(0)),
            ExecutionStrategy::ParallelBlocks(n) => Ok(n),
            _ => Ok(1),
        }
    }

    /// Runs `f` inside the thread pool selected by the strategy.
    fn install<R: Send>(&self, f: impl FnOnce() -> R + Send) -> Result<R, ParallelError> {
        match *self {
            ExecutionStrategy::Fixed(0) => Err(ParallelError::InvalidThreadCount(0)),
            ExecutionStrategy::Fixed(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ParallelError::BuildError(e.to_string()))?;
                Ok(pool.install(f))
            }
            _ => Ok(f()),
        }
    }
}

/// Map every row of `data` to a value, in row order.
///
/// `data` is split into consecutive rows of `row_len` elements and the closure
/// receives the row index together with exclusive access to that row.
/// The first error returned by any row aborts the whole operation.
pub(crate) fn map_rows<T, R, F>(
    strategy: ExecutionStrategy,
    data: &mut [T],
    row_len: usize,
    op: F,
) -> Result<Vec<R>, AssociateError>
where
    T: Send,
    R: Send,
    F: Fn(usize, &mut [T]) -> Result<R, AssociateError> + Send + Sync,
{
    if row_len == 0 {
        return Err(ParallelError::InvalidRowLength.into());
    }

    if strategy == ExecutionStrategy::Serial {
        return data
            .chunks_mut(row_len)
            .enumerate()
            .map(|(i, row)| op(i, row))
            .collect();
    }

    let min_len = strategy.min_len()?;
    strategy.install(|| {
        data.par_chunks_mut(row_len)
            .enumerate()
            .with_min_len(min_len)
            .map(|(i, row)| op(i, row))
            .collect()
    })?
}

/// Map every index in `0..len` to a value, in index order.
///
/// Each worker owns a scratch value created by `init`, so per-index work may
/// reuse buffers without sharing them across threads.
pub(crate) fn map_indices<S, R, I, F>(
    strategy: ExecutionStrategy,
    len: usize,
    init: I,
    op: F,
) -> Result<Vec<R>, AssociateError>
where
    R: Send,
    I: Fn() -> S + Send + Sync,
    F: Fn(&mut S, usize) -> Result<R, AssociateError> + Send + Sync,
{
    if strategy == ExecutionStrategy::Serial {
        let mut scratch = init();
        return (0..len).map(|i| op(&mut scratch, i)).collect();
    }

    let min_len = strategy.min_len()?;
    strategy.install(|| {
        (0..len)
            .into_par_iter()
            .with_min_len(min_len)
            .map_init(&init, |scratch, i| op(scratch, i))
            .collect()
    })?
}
