use serde::{Deserialize, Serialize};

use crate::error::AssociateError;
use crate::types::AssociatedIndex;

/// Removes ambiguous associations so that each feature is matched at most once.
///
/// For every feature on an enforced side only the match with the lowest score
/// is kept. If the lowest score is shared by two or more matches the feature is
/// ambiguous and all of its matches are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueByScore {
    /// Each source feature appears in at most one match.
    pub check_source: bool,
    /// Each destination feature appears in at most one match.
    pub check_destination: bool,
}

/// Best candidate seen so far for one feature.
#[derive(Clone, Copy)]
enum Slot {
    Empty,
    Best { match_index: usize, score: f64 },
    Ambiguous { score: f64 },
}

impl UniqueByScore {
    /// Create a filter enforcing uniqueness on the selected sides.
    pub fn new(check_source: bool, check_destination: bool) -> Self {
        Self {
            check_source,
            check_destination,
        }
    }

    /// Filter the matches.
    ///
    /// The source side is processed first and the destination side operates on
    /// its output. When no side is enforced the matches are returned unchanged.
    ///
    /// # Arguments
    ///
    /// * `matches` - Candidate associations.
    /// * `num_source` - Number of source features.
    /// * `num_destination` - Number of destination features.
    ///
    /// # Returns
    ///
    /// The surviving associations, ordered by the index of the last enforced side.
    pub fn process(
        &self,
        matches: &[AssociatedIndex],
        num_source: usize,
        num_destination: usize,
    ) -> Result<Vec<AssociatedIndex>, AssociateError> {
        let mut pruned = matches.to_vec();
        if self.check_source {
            pruned = keep_best(&pruned, num_source, |m| m.src)?;
        }
        if self.check_destination {
            pruned = keep_best(&pruned, num_destination, |m| m.dst)?;
        }
        Ok(pruned)
    }
}

fn keep_best(
    matches: &[AssociatedIndex],
    size: usize,
    key: impl Fn(&AssociatedIndex) -> usize,
) -> Result<Vec<AssociatedIndex>, AssociateError> {
    let mut slots = vec![Slot::Empty; size];

    for (match_index, m) in matches.iter().enumerate() {
        let index = key(m);
        let slot = slots
            .get_mut(index)
            .ok_or(AssociateError::IndexOutOfBounds { index, size })?;

        let score = m.fit_score;
        *slot = match *slot {
            Slot::Empty => Slot::Best { match_index, score },
            Slot::Best { score: best, .. } | Slot::Ambiguous { score: best } if score < best => {
                Slot::Best { match_index, score }
            }
            Slot::Best { score: best, .. } if score == best => Slot::Ambiguous { score },
            current => current,
        };
    }

    let pruned = slots
        .iter()
        .filter_map(|slot| match *slot {
            Slot::Best { match_index, .. } => Some(matches[match_index]),
            _ => None,
        })
        .collect::<Vec<_>>();

    log::debug!(
        "uniqueness kept {} of {} associations",
        pruned.len(),
        matches.len()
    );
    Ok(pruned)
}
