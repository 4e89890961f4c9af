use crate::error::AssociateError;
use crate::types::AssociatedIndex;

/// Find the source features which do not appear in any match.
///
/// # Arguments
///
/// * `matches` - The associations.
/// * `num_source` - Number of source features.
///
/// # Returns
///
/// The indices in `0..num_source` without a match, in ascending order.
pub fn find_unassociated_source(
    matches: &[AssociatedIndex],
    num_source: usize,
) -> Result<Vec<usize>, AssociateError> {
    find_unassociated(matches.iter().map(|m| m.src), num_source)
}

/// Find the destination features which do not appear in any match.
///
/// # Arguments
///
/// * `matches` - The associations.
/// * `num_destination` - Number of destination features.
///
/// # Returns
///
/// The indices in `0..num_destination` without a match, in ascending order.
pub fn find_unassociated_destination(
    matches: &[AssociatedIndex],
    num_destination: usize,
) -> Result<Vec<usize>, AssociateError> {
    find_unassociated(matches.iter().map(|m| m.dst), num_destination)
}

fn find_unassociated(
    indices: impl Iterator<Item = usize>,
    size: usize,
) -> Result<Vec<usize>, AssociateError> {
    let mut used = vec![false; size];
    for index in indices {
        let slot = used
            .get_mut(index)
            .ok_or(AssociateError::IndexOutOfBounds { index, size })?;
        *slot = true;
    }

    Ok(used
        .iter()
        .enumerate()
        .filter_map(|(i, &u)| (!u).then_some(i))
        .collect())
}
