//! Sequential numeric id allocation.
//!
//! New products, categories and users get `max(existing id) + 1`, or `1` for
//! an empty collection. The caller supplies every id currently stored; this
//! module never sees the store.
//!
//! Two callers that allocate against the same snapshot get the same answer.
//! Nothing here prevents that: uniqueness is checked when the document is
//! written, not when the id is chosen.

/// Errors that can occur when allocating the next id.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceError {
    /// The largest existing id is already `i32::MAX`.
    #[error("id sequence exhausted (largest existing id is {0})")]
    Exhausted(i32),
}

/// Compute the next sequential id from the ids already in use.
///
/// Non-positive ids are ignored, so the result is always at least `1`.
///
/// # Errors
///
/// Returns `SequenceError::Exhausted` if adding one would overflow.
///
/// # Example
///
/// ```
/// use gremco_core::next_sequential_id;
///
/// assert_eq!(next_sequential_id(std::iter::empty()), Ok(1));
/// assert_eq!(next_sequential_id([3, 9, 4]), Ok(10));
/// ```
pub fn next_sequential_id<I>(existing: I) -> Result<i32, SequenceError>
where
    I: IntoIterator<Item = i32>,
{
    let max = existing.into_iter().filter(|id| *id > 0).max().unwrap_or(0);
    max.checked_add(1).ok_or(SequenceError::Exhausted(max))
}
