use crate::dsl::ServiceQuery;
use crate::errors::{DslError, Result};

/// Total item count for a fetched page, calling `count` only when the page
/// alone cannot tell.
///
/// # Errors
/// GENERAL_ERROR when more rows than the limit were fetched; otherwise the
/// error of `count`.
pub fn total_items(
    query: &ServiceQuery,
    fetched: usize,
    count: impl FnOnce() -> Result<u64>,
) -> Result<Option<u64>> {
    if !query.count_total_items() {
        return Ok(None);
    }
    let limit = query.limit();
    if fetched > limit {
        return Err(DslError::general(format!(
            "Implementation error: results size must be not greater than limit, was {fetched} but limit was: {limit}"
        )));
    }
    if query.is_count_only() {
        return count().map(Some);
    }
    if fetched == 0 && query.offset() == 0 && limit > 0 {
        return Ok(Some(0));
    }
    // an empty page past the end, or a full page: the store has to count
    if fetched > 0 && fetched < limit {
        return Ok(Some((query.offset() + fetched) as u64));
    }
    count().map(Some)
}
