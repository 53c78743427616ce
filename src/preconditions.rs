//! Entity and parameter checks shared by models and resources.

use std::fmt::Debug;

use crate::errors::{DslError, Result};

/// # Errors
/// ENTITY_ERROR when `value` is `None`.
pub fn ensure_not_null<T>(value: Option<&T>, field: &str) -> Result<()> {
    match value {
        Some(_) => Ok(()),
        None => Err(DslError::entity(format!("Field {field} must not be null"))),
    }
}

/// # Errors
/// ENTITY_ERROR when `value` is present.
pub fn ensure_not_set<T: Debug>(value: Option<&T>, field: &str) -> Result<()> {
    match value {
        Some(v) => Err(DslError::entity(format!("Field {field} must not be set, but got {v:?}"))),
        None => Ok(()),
    }
}

/// True when `patch` carries a value for the field that differs from `base`.
pub fn is_modified<E, V: PartialEq>(getter: impl Fn(&E) -> Option<V>, base: &E, patch: &E) -> bool {
    getter(patch).is_some_and(|p| getter(base).as_ref() != Some(&p))
}

/// # Errors
/// ENTITY_ERROR when `patch` changes the field read by `getter`.
pub fn ensure_not_modified<E: Debug, V: PartialEq + Debug>(
    field: &str,
    getter: impl Fn(&E) -> Option<V>,
    base: &E,
    patch: &E,
) -> Result<()> {
    if is_modified(&getter, base, patch) {
        return Err(DslError::entity(format!(
            "Cannot set {field} from {:?} to {:?} for {patch:?}",
            getter(base),
            getter(patch)
        )));
    }
    Ok(())
}

/// # Errors
/// PARAMS_ERROR with `msg` when `value` is `None`.
pub fn check_not_null<T>(msg: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| DslError::params(msg))
}
