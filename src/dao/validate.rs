use crate::dsl::{ParsedField, ServiceQuery};
use crate::errors::{DslError, Result};
use crate::schema::EntityIndexInfo;

/// True when ids are given, criteria are empty, or some criteria field leads a
/// declared index.
#[must_use]
pub fn is_safe(index_info: &EntityIndexInfo, query: &ServiceQuery) -> bool {
    if query.ids().is_some() || query.criteria().is_empty() {
        return true;
    }
    query.criteria().keys().any(|k| index_info.covers(k.field()))
}

/// Reject unsafe queries (unless index validation is off) and a groupBy field
/// that is not a criteria key.
///
/// # Errors
/// QUERY_ERROR describing the violation.
pub fn validate(index_info: &EntityIndexInfo, entity_name: &str, query: &ServiceQuery) -> Result<()> {
    if query.index_validation() && !is_safe(index_info, query) {
        let keys: Vec<String> = query.criteria().keys().map(ParsedField::criteria_key).collect();
        return Err(DslError::query(format!(
            "Query criterion for fields [{}] don't match declared indexes  {} for class {entity_name}; \
             use '?indexValidation=false' query parameter to temporarily disable it for debugging purposes.",
            keys.join(", "),
            index_info.describe()
        )));
    }
    if let Some(group_by) = query.group_by()
        && !query.criteria().contains_key(&ParsedField::new(group_by))
    {
        return Err(DslError::query(
            "When provided, groupBy parameter should be contained in query criteria",
        ));
    }
    Ok(())
}
