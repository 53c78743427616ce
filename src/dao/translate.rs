//! ServiceQuery → storage predicate, projection and sort.

use bson::Bson;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::dsl::{CriterionValue, Operator, ParsedField, ServiceQuery};
use crate::errors::{DslError, Result};
use crate::query::{CmpOp, Filter, FindOptions, Order, Projection, SortSpec};
use crate::schema::{EntityDescriptor, EntityFieldMapper, FieldType, resolve_field_path, storage_path};

const ALL_FIELDS: &str = "*";

/// Full predicate for `query`: ids, plain criteria, then one element match per
/// sync-match root.
///
/// # Errors
/// PARAMS_ERROR for unknown fields; QUERY_ERROR for operator / value mixes
/// without a predicate.
pub fn to_filter(
    mapper: &dyn EntityFieldMapper,
    root: &Arc<EntityDescriptor>,
    id_storage_name: &str,
    query: &ServiceQuery,
) -> Result<Filter> {
    let mut clauses = Vec::new();
    match query.ids() {
        Some([id]) => clauses.push(Filter::eq(id_storage_name, id.clone())),
        Some(ids) => clauses.push(Filter::is_in(id_storage_name, ids.to_vec())),
        None => {}
    }

    let sync_roots: Vec<&str> =
        query.sync_match().map(|s| s.iter().map(String::as_str).collect()).unwrap_or_default();
    let mut synced: BTreeMap<&str, Vec<(ParsedField, &[CriterionValue])>> = BTreeMap::new();
    for (key, values) in query.criteria().iter() {
        let roots: Vec<&str> = sync_roots
            .iter()
            .copied()
            .filter(|r| key.field().strip_prefix(r).is_some_and(|rest| rest.starts_with('.')))
            .collect();
        if roots.is_empty() {
            let path = storage_path(mapper, root, key.field())?;
            clauses.extend(predicate(&path, key, values)?);
            continue;
        }
        for r in roots {
            let sub = &key.field()[r.len() + 1..];
            let sub_key = match key.op() {
                Some(op) => ParsedField::with_op(sub, op),
                None => ParsedField::new(sub),
            };
            synced.entry(r).or_default().push((sub_key, values));
        }
    }

    for (sync_root, keys) in synced {
        let resolved = resolve_field_path(mapper, root, sync_root)?;
        let last = sync_root.rsplit('.').next().unwrap_or(sync_root);
        let declared = mapper.field_type(&resolved.parent, last)?;
        let (FieldType::List(_), FieldType::Object(element)) = (&declared, resolved.leaf) else {
            return Err(DslError::query(format!(
                "syncMatch field '{sync_root}' is not an array of objects"
            )));
        };
        let mut subs = Vec::with_capacity(keys.len());
        for (key, values) in keys {
            let path = storage_path(mapper, &element, key.field())?;
            subs.extend(predicate(&path, &key, values)?);
        }
        clauses.push(Filter::elem_match(&resolved.storage_path, Filter::and(subs)));
    }
    Ok(Filter::and(clauses))
}

/// Predicate for one criteria key; `None` when the key does not constrain.
///
/// # Errors
/// QUERY_ERROR for sentinels paired with an operator and for range operators
/// over several values.
pub fn predicate(path: &str, key: &ParsedField, values: &[CriterionValue]) -> Result<Option<Filter>> {
    if let [single] = values {
        return Ok(match (key.op(), single) {
            (_, CriterionValue::Any) => None,
            (None, CriterionValue::Literal(v)) => Some(Filter::eq(path, v.clone())),
            (None, CriterionValue::IsNull) => Some(Filter::is_null(path)),
            (None, CriterionValue::Exists) => Some(Filter::exists(path)),
            (Some(op), CriterionValue::Literal(v)) => Some(match range_op(op) {
                Some(cmp) => Filter::cmp(path, cmp, v.clone()),
                None => Filter::not_in(path, vec![v.clone()]),
            }),
            (Some(op), reserved) => return Err(reserved_with_operator(key, op, reserved)),
        });
    }
    if values.contains(&CriterionValue::Any) {
        return Ok(None);
    }
    if let Some(op) = key.op().filter(|op| op.is_range()) {
        return Err(DslError::query(format!(
            "Operator '{op}' on field '{}' accepts exactly one value",
            key.field()
        )));
    }

    let mut members = Vec::with_capacity(values.len());
    let mut exists = false;
    for v in values {
        match (key.op(), v) {
            (_, CriterionValue::Literal(b)) => members.push(b.clone()),
            (None, CriterionValue::IsNull) => members.push(Bson::Null),
            (None, CriterionValue::Exists) => exists = true,
            (Some(op), reserved) => return Err(reserved_with_operator(key, op, reserved)),
            (None, CriterionValue::Any) => {}
        }
    }
    let set = if key.op() == Some(Operator::Ne) {
        Filter::not_in(path, members)
    } else {
        Filter::is_in(path, members)
    };
    Ok(Some(if exists { Filter::Or(vec![Filter::exists(path), set]) } else { set }))
}

fn range_op(op: Operator) -> Option<CmpOp> {
    match op {
        Operator::Gt => Some(CmpOp::Gt),
        Operator::Gte => Some(CmpOp::Gte),
        Operator::Lt => Some(CmpOp::Lt),
        Operator::Lte => Some(CmpOp::Lte),
        Operator::Ne => None,
    }
}

fn reserved_with_operator(key: &ParsedField, op: Operator, value: &CriterionValue) -> DslError {
    DslError::query(format!(
        "Reserved value '{value}' cannot be combined with operator '{op}' on field '{}'",
        key.field()
    ))
}

/// Projection, paging and sort for a fetch.
///
/// # Errors
/// QUERY_ERROR when both included and excluded fields are given; PARAMS_ERROR
/// for unknown fields.
pub fn to_find_options(
    mapper: &dyn EntityFieldMapper,
    root: &Arc<EntityDescriptor>,
    query: &ServiceQuery,
) -> Result<FindOptions> {
    let sort = match query.order() {
        Some(order) => {
            let (name, dir) = match order.strip_prefix('-') {
                Some(name) => (name, Order::Desc),
                None => (order, Order::Asc),
            };
            Some(vec![SortSpec { field: storage_path(mapper, root, name)?, order: dir }])
        }
        None => None,
    };
    Ok(FindOptions {
        projection: projection(mapper, root, query)?,
        sort,
        limit: Some(query.limit()),
        skip: Some(query.offset()),
    })
}

fn projection(
    mapper: &dyn EntityFieldMapper,
    root: &Arc<EntityDescriptor>,
    query: &ServiceQuery,
) -> Result<Option<Projection>> {
    let Some(fields) = query.fields() else {
        return Ok(None);
    };
    let mut all = false;
    let mut included = Vec::new();
    let mut excluded = Vec::new();
    for f in fields {
        if f == ALL_FIELDS {
            all = true;
        } else if let Some(name) = f.strip_prefix('-') {
            excluded.push(storage_path(mapper, root, name)?);
        } else {
            included.push(storage_path(mapper, root, f)?);
        }
    }
    if !included.is_empty() && !excluded.is_empty() {
        return Err(DslError::query("Query cannot have both included and excluded fields"));
    }
    Ok(if !excluded.is_empty() {
        Some(Projection::Exclude(excluded))
    } else if !all && !included.is_empty() {
        Some(Projection::Include(included))
    } else {
        None
    })
}
