//! Request text to [`ServiceQuery`]: the path segment carries ids and
//! criteria clauses, the query string carries paging and projection knobs.
//! [`parse_request`] takes input already percent-decoded by the transport;
//! [`parse_url`] reads the escaped canonical form.

use std::borrow::Cow;
use std::sync::Arc;

use super::escape::unescape;
use super::field::{Operator, ParsedField};
use super::params::ServiceQueryParams;
use super::patch::PatchContext;
use super::query::{ServiceQuery, ServiceQueryBuilder};
use super::value::{CriterionValue, ReservedValue};
use crate::entity::Entity;
use crate::errors::{DslError, Result};
use crate::schema::{
    DocumentFieldMapper, EntityDescriptor, EntityFieldMapper, coerce_literal, descriptor_of,
    resolve_field_path,
};

const CLAUSE_SEPARATOR: char = ';';
const VALUE_SEPARATOR: char = ',';
const NO_IDS: &str = "-";

/// Query-string parameters in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
    /// Values still carry `%XX` escapes, decoded after splitting.
    escaped: bool,
}

impl QueryParams {
    /// Split `a=1&b=2`; a leading `?` is ignored, keys without `=` get an empty value.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let pairs = query
            .trim_start_matches('?')
            .split('&')
            .filter(|p| !p.is_empty())
            .map(|p| match p.split_once('=') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => (p.to_string(), String::new()),
            })
            .collect();
        Self { pairs, escaped: false }
    }

    /// Like [`parse`](Self::parse) for a query string whose values are
    /// percent-escaped, as rendered by [`ServiceQuery::to_url_part`].
    #[must_use]
    pub fn parse_escaped(query: &str) -> Self {
        Self { escaped: true, ..Self::parse(query) }
    }

    #[must_use]
    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self { pairs: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(), escaped: false }
    }

    #[must_use]
    pub fn first(&self, key: &str) -> Option<Cow<'_, str>> {
        self.raw(key).map(|v| self.decode(v))
    }

    fn raw(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn decode<'a>(&self, v: &'a str) -> Cow<'a, str> {
        if self.escaped { unescape(v) } else { Cow::Borrowed(v) }
    }

    /// # Errors
    /// PARAMS_ERROR when the value is present but not an integer.
    pub fn int(&self, key: &str) -> Result<Option<i64>> {
        self.first(key)
            .map(|v| {
                v.trim()
                    .parse::<i64>()
                    .map_err(|_| DslError::params(format!("Cannot parse integer from '{key}'")))
            })
            .transpose()
    }

    /// `true` in any case is true; any other present value is false.
    #[must_use]
    pub fn bool(&self, key: &str) -> Option<bool> {
        self.first(key).map(|v| v.eq_ignore_ascii_case("true"))
    }

    /// Comma list with empty pieces dropped.
    #[must_use]
    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        self.raw(key).map(|raw| split_values(raw, self.escaped))
    }
}

/// Split on the value separator first so escaped commas stay inside values.
fn split_values(raw: &str, escaped: bool) -> Vec<String> {
    raw.split(VALUE_SEPARATOR)
        .filter(|v| !v.is_empty())
        .map(|v| if escaped { unescape(v).into_owned() } else { v.to_string() })
        .collect()
}

/// Parse a path segment and query parameters against `root`.
///
/// # Errors
/// PARAMS_ERROR for malformed keys, unknown fields and unconvertible values;
/// QUERY_ERROR for structurally invalid queries.
pub fn parse_request(
    mapper: &dyn EntityFieldMapper,
    root: &Arc<EntityDescriptor>,
    segment: &str,
    params: &QueryParams,
    defaults: &ServiceQueryParams,
) -> Result<ServiceQuery> {
    let escaped = params.escaped;
    let mut builder = ServiceQuery::builder().with_query_params(defaults.clone());
    if let Some(offset) = params.int("offset")? {
        builder = builder.offset(offset);
    }
    if let Some(limit) = params.int("limit")? {
        builder = builder.limit(limit);
    }
    if let Some(fields) = params.list("fields") {
        builder = builder.fields(fields);
    }
    if let Some(order) = params.first("order") {
        builder = builder.order(&order);
    }
    if let Some(enabled) = params.bool("indexValidation") {
        builder = builder.index_validation(enabled);
    }
    if let Some(enabled) = params.bool("countTotalItems") {
        builder = builder.count_total_items(enabled);
    }
    if let Some(group_by) = params.first("groupBy") {
        builder = builder.group_by(&group_by);
    }
    if let Some(roots) = params.list("syncMatch") {
        builder = builder.sync_match(roots);
    }

    let mut parts = segment.split(CLAUSE_SEPARATOR);
    let path = parts.next().unwrap_or_default();
    for clause in parts.filter(|c| !c.is_empty()) {
        builder = parse_clause(mapper, root, clause, escaped, builder)?;
    }
    if !path.is_empty() && !path.starts_with(NO_IDS) {
        builder = builder.ids(parse_ids(mapper, root, path, escaped)?);
    }
    builder.build()
}

/// [`parse_request`] for an entity type with the document-store mapper.
///
/// # Errors
/// See [`parse_request`].
pub fn parse_request_for<E: Entity>(
    segment: &str,
    query: &str,
    defaults: &ServiceQueryParams,
) -> Result<ServiceQuery> {
    parse_request(&DocumentFieldMapper, &descriptor_of::<E>(), segment, &QueryParams::parse(query), defaults)
}

/// Parse a full `<segment>?<query>` string, e.g. the output of
/// [`ServiceQuery::to_url_part`].
///
/// # Errors
/// See [`parse_request`].
pub fn parse_url(
    mapper: &dyn EntityFieldMapper,
    root: &Arc<EntityDescriptor>,
    url: &str,
    defaults: &ServiceQueryParams,
) -> Result<ServiceQuery> {
    let (segment, query) = url.split_once('?').unwrap_or((url, ""));
    parse_request(mapper, root, segment, &QueryParams::parse_escaped(query), defaults)
}

/// Unset fields requested for a PATCH.
#[must_use]
pub fn patch_context(params: &QueryParams) -> PatchContext {
    params.list("unsetFields").map_or_else(PatchContext::default, PatchContext::with_unset_fields)
}

/// `key=v1,v2`, `key__op=v`, or `key<op>v`.
fn parse_clause(
    mapper: &dyn EntityFieldMapper,
    root: &Arc<EntityDescriptor>,
    clause: &str,
    escaped: bool,
    builder: ServiceQueryBuilder,
) -> Result<ServiceQueryBuilder> {
    let Some(pos) = clause.find(['=', '<', '>']) else {
        return Err(DslError::params(format!("Criteria clause '{clause}' has no operator")));
    };
    let (raw_key, rest) = clause.split_at(pos);
    let (infix, raw_values) = split_infix(rest);
    let parsed = ParsedField::parse(raw_key)?;
    let key = match infix {
        None => parsed,
        Some(_) if parsed.op().is_some() => {
            return Err(DslError::params(format!(
                "Criteria key '{raw_key}' combines a suffix and an infix operator"
            )));
        }
        Some(op) => ParsedField::with_op(parsed.field(), op),
    };

    let resolved = resolve_field_path(mapper, root, key.field())?;
    let values = split_values(raw_values, escaped)
        .iter()
        .map(|raw| CriterionValue::parse(raw, &resolved.leaf))
        .collect::<Result<Vec<_>>>()?;
    Ok(builder.with_parsed_criteria(key, values))
}

fn split_infix(rest: &str) -> (Option<Operator>, &str) {
    for op in [Operator::Ne, Operator::Lte, Operator::Gte, Operator::Lt, Operator::Gt] {
        if let Some(values) = rest.strip_prefix(op.symbol()) {
            return (Some(op), values);
        }
    }
    (None, rest.strip_prefix('=').unwrap_or(rest))
}

fn parse_ids(
    mapper: &dyn EntityFieldMapper,
    root: &Arc<EntityDescriptor>,
    path: &str,
    escaped: bool,
) -> Result<Vec<bson::Bson>> {
    let id_type = mapper.id_field_type(root)?;
    path.split(VALUE_SEPARATOR)
        .map(|raw| {
            if raw.is_empty() {
                return Err(DslError::params(format!("Empty identifier in '{path}'")));
            }
            let raw = if escaped { unescape(raw) } else { Cow::Borrowed(raw) };
            if let Some(reserved) = ReservedValue::from_token(&raw) {
                return Err(DslError::params(format!(
                    "Reserved value '{}' cannot be used as an identifier",
                    reserved.token()
                )));
            }
            coerce_literal(&raw, &id_type)
        })
        .collect()
}
