use bson::Bson;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt::{self, Write as _};
use std::hash::{Hash, Hasher};

use super::criteria::Criteria;
use super::escape::{escape, escape_ids};
use super::field::ParsedField;
use super::params::ServiceQueryParams;
use super::value::CriterionValue;
use crate::errors::{DslError, Result};
use crate::schema::render_literal;

/// Largest page a query may request.
pub const MAX_LIMIT: usize = 10_000;

const SHAPE_FIELD_SEP: &str = "-";
const SHAPE_KV_SEP: &str = "-";
const SHAPE_VAL_JOINER: &str = "_";

/// A validated, immutable query. Equality and hashing follow
/// [`to_url_part`](Self::to_url_part).
#[derive(Debug, Clone)]
pub struct ServiceQuery {
    limit: usize,
    offset: usize,
    explicit_limit: bool,
    count_only: bool,
    count_total_items: bool,
    order: Option<String>,
    fields: Option<BTreeSet<String>>,
    ids: Option<Vec<Bson>>,
    criteria: Criteria,
    index_validation: bool,
    group_by: Option<String>,
    sync_match: Option<BTreeSet<String>>,
    query_shape: String,
    url_part: String,
}

impl ServiceQuery {
    #[must_use]
    pub fn builder() -> ServiceQueryBuilder {
        ServiceQueryBuilder::default()
    }

    /// Everything, with the default parameters.
    ///
    /// # Errors
    /// Never fails in practice; building is fallible in general.
    pub fn all() -> Result<Self> {
        Self::builder().build()
    }

    /// # Errors
    /// See [`ServiceQueryBuilder::build`].
    pub fn by_id(id: impl Into<Bson>) -> Result<Self> {
        Self::builder().id(id).build()
    }

    /// # Errors
    /// See [`ServiceQueryBuilder::build`].
    pub fn by_ids<I, V>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        Self::builder().ids(ids).build()
    }

    /// # Errors
    /// See [`ServiceQueryBuilder::build`].
    pub fn by_criteria(key: &str, value: impl Into<CriterionValue>) -> Result<Self> {
        Self::builder().with_criterion(key, value).build()
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// True when the caller asked for `limit=0`: only a total is wanted.
    #[must_use]
    pub fn is_count_only(&self) -> bool {
        self.count_only
    }

    #[must_use]
    pub fn count_total_items(&self) -> bool {
        self.count_total_items
    }

    #[must_use]
    pub fn order(&self) -> Option<&str> {
        self.order.as_deref()
    }

    #[must_use]
    pub fn fields(&self) -> Option<&BTreeSet<String>> {
        self.fields.as_ref()
    }

    /// Explicit ids, when some were given.
    #[must_use]
    pub fn ids(&self) -> Option<&[Bson]> {
        self.ids.as_deref().filter(|ids| !ids.is_empty())
    }

    #[must_use]
    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    #[must_use]
    pub fn index_validation(&self) -> bool {
        self.index_validation
    }

    #[must_use]
    pub fn group_by(&self) -> Option<&str> {
        self.group_by.as_deref()
    }

    #[must_use]
    pub fn sync_match(&self) -> Option<&BTreeSet<String>> {
        self.sync_match.as_ref()
    }

    /// Structural fingerprint; literal values do not take part.
    #[must_use]
    pub fn query_shape(&self) -> &str {
        &self.query_shape
    }

    /// Canonical `<ids|->;<key>=<v,..>?<param>=<v>&..` form; parseable back.
    #[must_use]
    pub fn to_url_part(&self) -> &str {
        &self.url_part
    }

    /// Copy with the value set of `key` replaced by the single `value`.
    #[must_use]
    pub(crate) fn narrowed(&self, key: &ParsedField, value: CriterionValue) -> Self {
        let mut q = self.clone();
        q.criteria.set(key.clone(), vec![value]);
        q.url_part = q.render_url_part();
        q
    }

    fn render_url_part(&self) -> String {
        let mut sb = match self.ids() {
            Some(ids) => escape_ids(
                ids.iter().map(|id| escape(&render_literal(id)).into_owned()).collect::<Vec<_>>().join(","),
            ),
            None => "-".to_string(),
        };
        for (key, values) in &self.criteria {
            let mut rendered: Vec<String> = values.iter().map(CriterionValue::render).collect();
            rendered.sort();
            let escaped: Vec<Cow<'_, str>> = rendered.iter().map(|v| escape(v)).collect();
            let _ = write!(sb, ";{}={}", key.criteria_key(), escaped.join(","));
        }
        sb.push('?');
        let _ = write!(sb, "limit={}&", self.limit);
        if self.offset != 0 {
            let _ = write!(sb, "offset={}&", self.offset);
        }
        if let Some(fields) = &self.fields {
            let _ = write!(sb, "fields={}&", join_escaped(fields));
        }
        if let Some(sync) = &self.sync_match {
            let _ = write!(sb, "syncMatch={}&", join_escaped(sync));
        }
        if !self.index_validation {
            sb.push_str("indexValidation=false&");
        }
        if let Some(order) = &self.order {
            let _ = write!(sb, "order={}&", escape(order));
        }
        if let Some(group_by) = &self.group_by {
            let _ = write!(sb, "groupBy={}&", escape(group_by));
        }
        if !self.count_total_items {
            sb.push_str("countTotalItems=false&");
        }
        sb
    }

    fn compute_shape(&self) -> String {
        let mut sb = String::new();
        if self.ids().is_some() {
            sb.push_str("IDS");
        }
        sb.push_str(SHAPE_FIELD_SEP);
        if !self.criteria.is_empty() {
            let keys: Vec<String> = self.criteria.keys().map(ParsedField::criteria_key).collect();
            let _ = write!(sb, "CRITERIA{SHAPE_KV_SEP}{}", keys.join(SHAPE_VAL_JOINER));
        }
        if let Some(order) = &self.order {
            let _ = write!(sb, "{SHAPE_FIELD_SEP}ORDER{SHAPE_KV_SEP}{order}");
        }
        if let Some(group_by) = &self.group_by {
            let _ = write!(sb, "{SHAPE_FIELD_SEP}GROUPBY{SHAPE_KV_SEP}{group_by}");
        }
        if let Some(sync) = &self.sync_match {
            let _ = write!(sb, "{SHAPE_FIELD_SEP}SYNCMATCH{SHAPE_KV_SEP}{}", join(sync, SHAPE_VAL_JOINER));
        }
        if self.explicit_limit {
            let _ = write!(sb, "{SHAPE_FIELD_SEP}LIMIT");
        }
        sb
    }
}

fn join(set: &BTreeSet<String>, sep: &str) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(sep)
}

fn join_escaped(set: &BTreeSet<String>) -> String {
    set.iter().map(|v| escape(v)).collect::<Vec<_>>().join(",")
}

impl PartialEq for ServiceQuery {
    fn eq(&self, other: &Self) -> bool {
        self.url_part == other.url_part
    }
}

impl Eq for ServiceQuery {}

impl Hash for ServiceQuery {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url_part.hash(state);
    }
}

impl fmt::Display for ServiceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url_part)
    }
}

impl Serialize for ServiceQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.url_part)
    }
}

/// Collects query parts; the first invalid input is reported by [`build`](Self::build).
#[derive(Debug, Default)]
pub struct ServiceQueryBuilder {
    limit: Option<i64>,
    offset: Option<i64>,
    count_total_items: Option<bool>,
    order: Option<String>,
    fields: Option<Vec<String>>,
    ids: Option<Vec<Bson>>,
    criteria: Criteria,
    index_validation: Option<bool>,
    group_by: Option<String>,
    sync_match: Option<Vec<String>>,
    params: ServiceQueryParams,
    error: Option<DslError>,
}

impl ServiceQueryBuilder {
    fn fail(&mut self, err: DslError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        if limit < 0 {
            self.fail(DslError::query("Limit cannot be negative"));
        } else {
            self.limit = Some(limit);
        }
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: i64) -> Self {
        if offset < 0 {
            self.fail(DslError::query("Offset cannot be less than 0"));
        } else {
            self.offset = Some(offset);
        }
        self
    }

    #[must_use]
    pub fn fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn sync_match<S: Into<String>>(mut self, roots: impl IntoIterator<Item = S>) -> Self {
        self.sync_match = Some(roots.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn index_validation(mut self, enabled: bool) -> Self {
        self.index_validation = Some(enabled);
        self
    }

    #[must_use]
    pub fn count_total_items(mut self, enabled: bool) -> Self {
        self.count_total_items = Some(enabled);
        self
    }

    #[must_use]
    pub fn order(mut self, order: &str) -> Self {
        self.order = Some(order.to_string());
        self
    }

    #[must_use]
    pub fn group_by(mut self, field: &str) -> Self {
        self.group_by = Some(field.to_string());
        self
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<Bson>) -> Self {
        self.ids = Some(vec![id.into()]);
        self
    }

    #[must_use]
    pub fn ids<I, V>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_criterion(self, key: &str, value: impl Into<CriterionValue>) -> Self {
        self.with_criteria(key, [value])
    }

    /// Add values for a key given as text (`rating`, `rating__gte`, `rating >=`).
    #[must_use]
    pub fn with_criteria<V: Into<CriterionValue>>(
        mut self,
        key: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        match ParsedField::parse(key) {
            Ok(parsed) => self.with_parsed_criteria(parsed, values.into_iter().map(Into::into).collect()),
            Err(e) => {
                self.fail(e);
                self
            }
        }
    }

    #[must_use]
    pub fn with_parsed_criteria(mut self, key: ParsedField, values: Vec<CriterionValue>) -> Self {
        if values.is_empty() {
            self.fail(DslError::query(format!(
                "Criteria values for field '{key}' cannot be empty"
            )));
        } else {
            self.criteria.insert_all(key, values);
        }
        self
    }

    #[must_use]
    pub fn with_query_params(mut self, params: ServiceQueryParams) -> Self {
        self.params = params;
        self
    }

    /// Apply server defaults, validate and freeze the query.
    ///
    /// # Errors
    /// The first invalid builder input, or an operator / value combination
    /// that cannot be translated.
    pub fn build(self) -> Result<ServiceQuery> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let params = self.params;

        let mut criteria = self.criteria;
        if !params.default_criteria().is_empty() {
            for (key, values) in params.default_criteria() {
                if !criteria.contains_key(key) {
                    criteria.insert_all(key.clone(), values.iter().cloned());
                }
            }
            criteria.retain(|_, values| values != [CriterionValue::Any]);
        }
        for (key, values) in &criteria {
            check_operator_values(key, values)?;
        }

        let fields = self
            .fields
            .map(|f| f.into_iter().collect::<BTreeSet<_>>())
            .or_else(|| params.default_fields().map(|f| f.iter().cloned().collect()));

        let count_only = self.limit == Some(0);
        let requested = self.limit.unwrap_or_else(|| params.default_limit());
        let limit = usize::try_from(requested).ok().filter(|l| *l <= MAX_LIMIT).unwrap_or(MAX_LIMIT);
        let offset = usize::try_from(self.offset.unwrap_or(0)).unwrap_or(0);

        let mut query = ServiceQuery {
            limit,
            offset,
            explicit_limit: self.limit.is_some(),
            count_only,
            count_total_items: self.count_total_items.unwrap_or(true),
            order: self.order,
            fields,
            ids: self.ids,
            criteria,
            index_validation: self.index_validation.unwrap_or(true),
            group_by: self.group_by,
            sync_match: self.sync_match.map(|s| s.into_iter().collect()),
            query_shape: String::new(),
            url_part: String::new(),
        };
        query.query_shape = query.compute_shape();
        query.url_part = query.render_url_part();
        Ok(query)
    }
}

/// Range operators take exactly one literal; sentinels only pair with plain keys.
fn check_operator_values(key: &ParsedField, values: &[CriterionValue]) -> Result<()> {
    let Some(op) = key.op() else {
        return Ok(());
    };
    if let Some(reserved) = values.iter().find_map(CriterionValue::reserved) {
        return Err(DslError::query(format!(
            "Reserved value '{}' cannot be combined with operator '{op}' on field '{}'",
            reserved.token(),
            key.field()
        )));
    }
    if op.is_range() && values.len() > 1 {
        return Err(DslError::query(format!(
            "Operator '{op}' on field '{}' accepts exactly one value",
            key.field()
        )));
    }
    Ok(())
}
