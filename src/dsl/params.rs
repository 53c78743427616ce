use super::criteria::Criteria;
use super::field::ParsedField;
use super::value::CriterionValue;

/// Server-side defaults applied when a query is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceQueryParams {
    default_limit: i64,
    default_fields: Option<Vec<String>>,
    default_criteria: Criteria,
}

impl Default for ServiceQueryParams {
    fn default() -> Self {
        Self::all()
    }
}

impl ServiceQueryParams {
    /// Unbounded default limit (clamped to the maximum page size) and all fields.
    #[must_use]
    pub fn all() -> Self {
        Self {
            default_limit: i64::from(i32::MAX),
            default_fields: Some(vec!["*".to_string()]),
            default_criteria: Criteria::new(),
        }
    }

    /// Default page of 100 with all fields.
    #[must_use]
    pub fn default_params() -> Self {
        Self { default_limit: 100, ..Self::all() }
    }

    #[must_use]
    pub fn with_default_limit(mut self, limit: i64) -> Self {
        self.default_limit = limit;
        self
    }

    #[must_use]
    pub fn with_default_fields(mut self, fields: Option<Vec<String>>) -> Self {
        self.default_fields = fields;
        self
    }

    #[must_use]
    pub fn with_default_criterion(
        mut self,
        key: ParsedField,
        values: impl IntoIterator<Item = CriterionValue>,
    ) -> Self {
        self.default_criteria.insert_all(key, values);
        self
    }

    #[must_use]
    pub fn default_limit(&self) -> i64 {
        self.default_limit
    }

    #[must_use]
    pub fn default_fields(&self) -> Option<&[String]> {
        self.default_fields.as_deref()
    }

    #[must_use]
    pub fn default_criteria(&self) -> &Criteria {
        &self.default_criteria
    }
}
