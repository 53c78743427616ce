use serde::Serialize;

use super::query::ServiceQuery;

/// Debug view of a query: what would run and whether an index backs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceQueryInfo {
    query: ServiceQuery,
    url_part: String,
    safe_query: bool,
}

impl ServiceQueryInfo {
    #[must_use]
    pub fn new(query: ServiceQuery, safe_query: bool) -> Self {
        Self { url_part: query.to_url_part().to_string(), query, safe_query }
    }

    #[must_use]
    pub fn query(&self) -> &ServiceQuery {
        &self.query
    }

    #[must_use]
    pub fn url_part(&self) -> &str {
        &self.url_part
    }

    #[must_use]
    pub fn is_safe_query(&self) -> bool {
        self.safe_query
    }
}
