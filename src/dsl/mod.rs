//! The query language: keys, values, the query model and request parsing.

pub mod criteria;
pub mod escape;
pub mod field;
pub mod info;
pub mod params;
pub mod patch;
pub mod query;
pub mod request;
pub mod value;

pub use criteria::Criteria;
pub use field::{Operator, ParsedField, SUFFIX_SEPARATOR};
pub use info::ServiceQueryInfo;
pub use params::ServiceQueryParams;
pub use patch::PatchContext;
pub use query::{MAX_LIMIT, ServiceQuery, ServiceQueryBuilder};
pub use request::{QueryParams, parse_request, parse_request_for, parse_url, patch_context};
pub use value::{CriterionValue, ReservedValue};
