//! restdsl: a URL query language for entity services, its translation into
//! storage predicates, and the data-access layer that executes it against an
//! embedded document store.
//!
//! ```text
//! /accounts/1,2;rating__gte=3;status=active,$null?limit=20&order=-rating
//! ```
//!
//! Requests are parsed into a [`ServiceQuery`], validated against the
//! entity's indexes, translated to a [`query::Filter`] and executed by a
//! [`DocumentServiceDao`] over any [`StorageSession`].

pub mod collection;
pub mod config;
pub mod dao;
pub mod dsl;
pub mod engine;
pub mod entity;
pub mod errors;
pub mod index;
pub mod logger;
pub mod metrics;
pub mod model;
pub mod preconditions;
pub mod query;
pub mod resource;
pub mod results;
pub mod schema;
pub mod session;
pub mod utils;

pub use config::DaoConfig;
pub use dao::{BaseServiceDao, DocumentServiceDao, EntityLifecycleListener, PersistentServiceDao, ServiceDao};
pub use dsl::{
    CriterionValue, Operator, ParsedField, ReservedValue, ServiceQuery, ServiceQueryBuilder,
    ServiceQueryInfo, ServiceQueryParams,
};
pub use engine::Engine;
pub use entity::Entity;
pub use errors::{DslError, ErrorKind, Result};
pub use model::{BaseServiceModel, ServiceModel};
pub use resource::ServiceResource;
pub use results::{EntityList, EntityMap, EntityMultimap, EntityResult};
pub use schema::{EntityDescriptor, FieldType};
pub use session::StorageSession;

/// Configure logging from `RESTDSL_LOG_*` environment variables.
///
/// # Errors
/// Fails when the log directory or appenders cannot be created.
pub fn init() -> std::result::Result<(), Box<dyn std::error::Error>> {
    logger::configure_from_env()
}
