//! Request-level entry points: raw path segments and query strings in,
//! entities and results out.

use bson::Bson;
use std::sync::Arc;

use crate::dsl::{
    QueryParams, ServiceQuery, ServiceQueryInfo, ServiceQueryParams, parse_request, patch_context,
};
use crate::entity::{Entity, from_document, to_document};
use crate::errors::{DslError, Result};
use crate::logger::AUDIT_TARGET;
use crate::model::ServiceModel;
use crate::preconditions::check_not_null;
use crate::results::EntityResult;
use crate::schema::coerce_literal;

/// Extra entity checks run before creates and patches.
pub trait EntityValidator<E>: Send + Sync {
    /// # Errors
    /// Rejects the create.
    fn validate_post(&self, _entity: &E) -> Result<()> {
        Ok(())
    }

    /// # Errors
    /// Rejects the patch.
    fn validate_patch(&self, _entity: &E) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpValidator;

impl<E> EntityValidator<E> for NoOpValidator {}

pub struct ServiceResource<E> {
    model: ServiceModel<E>,
    params: ServiceQueryParams,
    validator: Arc<dyn EntityValidator<E>>,
}

impl<E: Entity> ServiceResource<E> {
    #[must_use]
    pub fn new(model: ServiceModel<E>) -> Self {
        Self { model, params: ServiceQueryParams::default_params(), validator: Arc::new(NoOpValidator) }
    }

    #[must_use]
    pub fn with_query_params(mut self, params: ServiceQueryParams) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn EntityValidator<E>>) -> Self {
        self.validator = validator;
        self
    }

    #[must_use]
    pub fn model(&self) -> &ServiceModel<E> {
        &self.model
    }

    #[must_use]
    pub fn query_params(&self) -> &ServiceQueryParams {
        &self.params
    }

    /// Parse `segment` and `query` under this resource's defaults.
    ///
    /// # Errors
    /// PARAMS_ERROR or QUERY_ERROR from request parsing.
    pub fn parse(&self, segment: &str, query: &str) -> Result<ServiceQuery> {
        parse_request(
            self.model.field_mapper(),
            self.model.descriptor(),
            segment,
            &QueryParams::parse(query),
            &self.params,
        )
    }

    /// # Errors
    /// Parsing, validation and storage failures.
    pub fn get(&self, segment: &str, query: &str) -> Result<EntityResult<E>> {
        let parsed = self.parse(segment, query)?;
        log::debug!("GET {parsed}");
        self.model.get(&parsed)
    }

    /// The parsed query, its canonical url and whether it is index-backed.
    ///
    /// # Errors
    /// Parsing failures.
    pub fn info(&self, segment: &str, query: &str) -> Result<ServiceQueryInfo> {
        Ok(self.model.describe(&self.parse(segment, query)?))
    }

    /// # Errors
    /// Validator rejections and storage failures.
    pub fn create(&self, entity: E) -> Result<E> {
        self.validator.validate_post(&entity)?;
        self.model.save(entity)
    }

    /// Replace the entity stored under `id_segment`. The body's id, when
    /// present, must equal it.
    ///
    /// # Errors
    /// PARAMS_ERROR for an empty or unconvertible id; ENTITY_ERROR when ids
    /// disagree; storage failures.
    pub fn update(&self, id_segment: &str, entity: E) -> Result<E> {
        let mapper = self.model.field_mapper();
        let root = self.model.descriptor();
        let id_type = mapper.id_field_type(root)?;
        let key = check_not_null(
            "Key cannot be null",
            Some(id_segment).filter(|s| !s.is_empty()),
        )?;
        let key = coerce_literal(key, &id_type)?;

        let mut doc = to_document(&entity)?;
        if let Some(current) = mapper.id_value(root, &doc)?
            && current != key
        {
            return Err(DslError::entity(format!(
                "Id either should not be provided or be equal to the one in the entity, but was: {} vs {}",
                display_id(&current),
                display_id(&key)
            )));
        }
        let id_field = mapper.id_field_name(root)?;
        doc.insert(mapper.storage_name(root, &id_field)?, key);
        self.model.save(from_document(doc)?)
    }

    /// Apply `entity` as a partial update; `query` may carry `unsetFields`.
    ///
    /// # Errors
    /// ENTITY_ERROR when `entity` has no id; see [`ServiceModel::patch`].
    pub fn patch(&self, entity: &E, query: &str) -> Result<Option<E>> {
        self.validator.validate_patch(entity)?;
        let context = patch_context(&QueryParams::parse(query));
        self.model.patch(entity, &context)
    }

    /// # Errors
    /// QUERY_ERROR when the parsed query has neither ids nor criteria.
    pub fn delete(&self, segment: &str, query: &str) -> Result<u64> {
        let parsed = self.parse(segment, query)?;
        log::info!(target: AUDIT_TARGET, "DELETE {parsed}");
        self.model.delete(&parsed)
    }
}

fn display_id(id: &Bson) -> String {
    match id {
        Bson::String(s) => s.clone(),
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}
