//! DAO configuration loaded from TOML.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::dsl::{CriterionValue, ParsedField, ServiceQueryParams};
use crate::entity::Entity;
use crate::errors::Result;
use crate::schema::{DocumentFieldMapper, EntityDescriptor, EntityFieldMapper, descriptor_of, resolve_field_path};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "RESTDSL_CONFIG";
const DEFAULT_FILE: &str = "restdsl.toml";

/// ```toml
/// allow_group_by = true
/// default_limit = 50
/// default_fields = ["*", "-secret"]
/// slow_query_ms = 200
///
/// [default_criteria]
/// deleted = ["false"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaoConfig {
    pub allow_group_by: bool,
    pub default_limit: Option<i64>,
    pub default_fields: Option<Vec<String>>,
    /// Criteria key (`field` or `field__op`) → raw values.
    pub default_criteria: BTreeMap<String, Vec<String>>,
    /// Timings at or above this are logged as slow; enables the log reporter.
    pub slow_query_ms: Option<u64>,
}

impl DaoConfig {
    /// # Errors
    /// GENERAL_ERROR for malformed TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// # Errors
    /// GENERAL_ERROR when the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// First existing file of: `explicit`, `$RESTDSL_CONFIG`, `./restdsl.toml`;
    /// defaults when none exists.
    ///
    /// # Errors
    /// GENERAL_ERROR when the chosen file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(p) = explicit {
            candidates.push(p.to_path_buf());
        }
        if let Ok(p) = std::env::var(CONFIG_ENV) {
            candidates.push(PathBuf::from(p));
        }
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(DEFAULT_FILE));
        }
        match candidates.into_iter().find(|p| p.exists()) {
            Some(path) => {
                log::info!("loading dao config from {}", path.display());
                Self::from_path(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Query defaults with raw default criteria coerced against `root`.
    ///
    /// # Errors
    /// PARAMS_ERROR for malformed keys, unknown fields or unconvertible values.
    pub fn query_params(
        &self,
        mapper: &dyn EntityFieldMapper,
        root: &Arc<EntityDescriptor>,
    ) -> Result<ServiceQueryParams> {
        let mut params = ServiceQueryParams::default_params();
        if let Some(limit) = self.default_limit {
            params = params.with_default_limit(limit);
        }
        if let Some(fields) = &self.default_fields {
            params = params.with_default_fields(Some(fields.clone()));
        }
        for (key, raw) in &self.default_criteria {
            let parsed = ParsedField::parse(key)?;
            let leaf = resolve_field_path(mapper, root, parsed.field())?.leaf;
            let values = raw
                .iter()
                .map(|v| CriterionValue::parse(v, &leaf))
                .collect::<Result<Vec<_>>>()?;
            params = params.with_default_criterion(parsed, values);
        }
        Ok(params)
    }

    /// [`query_params`](Self::query_params) for `E` with the document-store mapper.
    ///
    /// # Errors
    /// See [`query_params`](Self::query_params).
    pub fn query_params_for<E: Entity>(&self) -> Result<ServiceQueryParams> {
        self.query_params(&DocumentFieldMapper, &descriptor_of::<E>())
    }
}
