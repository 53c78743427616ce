//! Text to bson coercion against declared field types, and the reverse
//! rendering used by canonical query serialization.

use bson::Bson;
use bson::oid::ObjectId;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use super::types::FieldType;
use crate::errors::{DslError, Result};

/// Non-RFC 3339 textual date layout also accepted on input.
const LEGACY_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Converts raw text into a bson value for a [`FieldType::Custom`] type.
pub trait ValueConverter: Send + Sync {
    /// # Errors
    /// A human readable reason when `raw` is not a valid value.
    fn from_text(&self, raw: &str) -> std::result::Result<Bson, String>;
}

impl<F> ValueConverter for F
where
    F: Fn(&str) -> std::result::Result<Bson, String> + Send + Sync,
{
    fn from_text(&self, raw: &str) -> std::result::Result<Bson, String> {
        self(raw)
    }
}

static CONVERTERS: LazyLock<RwLock<HashMap<String, Arc<dyn ValueConverter>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Register the converter for custom type `name`, replacing any previous one.
pub fn register_converter(name: &str, converter: Arc<dyn ValueConverter>) {
    if CONVERTERS.write().insert(name.to_string(), converter).is_some() {
        log::warn!("converter for type '{name}' was already registered; replacing it");
    }
}

#[must_use]
pub fn converter(name: &str) -> Option<Arc<dyn ValueConverter>> {
    CONVERTERS.read().get(name).cloned()
}

/// Coerce `raw` into a bson literal of type `ty` (list types coerce to their element).
///
/// # Errors
/// PARAMS_ERROR when the text does not parse or the type cannot hold a literal.
pub fn coerce_literal(raw: &str, ty: &FieldType) -> Result<Bson> {
    let fail = || DslError::params(format!("Cannot convert '{raw}' to {ty}"));
    match ty.element() {
        FieldType::String => Ok(Bson::String(raw.to_string())),
        FieldType::Long => raw.parse::<i64>().map(Bson::Int64).map_err(|_| fail()),
        FieldType::Int => raw.parse::<i32>().map(Bson::Int32).map_err(|_| fail()),
        FieldType::Double => raw.parse::<f64>().map(Bson::Double).map_err(|_| fail()),
        FieldType::Bool => Ok(Bson::Boolean(raw.eq_ignore_ascii_case("true"))),
        FieldType::Date => parse_date(raw).map(Bson::DateTime).ok_or_else(fail),
        FieldType::ObjectId => ObjectId::parse_str(raw).map(Bson::ObjectId).map_err(|_| fail()),
        FieldType::Uuid => uuid::Uuid::parse_str(raw)
            .map(|u| Bson::String(u.hyphenated().to_string()))
            .map_err(|_| fail()),
        FieldType::Enum(names) => {
            if names.iter().any(|n| n == raw) {
                Ok(Bson::String(raw.to_string()))
            } else {
                Err(DslError::params(format!(
                    "Cannot convert '{raw}' to {ty}: expected one of [{}]",
                    names.join(", ")
                )))
            }
        }
        FieldType::Custom(name) => {
            let conv = converter(name).ok_or_else(|| {
                DslError::params(format!("No converter registered for type '{name}'"))
            })?;
            conv.from_text(raw)
                .map_err(|e| DslError::params(format!("Cannot convert '{raw}' to {name}: {e}")))
        }
        other @ (FieldType::Object(_) | FieldType::List(_)) => Err(DslError::params(format!(
            "Unsupported type {other} for value '{raw}'"
        ))),
    }
}

/// Epoch millis, RFC 3339, or `yyyy-MM-dd'T'HH:mm:ss.SSSZ`.
#[must_use]
pub fn parse_date(raw: &str) -> Option<bson::DateTime> {
    if let Ok(ms) = raw.parse::<i64>() {
        return Some(bson::DateTime::from_millis(ms));
    }
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, LEGACY_DATE_FORMAT))
        .ok()
        .map(|d| bson::DateTime::from_millis(d.timestamp_millis()))
}

/// RFC 3339 in UTC with millisecond precision.
#[must_use]
pub fn format_date(value: &bson::DateTime) -> String {
    let ms = value.timestamp_millis();
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map_or_else(|| ms.to_string(), |d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Text form of a literal, parseable back by [`coerce_literal`].
#[must_use]
pub fn render_literal(value: &Bson) -> String {
    match value {
        Bson::String(s) => s.clone(),
        Bson::Int32(i) => i.to_string(),
        Bson::Int64(i) => i.to_string(),
        Bson::Double(f) => f.to_string(),
        Bson::Boolean(b) => b.to_string(),
        Bson::DateTime(d) => format_date(d),
        Bson::ObjectId(o) => o.to_hex(),
        Bson::Null => "null".to_string(),
        other => other.to_string(),
    }
}
