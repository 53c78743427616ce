use bson::Bson;
use std::fmt;

use crate::errors::Result;
use crate::schema::{FieldType, coerce_literal, render_literal};

/// Sentinel tokens accepted wherever a literal value is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservedValue {
    Null,
    Any,
    Exists,
}

impl ReservedValue {
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Null => "$null",
            Self::Any => "$any",
            Self::Exists => "$exists",
        }
    }

    #[must_use]
    pub fn from_token(raw: &str) -> Option<Self> {
        match raw {
            "$null" => Some(Self::Null),
            "$any" => Some(Self::Any),
            "$exists" => Some(Self::Exists),
            _ => None,
        }
    }
}

/// One value of a criteria field: a typed literal or a sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum CriterionValue {
    Literal(Bson),
    /// Field equals null (or is missing).
    IsNull,
    /// Field is present.
    Exists,
    /// No constraint; overrides a default criterion.
    Any,
}

impl CriterionValue {
    /// Parse `raw` as a sentinel token, or else coerce it to `ty`.
    ///
    /// # Errors
    /// PARAMS_ERROR when the literal cannot be coerced.
    pub fn parse(raw: &str, ty: &FieldType) -> Result<Self> {
        match ReservedValue::from_token(raw) {
            Some(r) => Ok(r.into()),
            None => coerce_literal(raw, ty).map(Self::Literal),
        }
    }

    #[must_use]
    pub fn reserved(&self) -> Option<ReservedValue> {
        match self {
            Self::Literal(_) => None,
            Self::IsNull => Some(ReservedValue::Null),
            Self::Exists => Some(ReservedValue::Exists),
            Self::Any => Some(ReservedValue::Any),
        }
    }

    #[must_use]
    pub fn as_literal(&self) -> Option<&Bson> {
        match self {
            Self::Literal(v) => Some(v),
            _ => None,
        }
    }

    /// Canonical text form, parseable back with [`CriterionValue::parse`].
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Literal(v) => render_literal(v),
            other => other.reserved().map(ReservedValue::token).unwrap_or_default().to_string(),
        }
    }
}

impl fmt::Display for CriterionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<ReservedValue> for CriterionValue {
    fn from(r: ReservedValue) -> Self {
        match r {
            ReservedValue::Null => Self::IsNull,
            ReservedValue::Any => Self::Any,
            ReservedValue::Exists => Self::Exists,
        }
    }
}

impl From<Bson> for CriterionValue {
    fn from(v: Bson) -> Self {
        Self::Literal(v)
    }
}

impl From<i64> for CriterionValue {
    fn from(v: i64) -> Self {
        Self::Literal(Bson::Int64(v))
    }
}

impl From<i32> for CriterionValue {
    fn from(v: i32) -> Self {
        Self::Literal(Bson::Int32(v))
    }
}

impl From<f64> for CriterionValue {
    fn from(v: f64) -> Self {
        Self::Literal(Bson::Double(v))
    }
}

impl From<bool> for CriterionValue {
    fn from(v: bool) -> Self {
        Self::Literal(Bson::Boolean(v))
    }
}

impl From<&str> for CriterionValue {
    fn from(v: &str) -> Self {
        Self::Literal(Bson::String(v.to_string()))
    }
}

impl From<String> for CriterionValue {
    fn from(v: String) -> Self {
        Self::Literal(Bson::String(v))
    }
}
