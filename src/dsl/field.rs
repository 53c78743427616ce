use std::fmt;

use crate::errors::{DslError, Result};

/// Separator between a field name and an operator suffix: `rating__gte`.
pub const SUFFIX_SEPARATOR: &str = "__";

/// Comparison attached to a criteria key. Plain keys mean equality / IN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operator {
    Gt,
    Gte,
    Lt,
    Lte,
    Ne,
}

impl Operator {
    pub const ALL: [Self; 5] = [Self::Gt, Self::Gte, Self::Lt, Self::Lte, Self::Ne];

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Ne => "<>",
        }
    }

    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Ne => "ne",
        }
    }

    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// # Errors
    /// PARAMS_ERROR for anything but `gt`, `gte`, `lt`, `lte`, `ne`.
    pub fn from_suffix(suffix: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.suffix() == suffix)
            .ok_or_else(|| DslError::params(format!("Unsupported operation: {suffix}")))
    }

    /// Range operators; `<>` is a set operator.
    #[must_use]
    pub const fn is_range(self) -> bool {
        !matches!(self, Self::Ne)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A criteria key: field path plus optional operator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParsedField {
    field: String,
    op: Option<Operator>,
}

impl ParsedField {
    #[must_use]
    pub fn new(field: &str) -> Self {
        Self { field: field.to_string(), op: None }
    }

    #[must_use]
    pub fn with_op(field: &str, op: Operator) -> Self {
        Self { field: field.to_string(), op: Some(op) }
    }

    /// Parse `field`, `field__op` or `field <op>` (e.g. `rating >=`).
    ///
    /// # Errors
    /// PARAMS_ERROR for unknown operators, repeated separators or empty names.
    pub fn parse(key: &str) -> Result<Self> {
        let key = key.trim();
        if key.contains(SUFFIX_SEPARATOR) {
            let parts: Vec<&str> = key.split(SUFFIX_SEPARATOR).collect();
            if parts.len() != 2 {
                return Err(DslError::params(format!(
                    "Field '{key}' must not contain more than 1 separator"
                )));
            }
            let field = check_name(parts[0], key)?;
            return Ok(Self::with_op(field, Operator::from_suffix(parts[1])?));
        }
        match key.find(['<', '>']) {
            Some(pos) => {
                let field = check_name(&key[..pos], key)?;
                let symbol = key[pos..].trim();
                let op = Operator::from_symbol(symbol).ok_or_else(|| {
                    DslError::params(format!("Unsupported operation: {symbol}"))
                })?;
                Ok(Self::with_op(field, op))
            }
            None => Ok(Self::new(check_name(key, key)?)),
        }
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub fn op(&self) -> Option<Operator> {
        self.op
    }

    /// Canonical key text: `field` or `field__op`.
    #[must_use]
    pub fn criteria_key(&self) -> String {
        match self.op {
            Some(op) => format!("{}{SUFFIX_SEPARATOR}{}", self.field, op.suffix()),
            None => self.field.clone(),
        }
    }
}

fn check_name<'a>(name: &'a str, key: &str) -> Result<&'a str> {
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(DslError::params(format!("Invalid field name in criteria key '{key}'")));
    }
    Ok(name)
}

impl fmt::Display for ParsedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.criteria_key())
    }
}

impl From<&str> for ParsedField {
    fn from(field: &str) -> Self {
        Self::new(field)
    }
}
