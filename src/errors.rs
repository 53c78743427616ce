use serde::Serialize;
use thiserror::Error;

/// Error taxonomy exposed to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Unique constraint violated on a write path.
    DuplicateKey,
    /// Entity provided is not valid.
    EntityError,
    /// Unknown or implementation error.
    GeneralError,
    /// Params supplied by the caller are invalid.
    ParamsError,
    /// Query is structurally invalid or unsafe.
    QueryError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::DuplicateKey => "DUPLICATE_KEY",
            Self::EntityError => "ENTITY_ERROR",
            Self::GeneralError => "GENERAL_ERROR",
            Self::ParamsError => "PARAMS_ERROR",
            Self::QueryError => "QUERY_ERROR",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum DslError {
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Entity error: {0}")]
    Entity(String),

    #[error("{0}")]
    General(String),

    #[error("Params error: {0}")]
    Params(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Collection not found: {0}")]
    NoSuchCollection(String),

    #[error("BSON: {0}")]
    Bson(#[from] bson::error::Error),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DslError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateKey(_) => ErrorKind::DuplicateKey,
            Self::Entity(_) => ErrorKind::EntityError,
            Self::Params(_) => ErrorKind::ParamsError,
            Self::Query(_) => ErrorKind::QueryError,
            Self::General(_)
            | Self::NoSuchCollection(_)
            | Self::Bson(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Io(_) => ErrorKind::GeneralError,
        }
    }

    pub fn params(msg: impl Into<String>) -> Self {
        Self::Params(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    pub fn entity(msg: impl Into<String>) -> Self {
        Self::Entity(msg.into())
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::General(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, DslError>;
