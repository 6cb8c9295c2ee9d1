use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::Id;

/// Result alias used throughout hydration, caching and writing.
pub type HydrateResult<T> = Result<T, HydrateError>;

/// Generic data-access fault raised by a [`crate::Database`] or [`crate::Row`]
/// implementation. Never recovered by this crate.
///
/// Cheap to clone so that a single failed fetch can be reported to every
/// caller waiting on the same cache entry.
#[derive(Clone)]
pub struct DatabaseError {
    message: String,
    source: Option<Arc<dyn StdError + Send + Sync>>,
}

impl DatabaseError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Debug for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseError")
            .field("message", &self.message)
            .field("source", &self.source.as_ref().map(ToString::to_string))
            .finish()
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {source}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl StdError for DatabaseError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// Failure taxonomy for hydration.
///
/// The variants are handled at different levels: `AccessDenied` is row-fatal
/// and absorbed only by [`crate::Parser::parse`]; `Malformed` and
/// `MissingReference` are absorbed by [`crate::Parser::hydrate`] for the
/// entity whose data failed; `Storage` and `Precondition` always surface.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HydrateError {
    #[error("access denied to {kind} {id}")]
    AccessDenied { kind: &'static str, id: Id },

    #[error("malformed {kind}: column '{column}' holds unrecognized value '{value}'")]
    Malformed {
        kind: &'static str,
        column: &'static str,
        value: String,
    },

    #[error("{kind} requires a '{column}' reference that could not be resolved")]
    MissingReference {
        kind: &'static str,
        column: &'static str,
    },

    #[error("cannot write {kind}: {reason}")]
    Precondition { kind: &'static str, reason: String },

    #[error(transparent)]
    Storage(#[from] DatabaseError),
}

impl HydrateError {
    #[must_use]
    pub fn malformed(kind: &'static str, column: &'static str, value: impl fmt::Display) -> Self {
        Self::Malformed {
            kind,
            column,
            value: value.to_string(),
        }
    }

    /// `true` for errors caused by the data of one entity rather than by the
    /// caller or the storage layer.
    #[must_use]
    pub fn is_data_integrity(&self) -> bool {
        matches!(self, Self::Malformed { .. } | Self::MissingReference { .. })
    }

    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }
}
