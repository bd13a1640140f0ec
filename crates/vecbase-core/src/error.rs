//! Error types for the vecbase core.
//!
//! A single [`VecbaseError`] enum covers every failure kind the engine can
//! surface. Errors propagate out of the core unchanged; nothing is retried
//! internally. A REST facade translates them to status codes via
//! [`VecbaseError::http_status`].

use thiserror::Error;
use uuid::Uuid;

/// Entity kinds referenced by [`VecbaseError::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Library,
    Document,
    Chunk,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Library => write!(f, "library"),
            EntityKind::Document => write!(f, "document"),
            EntityKind::Chunk => write!(f, "chunk"),
        }
    }
}

/// Unified error type for all core operations.
#[derive(Debug, Error)]
pub enum VecbaseError {
    /// A referenced id does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: Uuid },

    /// Request payload is structurally invalid (missing field, bad value,
    /// value out of range, NaN/Inf component).
    #[error("validation error: {0}")]
    Validation(String),

    /// Embedding length differs from the library's fixed dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Search attempted on a library with no current index, or the index was
    /// invalidated by a concurrent mutation.
    #[error("library {library_id} is not indexed")]
    NotIndexed { library_id: Uuid },

    /// Unknown value for `index_type`.
    #[error("unsupported index type: {0}")]
    UnsupportedIndexType(String),

    /// Operation rejected because a conflicting mutation is in progress.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unexpected state: invariant violation, corrupt stored vector, bug.
    /// Logged at error level before being surfaced, never swallowed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VecbaseError {
    /// HTTP status code a facade should map this error to.
    #[inline]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Validation(_) | Self::DimensionMismatch { .. } | Self::UnsupportedIndexType(_) => {
                422
            }
            Self::NotIndexed { .. } | Self::Conflict(_) => 409,
            Self::Config(_) | Self::Internal(_) => 500,
        }
    }

    /// Whether this error indicates a system health problem that should be
    /// logged at error level and investigated.
    #[inline]
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Internal(_) | Self::Config(_))
    }

    /// Convenience constructor for validation errors.
    #[inline]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Convenience constructor for internal errors.
    #[inline]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Convenience constructor for not-found errors.
    #[inline]
    pub fn not_found(entity: EntityKind, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}

impl From<config::ConfigError> for VecbaseError {
    fn from(err: config::ConfigError) -> Self {
        VecbaseError::Config(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VecbaseError>;
