//! Error taxonomy shared across the arkive crates

use thiserror::Error;

pub type ArkiveResult<T> = Result<T, ArkiveError>;

/// Error kinds surfaced by the archive engine.
///
/// The authentication variant carries no detail on purpose: expired,
/// revoked, malformed and unsigned tokens all render the same message so
/// callers cannot probe token validity. Denial messages name the denied
/// action, never the ownership data behind the decision.
#[derive(Debug, Error)]
pub enum ArkiveError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("permission denied: {action}")]
    PermissionDenied { action: String },

    #[error("{entity} not found")]
    NotFound { entity: String },

    #[error("invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("dependency failure: {message}")]
    DependencyFailure {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ArkiveError {
    /// Create a permission denied error naming the attempted action.
    pub fn permission_denied<S: Into<String>>(action: S) -> Self {
        Self::PermissionDenied {
            action: action.into(),
        }
    }

    /// Create a not found error for the named entity kind.
    pub fn not_found<S: Into<String>>(entity: S) -> Self {
        Self::NotFound {
            entity: entity.into(),
        }
    }

    /// Create an invalid operation error.
    pub fn invalid_operation<S: Into<String>>(message: S) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Create a dependency failure without an underlying source.
    pub fn dependency<S: Into<String>>(message: S) -> Self {
        Self::DependencyFailure {
            message: message.into(),
            source: None,
        }
    }

    /// Create a dependency failure wrapping the underlying error.
    pub fn dependency_with<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::DependencyFailure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
