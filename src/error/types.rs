use serde_json::{Map, Value};
use thiserror::Error;

/// Unified result type for the navigation engine.
pub type Result<T> = std::result::Result<T, NavigationError>;

/// Errors surfaced by the navigation engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavigationError {
    /// No route definition exists for `path`; `path` is the prefix reached so far,
    /// ending with the first segment that failed to resolve.
    #[error("no route defined for `/{}`", path.join("/"))]
    NotFound { path: Vec<String> },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Desynchronized state or definition; never recovered.
    #[error("internal navigation error: {0}")]
    Internal(String),
    #[error("invalid route tree: {0}")]
    InvalidRouteTree(String),
}

impl NavigationError {
    pub fn not_found(path: &[String]) -> Self {
        Self::NotFound {
            path: path.to_vec(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Short stable label used in logs and audit records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Validation(_) => "validation",
            Self::Internal(_) => "internal",
            Self::InvalidRouteTree(_) => "invalid_route_tree",
        }
    }
}

/// Params rejected by a level's schema.
///
/// `accumulated` holds whatever was merged from shallower levels before the
/// failure so a not-found or error view can still render something useful.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid params for `/{}`: {reason}", path.join("/"))]
pub struct ValidationError {
    pub path: Vec<String>,
    pub accumulated: Map<String, Value>,
    pub reason: String,
}

impl ValidationError {
    pub fn new(path: &[String], accumulated: Map<String, Value>, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_vec(),
            accumulated,
            reason: reason.into(),
        }
    }
}
