/// CatalogError is the shared error taxonomy returned by every store, index,
/// and orchestration crate in the workspace. It lets the coordinator
/// pattern-match on failure class without caring which subsystem raised it.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("downstream store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to publish event: {0}")]
    PublishError(String),
    #[error("failed to consume event: {0}")]
    ConsumeError(String),
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl CatalogError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        CatalogError::Invalid(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        CatalogError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        CatalogError::Conflict(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        CatalogError::Unavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        CatalogError::Internal(msg.into())
    }

    /// True for failure classes an eventually-consistent caller may retry
    /// as-is (no state was changed on the server side).
    pub fn is_retryable(&self) -> bool {
        matches!(self, CatalogError::Unavailable(_) | CatalogError::PublishError(_))
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
