use thiserror::Error;

/// Failures surfaced by the API client. Cloneable so cached errors can be
/// snapshotted into query views.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// HTTP non-2xx from the list fetch or the favorite mutation.
    #[error("request failed with status {0}")]
    Status(u16),
    /// Response body was not a JSON array; signals an API contract break.
    #[error("unexpected response shape (expected a JSON array)")]
    Shape,
    /// Transport-level failure (unreachable host, TLS, timeout).
    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Network(e.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
