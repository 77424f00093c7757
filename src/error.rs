// Error types for the remote vehicle API
use thiserror::Error;

/// Classified failure of one API operation.
#[derive(Debug, Error)]
pub enum VehicleApiError {
    /// Transport-level failure (refused connection, timeout, DNS, TLS).
    #[error("error communicating with API: {0}")]
    Connection(String),

    /// Credentials are exhausted; an external re-authentication is required.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The tracked vehicle is absent from an otherwise successful response.
    #[error("vehicle {0} not found in search results")]
    NotFound(String),

    /// Successfully parsed non-2xx response outside the cases above.
    #[error("unexpected status {status}: {message}")]
    Api { status: u16, message: String },
}

impl VehicleApiError {
    /// Whether the caller may retry on its next natural interval.
    /// `AuthFailed` and `NotFound` need operator intervention first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Api { .. })
    }
}

impl From<reqwest::Error> for VehicleApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Connection(err.to_string())
    }
}
