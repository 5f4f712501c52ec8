use thiserror::Error;

/// Errors surfaced by backend gateways.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("request failed with status {0}")]
    Status(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("connection error: {0}")]
    Connection(String),
}

impl ApiError {
    /// True for failures worth retrying: transport errors and server-side
    /// statuses. Client-side rejections are final.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Http(_) | ApiError::Connection(_) => true,
            ApiError::Status(code) => code.is_server_error(),
            _ => false,
        }
    }
}
