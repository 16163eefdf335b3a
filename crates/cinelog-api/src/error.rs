use thiserror::Error;

/// Failure modes of the catalog API, as seen by the state core
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Not found")]
    NotFound,
    #[error("Session expired or missing, please log in")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error("Network error: {0}")]
    Network(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Map a non-success HTTP status plus the server's `message` field to an error
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            401 | 403 => ApiError::Unauthorized,
            404 => ApiError::NotFound,
            400 | 409 | 422 => ApiError::Validation(
                message.unwrap_or_else(|| format!("Request rejected ({})", status)),
            ),
            _ => ApiError::Network(match message {
                Some(message) => format!("{} - {}", status, message),
                None => format!("Unexpected status {}", status),
            }),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return ApiError::from_status(status.as_u16(), None);
        }
        if e.is_decode() {
            return ApiError::Network(format!("Invalid response body: {}", e));
        }
        ApiError::Network(e.to_string())
    }
}
