use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            Error::Connection(err.to_string())
        } else if err.is_decode() || err.is_body() {
            Error::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            Error::from_status(status, &err.to_string())
        } else {
            Error::Unknown(err.to_string())
        }
    }
}

impl Error {
    /// Classify a non-success HTTP status returned by a backend.
    pub fn from_status(status: StatusCode, context: &str) -> Self {
        let message = format!(
            "HTTP {} for {}: {}",
            status.as_u16(),
            context,
            status.canonical_reason().unwrap_or("Unknown error")
        );

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthorized(message),
            StatusCode::NOT_FOUND => Error::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => Error::RateLimited(message),
            StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => Error::Connection(message),
            _ => Error::Unknown(message),
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(
            self,
            Error::Connection(_) | Error::RateLimited(_) | Error::Io(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Connection(_) => "CONNECTION_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Unauthorized(_) => "UNAUTHORIZED",
            Error::RateLimited(_) => "RATE_LIMITED",
            Error::InvalidResponse(_) => "INVALID_RESPONSE",
            Error::Config(_) => "CONFIG",
            Error::Io(_) => "IO_ERROR",
            Error::Serialization(_) => "SERIALIZATION",
            Error::Unknown(_) => "UNKNOWN",
        }
    }
}
