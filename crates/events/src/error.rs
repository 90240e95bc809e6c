//! Error type for the notification runtime.

use chapel_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote endpoint returned a non-2xx status code.
    #[error("Endpoint returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_http_status() {
        assert_eq!(NotifyError::HttpStatus(502).to_string(), "Endpoint returned HTTP 502");
    }

    #[test]
    fn core_errors_pass_through() {
        let err: NotifyError = CoreError::Validation("max_per_day".into()).into();
        assert_eq!(err.to_string(), "Validation failed: max_per_day");
    }
}
