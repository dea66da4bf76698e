//! services/api/src/error.rs
//!
//! Errors that can stop the API server from starting or serving. Request-level
//! failures never reach here; handlers turn them into status codes.

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Connecting to Postgres or applying the bundled migrations failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("CORS_ORIGIN '{origin}' is not a valid header value: {reason}")]
    InvalidCorsOrigin { origin: String, reason: String },

    /// Binding the listener or serving connections failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
