use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors raised by the dispatch pipeline and the sink adapter.
///
/// None of these ever reach the HTTP caller: the webhook contract always
/// answers with success before the sink write runs, so every variant here is
/// terminal for its request and surfaces only in the logs.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Sink credentials or identifier missing; raised from sink acquisition,
    /// not checked at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The named table/sheet does not exist in the backing store.
    #[error("Sink table not found: {0}")]
    SinkNotFound(String),

    /// Transient sink-write failure (network, auth, rate limit).
    #[error("Sink write failed: {0}")]
    SinkWrite(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token signing error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}
