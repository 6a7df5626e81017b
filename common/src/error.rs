use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// Timeout, connection refused, DNS failure, HTTP error status — all
    /// one kind as far as the retry loop is concerned.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// Response body was unparseable or missing the requested register.
    #[error("could not decode device response: {0}")]
    Decode(String),
}
