//! Protocol errors: bytes that would not become a value, or the reverse.
//! Room state and persistence have their own error types.

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A reply could not be serialized.
    #[cfg(feature = "json")]
    #[error("could not encode reply: {0}")]
    Encode(serde_json::Error),

    /// Malformed, truncated, or wrongly shaped input.
    #[cfg(feature = "json")]
    #[error("could not decode request: {0}")]
    Decode(serde_json::Error),

    /// Well-formed input that is still not a command, e.g. a blank line.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
