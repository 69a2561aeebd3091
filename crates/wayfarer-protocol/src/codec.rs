//! Turning replies into bytes and requests out of them.
//!
//! Room actors speak [`Reply`](crate::Reply) values; whatever carries
//! them to a client only sees bytes. [`Codec`] is the seam between the
//! two. [`JsonCodec`] is the only implementation, and the client-facing
//! shapes are defined in terms of its output.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes bytes back.
///
/// Shared by the engine across every connection, hence
/// `Send + Sync + 'static`.
pub trait Codec: Send + Sync + 'static {
    /// # Errors
    /// `ProtocolError::Encode` if the value cannot be serialized.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// # Errors
    /// `ProtocolError::Decode` for malformed or mismatched input.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// JSON via `serde_json`. Behind the default `json` feature.
///
/// ```rust
/// use wayfarer_protocol::{Codec, JsonCodec, Reply};
///
/// // A command that did nothing answers with JSON `null`.
/// let bytes = JsonCodec.encode(&Reply::Null).unwrap();
/// assert_eq!(bytes, b"null");
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{Reply, Request, Stats};

    #[test]
    fn test_null_reply_is_four_bytes() {
        assert_eq!(JsonCodec.encode(&Reply::Null).unwrap(), b"null");
    }

    #[test]
    fn test_stats_reply_is_bare_object() {
        let reply = Reply::Stats(Stats {
            health: 10.0,
            health_max: 20.0,
            attack: 3.0,
            defense: 1.0,
        });
        let bytes = JsonCodec.encode(&reply).unwrap();
        let value: serde_json::Value = JsonCodec.decode(&bytes).unwrap();
        assert_eq!(value["health"], 10.0);
        assert_eq!(value["health_max"], 20.0);
        assert!(value.get("Stats").is_none());
    }

    #[test]
    fn test_request_decodes_without_param() {
        let request: Request = JsonCodec.decode(br#"{"verb":"look"}"#).unwrap();
        assert_eq!(request.verb, "look");
        assert_eq!(request.param, "");
    }

    #[test]
    fn test_decode_garbage_is_error() {
        let result: Result<Stats, _> = JsonCodec.decode(b"{not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
