//! Unified error type for the Wayfarer engine.

use wayfarer_protocol::ProtocolError;
use wayfarer_room::{PersistError, RoomError};

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `wayfarer` facade, you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum WayfarerError {
    /// Encoding a reply failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A routing or lifecycle error (full, not found, not a member).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The save directory could not be prepared.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_protocol::{PlayerId, RoomId};

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let wayfarer_err: WayfarerError = err.into();
        assert!(matches!(wayfarer_err, WayfarerError::Protocol(_)));
        assert!(wayfarer_err.to_string().contains("bad"));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotInRoom(PlayerId(3), RoomId::from("cave"));
        let wayfarer_err: WayfarerError = err.into();
        assert!(matches!(wayfarer_err, WayfarerError::Room(_)));
        assert!(wayfarer_err.to_string().contains("cave"));
    }

    #[test]
    fn test_from_persist_error() {
        let err = PersistError::InvalidName("../etc".into());
        let wayfarer_err: WayfarerError = err.into();
        assert!(matches!(wayfarer_err, WayfarerError::Persist(_)));
    }
}
