//! Error types for the room layer.
//!
//! None of these reach a player as a reply: game-level failures are
//! silent no-ops. They describe routing and persistence problems seen by
//! the caller that owns the rooms.

use wayfarer_protocol::{PlayerId, RoomId};
use wayfarer_world::WorldError;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room has no free player slot.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The player is already in this room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// The player is not in this room.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomId),

    /// The operation does not fit the current routing state, e.g. a
    /// player who is in no room submitting a command.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// The room's actor has stopped.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}

/// Errors reading or writing save files.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// No save file exists under that name.
    #[error("no saved {kind} named {name:?}")]
    NotFound { kind: &'static str, name: String },

    /// The name cannot be used as a file stem.
    #[error("invalid save name {0:?}")]
    InvalidName(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed save file: {0}")]
    Serde(#[from] serde_json::Error),

    /// The file parsed but describes an inconsistent world.
    #[error("corrupt saved room: {0}")]
    Corrupt(#[from] WorldError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_error_messages() {
        let room = RoomId::from("game_1");
        assert_eq!(RoomError::NotFound(room.clone()).to_string(), "room game_1 not found");
        assert_eq!(
            RoomError::AlreadyInRoom(PlayerId(3), room).to_string(),
            "player P-3 already in room game_1"
        );
    }

    #[test]
    fn test_persist_error_from_io() {
        let err: PersistError = std::io::Error::other("disk on fire").into();
        assert!(matches!(err, PersistError::Io(_)));
        assert!(err.to_string().contains("disk on fire"));
    }
}
