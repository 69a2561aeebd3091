//! Identity and visibility types shared by every Wayfarer layer.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a connected player.
///
/// Newtype wrapper around `u64` so a `PlayerId` can't be confused with a
/// [`Guid`] even though both are integers underneath. Serialized as the
/// bare number (`#[serde(transparent)]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A room's identifier.
///
/// Rooms are named (`"game_1"`, `"tavern"`), and the name doubles as the
/// stem of the room's save file, so this wraps a `String` rather than a
/// number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Borrows the raw name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Counter backing [`Guid::next`].
static NEXT_GUID: AtomicU64 = AtomicU64::new(1);

/// A globally unique handle for a concrete entity (player, NPC, item).
///
/// Content identifiers like `"goblin"` are shared by every goblin; the
/// guid tells two goblins apart. Guids are persisted with their entity,
/// so [`Guid::reserve`] lets loaders push the allocator past anything
/// read from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(pub u64);

impl Guid {
    /// Allocates a fresh guid.
    pub fn next() -> Self {
        Self(NEXT_GUID.fetch_add(1, Ordering::Relaxed))
    }

    /// Ensures future [`Guid::next`] calls never return `seen` or anything
    /// below it.
    pub fn reserve(seen: Guid) {
        NEXT_GUID.fetch_max(seen.0 + 1, Ordering::Relaxed);
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient: who may see a message?
// ---------------------------------------------------------------------------

/// The visibility mode of a history message.
///
/// Exactly one mode applies to each message:
/// everyone, everyone but one player, or a single player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Recipient {
    /// Visible to every player in the room.
    #[default]
    All,

    /// Visible to one specific player only.
    Player(PlayerId),

    /// Visible to everyone EXCEPT the specified player.
    /// Used for "X did something" notices the actor already got a
    /// first-person version of.
    AllExcept(PlayerId),
}

impl Recipient {
    /// Returns `true` if `player` may see a message with this visibility.
    pub fn is_visible_to(&self, player: PlayerId) -> bool {
        match *self {
            Self::All => true,
            Self::Player(only) => only == player,
            Self::AllExcept(ignored) => ignored != player,
        }
    }
}
