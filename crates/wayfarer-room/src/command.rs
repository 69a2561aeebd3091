//! Verbs a player can send to a room.

use std::fmt;

use tokio::sync::oneshot;
use wayfarer_protocol::{PlayerId, Reply};

/// Every verb a room understands. Wire strings that match none of them
/// become [`Verb::Unknown`] and get a null reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Attack,
    Defend,
    /// Reserved; always replies null.
    Ability,
    Save,
    Look,
    /// Perform a contextual action of the current location.
    Do,
    Go,
    Inventory,
    Inspect,
    Pickup,
    Drop,
    Use,
    Stats,
    Equip,
    Unknown(String),
}

impl Verb {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Attack => "attack",
            Self::Defend => "defend",
            Self::Ability => "ability",
            Self::Save => "save",
            Self::Look => "look",
            Self::Do => "do",
            Self::Go => "go",
            Self::Inventory => "inventory",
            Self::Inspect => "inspect",
            Self::Pickup => "pickup",
            Self::Drop => "drop",
            Self::Use => "use",
            Self::Stats => "stats",
            Self::Equip => "equip",
            Self::Unknown(other) => other,
        }
    }
}

impl From<&str> for Verb {
    fn from(s: &str) -> Self {
        match s {
            "attack" => Self::Attack,
            "defend" => Self::Defend,
            "ability" => Self::Ability,
            "save" => Self::Save,
            "look" => Self::Look,
            "do" => Self::Do,
            "go" => Self::Go,
            "inventory" => Self::Inventory,
            "inspect" => Self::Inspect,
            "pickup" => Self::Pickup,
            "drop" => Self::Drop,
            "use" => Self::Use,
            "stats" => Self::Stats,
            "equip" => Self::Equip,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A player's request plus the conduit its one reply goes back on.
#[derive(Debug)]
pub(crate) struct Command {
    pub(crate) player: PlayerId,
    pub(crate) verb: Verb,
    pub(crate) param: String,
    pub(crate) reply: oneshot::Sender<Reply>,
}
