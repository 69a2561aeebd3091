//! Room configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings shared by every room a manager spawns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Maximum players allowed in the room.
    pub max_players: usize,

    /// How long a travel vote stays open after the first `go`.
    pub vote_timeout: Duration,

    /// Capacity of each room's command mailbox. Submitters wait while
    /// it is full.
    pub mailbox_size: usize,

    /// Seed for breaking vote ties. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: 8,
            vote_timeout: Duration::from_secs(10),
            mailbox_size: 64,
            rng_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.max_players, 8);
        assert_eq!(config.vote_timeout, Duration::from_secs(10));
        assert_eq!(config.mailbox_size, 64);
        assert!(config.rng_seed.is_none());
    }

    #[test]
    fn test_room_config_deserializes() {
        let json = r#"{
            "max_players": 2,
            "vote_timeout": { "secs": 3, "nanos": 0 },
            "mailbox_size": 4,
            "rng_seed": 11
        }"#;
        let config: RoomConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_players, 2);
        assert_eq!(config.vote_timeout, Duration::from_secs(3));
        assert_eq!(config.rng_seed, Some(11));
    }
}
