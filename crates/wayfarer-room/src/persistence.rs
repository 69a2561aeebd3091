//! Save files for rooms and players.
//!
//! Layout under the store root:
//!
//! ```text
//! rooms/<room id>.json
//! players/<username>.json
//! ```
//!
//! Writes run inline on the caller's task (for rooms, the room actor), so
//! a slow disk stalls only that room.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wayfarer_protocol::RoomId;
use wayfarer_world::{LocationGraph, Player};

use crate::PersistError;

const ROOMS_DIR: &str = "rooms";
const PLAYERS_DIR: &str = "players";

/// Persisted form of a room.
///
/// Only the world and the message counter survive a restart. Players,
/// history entries, vote and combat state are runtime-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRoom {
    pub id: RoomId,
    pub location: LocationGraph,
    pub message_count: u64,
}

impl SavedRoom {
    /// A room that has never been played: the start is current and
    /// visited, and no messages exist.
    pub fn fresh(id: RoomId, mut location: LocationGraph) -> Self {
        location.begin();
        Self {
            id,
            location,
            message_count: 0,
        }
    }
}

/// Borrowing twin of [`SavedRoom`] so a live room can be written without
/// cloning its graph.
#[derive(Serialize)]
struct SavedRoomRef<'a> {
    id: &'a RoomId,
    location: &'a LocationGraph,
    message_count: u64,
}

/// JSON files under one root directory.
#[derive(Debug, Clone)]
pub struct RoomStore {
    root: PathBuf,
}

impl RoomStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads and validates a saved room.
    pub fn load_room(&self, id: &RoomId) -> Result<SavedRoom, PersistError> {
        let path = self.path(ROOMS_DIR, id.as_str())?;
        let data = read(&path, "room", id.as_str())?;
        let saved: SavedRoom = serde_json::from_slice(&data)?;
        saved.location.validate()?;
        Ok(saved)
    }

    pub fn save_room(
        &self,
        id: &RoomId,
        location: &LocationGraph,
        message_count: u64,
    ) -> Result<(), PersistError> {
        let path = self.path(ROOMS_DIR, id.as_str())?;
        write(
            &path,
            &SavedRoomRef {
                id,
                location,
                message_count,
            },
        )
    }

    pub fn load_player(&self, username: &str) -> Result<Player, PersistError> {
        let path = self.path(PLAYERS_DIR, username)?;
        let data = read(&path, "player", username)?;
        let mut player: Player = serde_json::from_slice(&data)?;
        player.prepare();
        Ok(player)
    }

    pub fn save_player(&self, player: &Player) -> Result<(), PersistError> {
        let path = self.path(PLAYERS_DIR, &player.username)?;
        write(&path, player)
    }

    fn path(&self, dir: &str, name: &str) -> Result<PathBuf, PersistError> {
        let bad = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\'])
            || name.contains('\0');
        if bad {
            return Err(PersistError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(dir).join(format!("{name}.json")))
    }
}

fn read(path: &Path, kind: &'static str, name: &str) -> Result<Vec<u8>, PersistError> {
    fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => PersistError::NotFound {
            kind,
            name: name.to_string(),
        },
        _ => PersistError::Io(err),
    })
}

/// Writes to a sibling temp file first so a crash never leaves half a
/// save behind.
fn write<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_protocol::PlayerId;
    use wayfarer_world::{Item, ItemKind, Location, LocationId};

    fn temp_store(tag: &str) -> RoomStore {
        let dir = std::env::temp_dir().join(format!(
            "wayfarer-persist-{tag}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        RoomStore::new(dir)
    }

    fn graph() -> LocationGraph {
        let mut graph = LocationGraph::new(Location::new("gate", "Gate", "the gate"));
        let yard = graph.add(Location::new("yard", "Yard", "the yard"));
        graph.connect_both(graph.start(), "in", yard, "out");
        graph
    }

    #[test]
    fn test_room_round_trip_keeps_current() {
        let store = temp_store("room");
        let mut saved = SavedRoom::fresh(RoomId::from("r1"), graph());
        saved.location.get_mut(LocationId(0)).unwrap().current = false;
        saved.location.get_mut(LocationId(1)).unwrap().current = true;
        saved.message_count = 17;

        store
            .save_room(&saved.id, &saved.location, saved.message_count)
            .unwrap();
        let mut loaded = store.load_room(&saved.id).unwrap();

        assert_eq!(loaded.id, saved.id);
        assert_eq!(loaded.message_count, 17);
        assert_eq!(loaded.location.start(), saved.location.start());
        assert_eq!(loaded.location.prepare(), LocationId(1));
    }

    #[test]
    fn test_missing_room_is_not_found() {
        let store = temp_store("missing");
        let err = store.load_room(&RoomId::from("nope")).unwrap_err();
        assert!(matches!(err, PersistError::NotFound { kind: "room", .. }));
    }

    #[test]
    fn test_garbage_room_is_malformed() {
        let store = temp_store("garbage");
        let dir = store.root().join(ROOMS_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("junk.json"), b"{ not json").unwrap();
        let err = store.load_room(&RoomId::from("junk")).unwrap_err();
        assert!(matches!(err, PersistError::Serde(_)));
    }

    #[test]
    fn test_dangling_exit_is_corrupt() {
        let store = temp_store("dangling");
        let mut broken = graph();
        broken.connect(LocationId(0), "void", LocationId(9));
        store.save_room(&RoomId::from("bad"), &broken, 0).unwrap();
        let err = store.load_room(&RoomId::from("bad")).unwrap_err();
        assert!(matches!(err, PersistError::Corrupt(_)));
    }

    #[test]
    fn test_path_traversal_is_rejected() {
        let store = temp_store("names");
        for name in ["", "..", "../etc", "a/b", "a\\b"] {
            assert!(matches!(
                store.load_room(&RoomId::from(name)),
                Err(PersistError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn test_player_round_trip() {
        let store = temp_store("player");
        let mut player = Player::new(PlayerId(4), "carol", "Carol");
        player.give(Item::new("torch", "Torch", ItemKind::Misc));
        player.health = 42.0;
        store.save_player(&player).unwrap();

        let loaded = store.load_player("carol").unwrap();
        assert_eq!(loaded.username, "carol");
        assert_eq!(loaded.health, 42.0);
        assert!(loaded.owns("torch"));
    }
}
