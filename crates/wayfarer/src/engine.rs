//! `Engine` builder and the command entry points.
//!
//! This is the entry point for embedding Wayfarer. It ties together the
//! layers: bytes ← protocol ← room manager ← room actors. Whatever
//! transport sits in front (a socket server, a console) only has to turn
//! its input into `(player, verb, param)` and relay the bytes back.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use wayfarer_protocol::{Codec, JsonCodec, PlayerId, Reply, Request, RoomId};
use wayfarer_room::{
    Departure, PersistError, RoomConfig, RoomError, RoomInfo, RoomManager, RoomStore, Verb,
    WorldSource,
};

use crate::WayfarerError;

/// Save directory used when none is configured.
pub const DEFAULT_SAVE_DIR: &str = "save";

/// Builder for configuring and starting an engine.
///
/// # Example
///
/// ```rust,ignore
/// use wayfarer::prelude::*;
///
/// let engine = Engine::builder()
///     .save_dir("save")
///     .build(my_world)?;
/// let player = engine.connect("alice", "Alice").await?;
/// let bytes = engine.submit_raw(player, "look", "").await?;
/// ```
pub struct EngineBuilder {
    save_dir: PathBuf,
    room_config: RoomConfig,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            save_dir: PathBuf::from(DEFAULT_SAVE_DIR),
            room_config: RoomConfig::default(),
        }
    }

    /// Sets the directory rooms and players are saved under.
    pub fn save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = dir.into();
        self
    }

    /// Sets the configuration every room is started with.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Builds the engine. `world` builds the location graph of rooms that
    /// have no save yet.
    ///
    /// Creates the save directory if it is missing.
    pub fn build(self, world: impl WorldSource) -> Result<Engine, WayfarerError> {
        std::fs::create_dir_all(&self.save_dir).map_err(PersistError::from)?;
        tracing::info!(save_dir = %self.save_dir.display(), "engine ready");

        let store = RoomStore::new(self.save_dir);
        Ok(Engine {
            rooms: Arc::new(RoomManager::new(self.room_config, store, world)),
            codec: JsonCodec,
            next_player: Arc::new(AtomicU64::new(1)),
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running engine. Cheap to clone; clones share the same rooms.
#[derive(Clone)]
pub struct Engine {
    rooms: Arc<RoomManager>,
    codec: JsonCodec,
    next_player: Arc<AtomicU64>,
}

impl Engine {
    /// Creates a new builder.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// The room manager behind this engine.
    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    /// Allocates a session id for `username`, loads their save and puts
    /// them in the first room with space.
    pub async fn connect(&self, username: &str, name: &str) -> Result<PlayerId, WayfarerError> {
        let player_id = self.allocate();
        let player = self.rooms.load_player(player_id, username, name);
        let room_id = self.rooms.join_or_create(player).await?;
        tracing::info!(%player_id, username, %room_id, "player connected");
        Ok(player_id)
    }

    /// Like [`connect`](Self::connect), but into a named room.
    pub async fn connect_to(
        &self,
        room_id: RoomId,
        username: &str,
        name: &str,
    ) -> Result<PlayerId, WayfarerError> {
        let player_id = self.allocate();
        let player = self.rooms.load_player(player_id, username, name);
        self.rooms.join(room_id.clone(), player).await?;
        tracing::info!(%player_id, username, %room_id, "player connected");
        Ok(player_id)
    }

    /// Takes a player out of their room. The room saves them.
    pub async fn disconnect(&self, player_id: PlayerId) -> Result<Departure, WayfarerError> {
        let departure = self.rooms.leave(player_id).await?;
        tracing::info!(%player_id, "player disconnected");
        Ok(departure)
    }

    /// Runs one command for `player_id` in their room.
    pub async fn submit(
        &self,
        player_id: PlayerId,
        verb: &str,
        param: &str,
    ) -> Result<Reply, WayfarerError> {
        Ok(self.rooms.submit(player_id, Verb::from(verb), param).await?)
    }

    /// Runs one command and encodes the reply for the wire.
    pub async fn submit_raw(
        &self,
        player_id: PlayerId,
        verb: &str,
        param: &str,
    ) -> Result<Vec<u8>, WayfarerError> {
        let reply = self.submit(player_id, verb, param).await?;
        Ok(self.codec.encode(&reply)?)
    }

    /// Decodes a JSON [`Request`] (`{"verb": .., "param": ..}`), runs it,
    /// and encodes the reply. This is what a transport calls per frame.
    pub async fn handle(&self, player_id: PlayerId, data: &[u8]) -> Result<Vec<u8>, WayfarerError> {
        let request: Request = self.codec.decode(data)?;
        self.submit_raw(player_id, &request.verb, &request.param).await
    }

    /// Returns info about the room `player_id` is in.
    pub async fn room_of(&self, player_id: PlayerId) -> Result<RoomInfo, WayfarerError> {
        let room_id = self.rooms.player_room(player_id).await.ok_or_else(|| {
            RoomError::InvalidState(format!("player {player_id} is not in any room"))
        })?;
        Ok(self.rooms.room_info(&room_id).await?)
    }

    /// Saves and stops every room.
    pub async fn shutdown(&self) {
        self.rooms.shutdown().await;
    }

    fn allocate(&self) -> PlayerId {
        PlayerId(self.next_player.fetch_add(1, Ordering::Relaxed))
    }
}
