//! Room manager: creates, tracks, and routes players to rooms.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use wayfarer_protocol::{PlayerId, Reply, RoomId};
use wayfarer_world::Player;

use crate::persistence::{RoomStore, SavedRoom};
use crate::room::spawn_room;
use crate::{Departure, PersistError, RoomConfig, RoomError, RoomHandle, RoomInfo, Verb, WorldSource};

/// Which rooms exist and who is in which.
#[derive(Default)]
struct Registry {
    /// Active rooms, keyed by room ID.
    rooms: HashMap<RoomId, RoomHandle>,

    /// Maps each player to the room they're currently in.
    /// A player can be in at most ONE room at a time.
    player_rooms: HashMap<PlayerId, RoomId>,
}

impl Registry {
    /// First `game_<n>` name not in use, counting from `rooms + 1`.
    fn next_auto_id(&self) -> RoomId {
        let mut n = self.rooms.len() + 1;
        loop {
            let id = RoomId(format!("game_{n}"));
            if !self.rooms.contains_key(&id) {
                return id;
            }
            n += 1;
        }
    }

    fn room_of(&self, player_id: PlayerId) -> Result<(RoomId, RoomHandle), RoomError> {
        let room_id = self.player_rooms.get(&player_id).ok_or_else(|| {
            RoomError::InvalidState(format!("player {player_id} is not in any room"))
        })?;
        let handle = self
            .rooms
            .get(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        Ok((room_id.clone(), handle.clone()))
    }

    /// Records `player_id` as a member of `room_id` before the room has
    /// answered the join, so the same player cannot join twice at once.
    fn claim(&mut self, player_id: PlayerId, room_id: &RoomId) -> Result<(), RoomError> {
        match self.player_rooms.get(&player_id) {
            Some(current) if current == room_id => {
                Err(RoomError::AlreadyInRoom(player_id, room_id.clone()))
            }
            Some(current) => Err(RoomError::InvalidState(format!(
                "player {player_id} is already in room {current}"
            ))),
            None => {
                self.player_rooms.insert(player_id, room_id.clone());
                Ok(())
            }
        }
    }

    fn unclaim(&mut self, player_id: PlayerId, room_id: &RoomId) {
        if self.player_rooms.get(&player_id) == Some(room_id) {
            self.player_rooms.remove(&player_id);
        }
    }

    /// Drops `handle`'s room unless the id already points at a newer one.
    fn forget(&mut self, handle: &RoomHandle) -> bool {
        let current = self
            .rooms
            .get(handle.room_id())
            .is_some_and(|registered| registered.is_same(handle));
        if current {
            self.rooms.remove(handle.room_id());
        }
        current
    }
}

/// Manages all active rooms and tracks which player is in which room.
///
/// This is the entry point for room operations from higher layers. It is
/// an explicit service: share it behind an `Arc` rather than reaching for
/// global state.
///
/// The registry lock is only held for lookups and bookkeeping, never
/// while a room answers, so a busy room cannot stall the others. A join
/// claims the membership up front and gives it back if the room refuses.
pub struct RoomManager {
    registry: Mutex<Registry>,
    config: RoomConfig,
    store: RoomStore,
    source: Arc<dyn WorldSource>,
}

impl RoomManager {
    /// Creates a new, empty room manager.
    pub fn new(config: RoomConfig, store: RoomStore, source: impl WorldSource) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            config,
            store,
            source: Arc::new(source),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn store(&self) -> &RoomStore {
        &self.store
    }

    /// Opens the room called `room_id`, restoring it from its save file
    /// if there is a usable one. Returns the existing room if it is
    /// already open.
    pub async fn create_room(&self, room_id: RoomId) -> RoomId {
        let mut registry = self.registry.lock().await;
        self.open(&mut registry, &room_id);
        room_id
    }

    /// Opens a room with the next free `game_<n>` name.
    pub async fn create_room_auto(&self) -> RoomId {
        let mut registry = self.registry.lock().await;
        let room_id = registry.next_auto_id();
        self.open(&mut registry, &room_id);
        room_id
    }

    fn open(&self, registry: &mut Registry, room_id: &RoomId) -> RoomHandle {
        if let Some(handle) = registry.rooms.get(room_id) {
            return handle.clone();
        }

        let saved = match self.store.load_room(room_id) {
            Ok(saved) => {
                tracing::info!(%room_id, "room restored from save");
                saved
            }
            Err(PersistError::NotFound { .. }) => {
                tracing::info!(%room_id, "room created");
                self.fresh(room_id)
            }
            Err(err) => {
                tracing::warn!(%room_id, %err, "saved room unusable, starting fresh");
                self.fresh(room_id)
            }
        };

        let handle = spawn_room(saved, self.config.clone(), self.store.clone());
        registry.rooms.insert(room_id.clone(), handle.clone());
        handle
    }

    fn fresh(&self, room_id: &RoomId) -> SavedRoom {
        let graph = self.source.build(room_id);
        if let Err(err) = graph.validate() {
            tracing::error!(%room_id, %err, "world source built an invalid graph");
        }
        SavedRoom::fresh(room_id.clone(), graph)
    }

    /// Loads a player's save, or creates a new player if there is none.
    /// The session's `player_id` always wins over the saved one.
    pub fn load_player(&self, player_id: PlayerId, username: &str, name: &str) -> Player {
        match self.store.load_player(username) {
            Ok(mut player) => {
                player.id = player_id;
                player
            }
            Err(PersistError::NotFound { .. }) => Player::new(player_id, username, name),
            Err(err) => {
                tracing::warn!(%player_id, username, %err, "player save unusable, starting fresh");
                Player::new(player_id, username, name)
            }
        }
    }

    /// Adds a player to a room, opening the room if needed.
    ///
    /// Enforces the "one room at a time" invariant.
    pub async fn join(&self, room_id: RoomId, player: Player) -> Result<(), RoomError> {
        let player_id = player.id;
        let handle = {
            let mut registry = self.registry.lock().await;
            registry.claim(player_id, &room_id)?;
            self.open(&mut registry, &room_id)
        };

        let result = match handle.join(player.clone()).await {
            // The room closed after we looked it up; its save is final.
            Err(RoomError::Unavailable(_)) => {
                let handle = {
                    let mut registry = self.registry.lock().await;
                    registry.forget(&handle);
                    self.open(&mut registry, &room_id)
                };
                handle.join(player).await
            }
            result => result,
        };
        if result.is_err() {
            self.release(player_id, &room_id).await;
        }
        result
    }

    /// Joins the first open room with a free slot, or a new one.
    pub async fn join_or_create(&self, player: Player) -> Result<RoomId, RoomError> {
        let player_id = player.id;
        let mut candidates: Vec<RoomHandle> = {
            let registry = self.registry.lock().await;
            if let Some(existing) = registry.player_rooms.get(&player_id) {
                return Err(RoomError::InvalidState(format!(
                    "player {player_id} is already in room {existing}"
                )));
            }
            registry.rooms.values().cloned().collect()
        };
        candidates.sort_by(|a, b| a.room_id().cmp(b.room_id()));

        for handle in candidates {
            let room_id = handle.room_id().clone();
            self.registry.lock().await.claim(player_id, &room_id)?;
            match handle.join(player.clone()).await {
                Ok(()) => return Ok(room_id),
                Err(RoomError::RoomFull(_)) => self.release(player_id, &room_id).await,
                Err(RoomError::Unavailable(_)) => {
                    let mut registry = self.registry.lock().await;
                    registry.forget(&handle);
                    registry.unclaim(player_id, &room_id);
                }
                Err(err) => {
                    self.release(player_id, &room_id).await;
                    return Err(err);
                }
            }
        }

        let handle = {
            let mut registry = self.registry.lock().await;
            let room_id = registry.next_auto_id();
            registry.claim(player_id, &room_id)?;
            self.open(&mut registry, &room_id)
        };
        let room_id = handle.room_id().clone();
        if let Err(err) = handle.join(player).await {
            self.release(player_id, &room_id).await;
            return Err(err);
        }
        Ok(room_id)
    }

    /// Removes a player from their current room. A room whose last
    /// player left has already saved itself; it is dropped here.
    pub async fn leave(&self, player_id: PlayerId) -> Result<Departure, RoomError> {
        let (room_id, handle) = self.registry.lock().await.room_of(player_id)?;

        let departure = handle.leave(player_id).await?;
        let mut registry = self.registry.lock().await;
        registry.unclaim(player_id, &room_id);
        if departure.remaining == 0 && registry.forget(&handle) {
            tracing::info!(%room_id, "room closed");
        }
        Ok(departure)
    }

    async fn release(&self, player_id: PlayerId, room_id: &RoomId) {
        self.registry.lock().await.unclaim(player_id, room_id);
    }

    /// Routes a verb from a player to their current room.
    pub async fn submit(
        &self,
        player_id: PlayerId,
        verb: Verb,
        param: &str,
    ) -> Result<Reply, RoomError> {
        let (_, handle) = self.registry.lock().await.room_of(player_id)?;
        handle.submit(player_id, verb, param).await
    }

    /// Returns info about a specific room.
    pub async fn room_info(&self, room_id: &RoomId) -> Result<RoomInfo, RoomError> {
        let handle = self
            .registry
            .lock()
            .await
            .rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        handle.info().await
    }

    /// Returns the room ID a player is currently in, if any.
    pub async fn player_room(&self, player_id: PlayerId) -> Option<RoomId> {
        self.registry.lock().await.player_rooms.get(&player_id).cloned()
    }

    /// Lists all active room IDs, sorted.
    pub async fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.registry.lock().await.rooms.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Returns the number of active rooms.
    pub async fn room_count(&self) -> usize {
        self.registry.lock().await.rooms.len()
    }

    /// Asks every room to persist itself.
    pub async fn save_all(&self) {
        let handles: Vec<RoomHandle> = self.registry.lock().await.rooms.values().cloned().collect();
        for handle in handles {
            if let Err(err) = handle.save().await {
                tracing::warn!(room_id = %handle.room_id(), %err, "save request failed");
            }
        }
    }

    /// Saves and stops every room, forgetting all memberships.
    pub async fn shutdown(&self) {
        let rooms: Vec<(RoomId, RoomHandle)> = {
            let mut registry = self.registry.lock().await;
            registry.player_rooms.clear();
            registry.rooms.drain().collect()
        };
        for (room_id, handle) in rooms {
            if let Err(err) = handle.shutdown().await {
                tracing::warn!(%room_id, %err, "room already stopped");
            }
        }
        tracing::info!("all rooms shut down");
    }
}
