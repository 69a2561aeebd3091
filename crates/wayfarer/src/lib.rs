//! # Wayfarer
//!
//! Room-based multiplayer text adventure engine.
//!
//! A party of players shares a room: one location graph, one message
//! history, one combat, one travel vote. Each room is a Tokio actor that
//! answers every command with exactly one [`Reply`](wayfarer_protocol::Reply).
//! The [`Engine`] routes players to rooms and encodes replies as JSON.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wayfarer::prelude::*;
//!
//! fn world(_room: &RoomId) -> LocationGraph {
//!     LocationGraph::new(Location::new("camp", "Camp", "the camp"))
//! }
//!
//! # async fn run() -> Result<(), WayfarerError> {
//! wayfarer::init_tracing();
//! let engine = Engine::builder().save_dir("save").build(world)?;
//! let alice = engine.connect("alice", "Alice").await?;
//! let bytes = engine.submit_raw(alice, "look", "").await?;
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;

pub use engine::{DEFAULT_SAVE_DIR, Engine, EngineBuilder};
pub use error::WayfarerError;

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .try_init();
}

pub mod prelude {
    //! Everything needed to build a world and drive an engine.

    pub use crate::{DEFAULT_SAVE_DIR, Engine, EngineBuilder, WayfarerError, init_tracing};
    pub use wayfarer_protocol::{
        Codec, CombatView, HistoryEntry, JsonCodec, PlayerId, Reply, Request, RoomId, RoomView,
        Stats,
    };
    pub use wayfarer_room::{
        CombatState, Departure, RoomConfig, RoomError, RoomInfo, RoomManager, RoomStore, Verb,
        WorldSource,
    };
    pub use wayfarer_world::{
        Action, Effect, Item, ItemKind, Location, LocationGraph, LocationId, Npc, Player,
    };
}
