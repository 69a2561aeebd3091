//! Room engine for Wayfarer.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! world, its players, and everything that happens between them. Commands
//! are processed one at a time in arrival order, and every command gets
//! exactly one reply.
//!
//! # Key types
//!
//! - [`RoomManager`]: opens/closes rooms, routes players and verbs
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`Verb`]: the closed set of player commands
//! - [`RoomConfig`]: room settings (player limit, vote timeout, etc.)
//! - [`RoomStore`]: JSON save files for rooms and players
//! - [`WorldSource`]: builds the world for rooms that have no save
//!
//! Inside a room, combat turns, travel votes, and the message history
//! are private state machines of the actor.

mod combat;
mod command;
mod config;
mod error;
mod history;
mod manager;
mod persistence;
mod room;
mod source;
mod state;
mod voting;

pub use combat::CombatState;
pub use command::Verb;
pub use config::RoomConfig;
pub use error::{PersistError, RoomError};
pub use manager::RoomManager;
pub use persistence::{RoomStore, SavedRoom};
pub use room::{spawn_room, Departure, RoomHandle, RoomInfo};
pub use source::WorldSource;
