//! World content for Wayfarer rooms.
//!
//! A room's world is a graph of [`Location`]s stored in an arena
//! ([`LocationGraph`]) and indexed by [`LocationId`]. Locations hold the
//! things players interact with: [`Item`]s, [`Npc`]s and contextual
//! [`Action`]s. [`Player`]s carry their own inventory and stats.
//!
//! Players and NPCs both implement [`Fighter`], the capability the combat
//! queue in `wayfarer-room` dispatches on.
//!
//! This crate only models what the room engine needs; it does not try to
//! be a content pipeline.

mod action;
mod error;
mod fighter;
mod item;
mod location;
mod npc;
mod player;

pub use action::{Action, ActionOutcome, Effect, Requirement};
pub use error::WorldError;
pub use fighter::{Fighter, Team};
pub use item::{Item, ItemKind, ItemList};
pub use location::{Exit, Location, LocationGraph, LocationId, BACK_EXIT};
pub use npc::Npc;
pub use player::Player;
