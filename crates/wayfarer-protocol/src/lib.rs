//! Shared vocabulary for Wayfarer.
//!
//! This crate defines the types every other layer agrees on:
//!
//! - **Identity** ([`PlayerId`], [`RoomId`], [`Guid`]): who and what.
//! - **Visibility** ([`Recipient`]): who may see a history message.
//! - **Requests** ([`Request`]): a verb and its parameter.
//! - **Replies** ([`Reply`], [`RoomView`], ...): the JSON shapes a room
//!   actor answers every command with.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how replies become bytes
//!   for whatever transport sits in front of the engine.
//!
//! ```text
//! Transport (bytes) ← Protocol (Reply) ← Room actor (state)
//! ```

mod codec;
mod error;
mod request;
mod types;
mod view;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use request::Request;
pub use types::{Guid, PlayerId, Recipient, RoomId};
pub use view::{
    CombatView, HistoryEntry, ItemDetail, ItemView, NpcView, Reply, RoomView,
    Stats,
};
