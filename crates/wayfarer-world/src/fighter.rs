//! The capability shared by everything that can take a combat turn.

use serde::{Deserialize, Serialize};
use wayfarer_protocol::Guid;

/// Which side of a fight an entity is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// Players and friendly NPCs.
    Players,
    /// Hostile NPCs.
    Monsters,
}

/// An entity eligible to take a combat turn.
///
/// Implemented by [`Player`](crate::Player) (interactive: a human decides
/// the turn) and [`Npc`](crate::Npc) (non-interactive: the room resolves
/// the turn automatically).
pub trait Fighter {
    /// Identifier other players use to target this fighter.
    fn fighter_id(&self) -> &str;

    fn guid(&self) -> Guid;

    /// Name used in combat messages.
    fn display_name(&self) -> &str;

    fn team(&self) -> Team;

    /// `true` if a human chooses this fighter's actions.
    fn is_interactive(&self) -> bool;

    fn health(&self) -> f64;

    fn attack_power(&self) -> f64;

    fn defense(&self) -> f64;

    /// Lowers health by `amount` (never below zero) and returns the
    /// damage actually taken.
    fn take_damage(&mut self, amount: f64) -> f64;

    fn is_alive(&self) -> bool {
        self.health() > 0.0
    }
}
