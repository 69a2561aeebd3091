//! Non-player characters.

use serde::{Deserialize, Serialize};
use wayfarer_protocol::{Guid, NpcView};

use crate::{Fighter, Team};

/// A computer-controlled character living in a location.
///
/// Hostile NPCs pull the room into combat when a view of their location
/// is generated; friendly ones are scenery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    #[serde(default = "Guid::next")]
    pub guid: Guid,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub health: f64,
    pub health_max: f64,
    pub attack: f64,
    #[serde(default)]
    pub defense: f64,
    #[serde(default)]
    pub friendly: bool,
}

impl Npc {
    /// A hostile NPC at full health.
    pub fn hostile(id: &str, name: &str, health: f64, attack: f64) -> Self {
        Self {
            guid: Guid::next(),
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            health,
            health_max: health,
            attack,
            defense: 0.0,
            friendly: false,
        }
    }

    /// A friendly NPC that never fights.
    pub fn friendly(id: &str, name: &str) -> Self {
        Self {
            friendly: true,
            ..Self::hostile(id, name, 1.0, 0.0)
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn prepare(&mut self) {
        Guid::reserve(self.guid);
    }

    /// Returns a copy with a fresh guid and full health.
    pub fn instantiate(&self) -> Self {
        Self {
            guid: Guid::next(),
            health: self.health_max,
            ..self.clone()
        }
    }

    /// `true` if this NPC should be enrolled into combat.
    pub fn is_hostile(&self) -> bool {
        !self.friendly && self.is_alive()
    }

    pub fn view(&self) -> NpcView {
        NpcView {
            id: self.id.clone(),
            guid: self.guid,
            name: self.name.clone(),
            description: self.description.clone(),
            health: self.health,
            health_max: self.health_max,
            friendly: self.friendly,
        }
    }
}

impl Fighter for Npc {
    fn fighter_id(&self) -> &str {
        &self.id
    }

    fn guid(&self) -> Guid {
        self.guid
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn team(&self) -> Team {
        if self.friendly {
            Team::Players
        } else {
            Team::Monsters
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }

    fn health(&self) -> f64 {
        self.health
    }

    fn attack_power(&self) -> f64 {
        self.attack
    }

    fn defense(&self) -> f64 {
        self.defense
    }

    fn take_damage(&mut self, amount: f64) -> f64 {
        let taken = amount.min(self.health).max(0.0);
        self.health -= taken;
        taken
    }
}
