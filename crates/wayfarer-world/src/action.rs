//! Contextual actions a location offers (`do <action>`).

use serde::{Deserialize, Serialize};

use crate::{Item, Npc, Player};

/// Charges value meaning "usable forever".
const UNLIMITED: i32 = -1;

/// A precondition the acting player must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Requirement {
    /// The player must carry an item with this content id. `error` is told
    /// to that player alone when the check fails (if non-empty).
    Item {
        item: String,
        #[serde(default)]
        error: String,
    },
}

/// What happens when an action runs. Applied by the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Broadcast a line of text to the room.
    Message { text: String },
    /// Put a copy of the item into the acting player's inventory.
    GiveItem { item: Item },
    /// Put a copy of the item on the location's floor.
    DropItem { item: Item },
    /// Spawn a copy of the NPC into the location.
    SpawnNpc { npc: Npc },
    /// Restore the acting player's health.
    Heal { amount: f64 },
}

/// Result of [`Action::attempt`].
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The action ran; apply these effects.
    Performed(Vec<Effect>),
    /// A requirement failed, with the message to tell the player (if any).
    Blocked(Option<String>),
    /// No charges left.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub description: String,
    /// Remaining uses; `-1` means unlimited.
    #[serde(default = "unlimited")]
    pub charges: i32,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

fn unlimited() -> i32 {
    UNLIMITED
}

impl Action {
    pub fn new(id: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            charges: UNLIMITED,
            requirements: Vec::new(),
            effects: Vec::new(),
        }
    }

    pub fn with_charges(mut self, charges: i32) -> Self {
        self.charges = charges;
        self
    }

    pub fn requires_item(mut self, item: &str, error: &str) -> Self {
        self.requirements.push(Requirement::Item {
            item: item.to_string(),
            error: error.to_string(),
        });
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// `true` while the action can still be performed (and so is listed).
    pub fn has_charges(&self) -> bool {
        self.charges != 0
    }

    /// Post-load hook. Returns `false` if the action is malformed and
    /// should be dropped from its location.
    pub fn prepare(&mut self) -> bool {
        if self.id.is_empty() || self.charges < UNLIMITED {
            return false;
        }
        for effect in &mut self.effects {
            match effect {
                Effect::GiveItem { item } | Effect::DropItem { item } => item.prepare(),
                Effect::SpawnNpc { npc } => npc.prepare(),
                Effect::Message { .. } | Effect::Heal { .. } => {}
            }
        }
        true
    }

    /// Checks requirements, spends a charge, and returns the effects to
    /// apply. Items and NPCs in the effects are fresh instances.
    pub fn attempt(&mut self, player: &Player) -> ActionOutcome {
        if !self.has_charges() {
            return ActionOutcome::Exhausted;
        }
        for requirement in &self.requirements {
            match requirement {
                Requirement::Item { item, error } => {
                    if !player.owns(item) {
                        let message = (!error.is_empty()).then(|| error.clone());
                        return ActionOutcome::Blocked(message);
                    }
                }
            }
        }
        if self.charges > 0 {
            self.charges -= 1;
        }
        let effects = self
            .effects
            .iter()
            .map(|effect| match effect {
                Effect::GiveItem { item } => Effect::GiveItem {
                    item: item.instantiate(),
                },
                Effect::DropItem { item } => Effect::DropItem {
                    item: item.instantiate(),
                },
                Effect::SpawnNpc { npc } => Effect::SpawnNpc {
                    npc: npc.instantiate(),
                },
                other => other.clone(),
            })
            .collect();
        ActionOutcome::Performed(effects)
    }
}
