//! Players: identity, inventory, and derived stats.

use serde::{Deserialize, Serialize};
use wayfarer_protocol::{Guid, PlayerId, Stats};

use crate::{Fighter, Item, ItemKind, ItemList, Team};

const DEFAULT_HEALTH: f64 = 100.0;
const DEFAULT_ATTACK: f64 = 10.0;
const DEFAULT_DEFENSE: f64 = 2.0;

/// A human participant.
///
/// While a player is in a room the room actor owns this value; it is
/// handed back (and persisted) when the player leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    #[serde(default = "Guid::next")]
    pub guid: Guid,
    /// Login name, also used as an attack target and save-file stem.
    pub username: String,
    /// Display name used in messages.
    pub name: String,
    pub health: f64,
    /// Stats before equipment bonuses.
    pub base: Stats,
    #[serde(default)]
    pub inventory: ItemList,
}

impl Player {
    pub fn new(id: PlayerId, username: &str, name: &str) -> Self {
        Self {
            id,
            guid: Guid::next(),
            username: username.to_string(),
            name: name.to_string(),
            health: DEFAULT_HEALTH,
            base: Stats {
                health: DEFAULT_HEALTH,
                health_max: DEFAULT_HEALTH,
                attack: DEFAULT_ATTACK,
                defense: DEFAULT_DEFENSE,
            },
            inventory: ItemList::new(),
        }
    }

    pub fn with_base(mut self, base: Stats) -> Self {
        self.health = base.health_max;
        self.base = base;
        self
    }

    pub fn prepare(&mut self) {
        Guid::reserve(self.guid);
        for item in self.inventory.iter_mut() {
            item.prepare();
        }
    }

    /// Current totals: base stats plus bonuses of equipped items.
    pub fn stats(&self) -> Stats {
        let mut stats = self.base;
        for item in self.inventory.iter().filter(|item| item.equipped) {
            stats.health_max += item.stats.health_max;
            stats.attack += item.stats.attack;
            stats.defense += item.stats.defense;
        }
        stats.health = self.health;
        stats
    }

    /// `true` if the inventory holds an item with content id `item_id`.
    pub fn owns(&self, item_id: &str) -> bool {
        self.inventory.contains_id(item_id)
    }

    pub fn give(&mut self, item: Item) {
        self.inventory.push(item);
    }

    /// Moves the item matching `key` from `floor` into the inventory.
    pub fn pickup(&mut self, floor: &mut ItemList, key: &str) -> bool {
        match floor.take(key) {
            Some(mut item) => {
                item.equipped = false;
                self.inventory.push(item);
                true
            }
            None => false,
        }
    }

    /// Moves the item matching `key` from the inventory onto `floor`.
    pub fn drop_item(&mut self, floor: &mut ItemList, key: &str) -> bool {
        match self.inventory.take(key) {
            Some(mut item) => {
                item.equipped = false;
                floor.push(item);
                self.clamp_health();
                true
            }
            None => false,
        }
    }

    /// Consumes a usable item. Returns `false` if there is none by that key.
    pub fn use_item(&mut self, key: &str) -> bool {
        let heal = match self.inventory.get(key).map(|item| &item.kind) {
            Some(ItemKind::Consumable { heal }) => *heal,
            _ => return false,
        };
        self.inventory.take(key);
        self.heal(heal);
        true
    }

    /// Toggles the equipped state of a weapon or armor piece.
    ///
    /// Equipping replaces any other equipped item of the same kind.
    pub fn equip(&mut self, key: &str) -> bool {
        let (guid, kind, equipped) = match self.inventory.get(key) {
            Some(item) if item.is_equippable() => {
                (item.guid, item.kind.clone(), item.equipped)
            }
            _ => return false,
        };
        for item in self.inventory.iter_mut() {
            if item.guid == guid {
                item.equipped = !equipped;
            } else if item.kind == kind {
                item.equipped = false;
            }
        }
        self.clamp_health();
        true
    }

    pub fn heal(&mut self, amount: f64) {
        let max = self.stats().health_max;
        self.health = (self.health + amount).min(max);
    }

    fn clamp_health(&mut self) {
        let max = self.stats().health_max;
        if self.health > max {
            self.health = max;
        }
    }
}

impl Fighter for Player {
    fn fighter_id(&self) -> &str {
        &self.username
    }

    fn guid(&self) -> Guid {
        self.guid
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn team(&self) -> Team {
        Team::Players
    }

    fn is_interactive(&self) -> bool {
        true
    }

    fn health(&self) -> f64 {
        self.health
    }

    fn attack_power(&self) -> f64 {
        self.stats().attack
    }

    fn defense(&self) -> f64 {
        self.stats().defense
    }

    fn take_damage(&mut self, amount: f64) -> f64 {
        let taken = amount.min(self.health).max(0.0);
        self.health -= taken;
        taken
    }
}
