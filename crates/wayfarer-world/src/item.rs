//! Items and item collections.

use serde::{Deserialize, Serialize};
use wayfarer_protocol::{Guid, ItemDetail, ItemView, Stats};

/// What an item is for. Decides whether it can be equipped or used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    Weapon,
    Armor,
    /// Consumed on use, restoring `heal` health.
    Consumable { heal: f64 },
    Misc,
}

impl ItemKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Weapon => "weapon",
            Self::Armor => "armor",
            Self::Consumable { .. } => "consumable",
            Self::Misc => "misc",
        }
    }
}

/// A concrete item instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default = "Guid::next")]
    pub guid: Guid,
    /// Content id, shared by every instance of the same template.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quality: i8,
    pub kind: ItemKind,
    #[serde(default)]
    pub weight: f64,
    /// Bonuses granted while equipped.
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub equipped: bool,
}

impl Item {
    pub fn new(id: &str, name: &str, kind: ItemKind) -> Self {
        Self {
            guid: Guid::next(),
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            quality: 0,
            kind,
            weight: 0.0,
            stats: Stats::default(),
            equipped: false,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_stats(mut self, stats: Stats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_quality(mut self, quality: i8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Post-load hook: keeps the guid allocator ahead of this item.
    pub fn prepare(&mut self) {
        Guid::reserve(self.guid);
    }

    /// Returns a copy of this item with a fresh guid, for effects that hand
    /// out the same template more than once.
    pub fn instantiate(&self) -> Self {
        Self {
            guid: Guid::next(),
            equipped: false,
            ..self.clone()
        }
    }

    pub fn is_usable(&self) -> bool {
        matches!(self.kind, ItemKind::Consumable { .. })
    }

    pub fn is_equippable(&self) -> bool {
        matches!(self.kind, ItemKind::Weapon | ItemKind::Armor)
    }

    /// Matches either the content id or the rendered guid.
    pub fn matches(&self, key: &str) -> bool {
        self.id == key || self.guid.to_string() == key
    }

    pub fn view(&self) -> ItemView {
        ItemView {
            quality: self.quality,
            id: self.id.clone(),
            guid: self.guid,
            name: self.name.clone(),
            description: self.description.clone(),
            equipped: self.equipped,
            usable: self.is_usable(),
        }
    }

    pub fn detail(&self) -> ItemDetail {
        ItemDetail {
            quality: self.quality,
            name: self.name.clone(),
            description: self.description.clone(),
            kind: self.kind.label().to_string(),
            weight: self.weight,
            usable: self.is_usable(),
            stats: self.is_equippable().then_some(self.stats),
        }
    }
}

/// An ordered bag of items (a player's inventory or a location's floor).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemList(Vec<Item>);

impl ItemList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, item: Item) {
        self.0.push(item);
    }

    pub fn get(&self, key: &str) -> Option<&Item> {
        self.0.iter().find(|item| item.matches(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Item> {
        self.0.iter_mut().find(|item| item.matches(key))
    }

    /// Removes and returns the first item matching `key`.
    pub fn take(&mut self, key: &str) -> Option<Item> {
        let index = self.0.iter().position(|item| item.matches(key))?;
        Some(self.0.remove(index))
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.0.iter().any(|item| item.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Item> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn views(&self) -> Vec<ItemView> {
        self.0.iter().map(Item::view).collect()
    }
}

impl FromIterator<Item> for ItemList {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
