//! Reply payloads produced by a room actor.
//!
//! Every command gets exactly one [`Reply`]. Most verbs answer with a
//! [`RoomView`] (what the player currently sees) and a few read-only
//! verbs answer with a narrower payload (inventory, item detail, stats).
//! Failed or unknown commands answer [`Reply::Null`], which encodes as
//! JSON `null`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Guid;

/// The one answer a room actor produces for a command.
///
/// `#[serde(untagged)]` makes each variant serialize as its bare payload,
/// and the unit variant `Null` as JSON `null`, so the client sees e.g.
/// `{"name": ...}` or `[...]` with no enum wrapper.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Reply {
    /// Nothing to report (no-op, failed precondition, unknown verb).
    #[default]
    Null,
    /// The player's regenerated view of the room.
    View(RoomView),
    /// The player's inventory listing.
    Inventory(Vec<ItemView>),
    /// Details of a single inspected item.
    Item(ItemDetail),
    /// The player's derived stats.
    Stats(Stats),
}

impl Reply {
    /// Returns `true` for [`Reply::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the view if this reply carries one.
    pub fn as_view(&self) -> Option<&RoomView> {
        match self {
            Self::View(view) => Some(view),
            _ => None,
        }
    }
}

/// What a player sees after a view-producing command.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoomView {
    pub name: String,
    #[serde(rename = "desc")]
    pub description: String,
    /// New history entries visible to this player, in id order.
    pub history: Vec<HistoryEntry>,
    /// Exit id → short description of the destination. Empty in combat.
    pub exits: BTreeMap<String, String>,
    /// Action id → description, only actions with charges left. Empty in combat.
    pub actions: BTreeMap<String, String>,
    /// Items lying in the location. Omitted during combat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemView>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub npcs: Vec<NpcView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combat: Option<CombatView>,
}

/// A single delivered history message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub text: String,
}

/// Whose turn it is, present only while combat is in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatView {
    pub your_turn: bool,
    /// Content id (or username) of the fighter on turn.
    pub id: String,
    pub guid: Guid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcView {
    pub id: String,
    pub guid: Guid,
    pub name: String,
    #[serde(rename = "desc")]
    pub description: String,
    pub health: f64,
    pub health_max: f64,
    pub friendly: bool,
}

/// Item summary used in room views and inventory listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemView {
    pub quality: i8,
    pub id: String,
    pub guid: Guid,
    pub name: String,
    #[serde(rename = "desc")]
    pub description: String,
    pub equipped: bool,
    pub usable: bool,
}

/// Full detail of an inspected item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub quality: i8,
    pub name: String,
    #[serde(rename = "desc")]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub weight: f64,
    pub usable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
}

/// Combat-relevant numbers, either an item's bonuses or a player's totals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub health: f64,
    pub health_max: f64,
    pub attack: f64,
    pub defense: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_reply_serializes_as_json_null() {
        let json = serde_json::to_string(&Reply::Null).unwrap();
        assert_eq!(json, "null");
    }

    #[test]
    fn test_view_omits_optional_blocks() {
        let view = RoomView {
            name: "Cave".into(),
            description: "Dark and damp".into(),
            ..RoomView::default()
        };
        let json = serde_json::to_value(Reply::View(view)).unwrap();

        assert_eq!(json["name"], "Cave");
        assert_eq!(json["desc"], "Dark and damp");
        assert!(json["history"].as_array().unwrap().is_empty());
        assert!(json.get("items").is_none());
        assert!(json.get("npcs").is_none());
        assert!(json.get("combat").is_none());
    }

    #[test]
    fn test_combat_block_shape() {
        let view = RoomView {
            combat: Some(CombatView {
                your_turn: true,
                id: "alice".into(),
                guid: Guid(7),
            }),
            ..RoomView::default()
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["combat"]["your_turn"], true);
        assert_eq!(json["combat"]["id"], "alice");
        assert_eq!(json["combat"]["guid"], 7);
    }

    #[test]
    fn test_inventory_reply_is_bare_array() {
        let json = serde_json::to_value(Reply::Inventory(Vec::new())).unwrap();
        assert!(json.is_array());
    }

    #[test]
    fn test_as_view() {
        assert!(Reply::Null.as_view().is_none());
        assert!(Reply::View(RoomView::default()).as_view().is_some());
        assert!(Reply::Null.is_null());
    }
}
