//! The location graph: an arena of locations linked by named exits.
//!
//! Exits may form cycles (a corridor leading back to the hall), so the
//! graph is stored as a flat `Vec<Location>` and exits refer to targets by
//! [`LocationId`] index instead of owning them. Traversals carry an
//! explicit visited set.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Action, ItemList, Npc, WorldError};

/// Exit name that leads to the location the party arrived from.
pub const BACK_EXIT: &str = "back";

/// Index of a location inside its [`LocationGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub usize);

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L-{}", self.0)
    }
}

/// A named one-way link to another location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    pub id: String,
    pub target: LocationId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Content id (`"cave_entrance"`).
    pub id: String,
    pub name: String,
    pub description: String,
    /// Shown in exit listings and travel messages.
    pub description_short: String,
    #[serde(default)]
    pub exits: Vec<Exit>,
    #[serde(default)]
    pub items: ItemList,
    #[serde(default)]
    pub npcs: Vec<Npc>,
    #[serde(default)]
    pub actions: BTreeMap<String, Action>,
    /// Set on exactly one location: where the party is.
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub visited: bool,
    /// Where the party first arrived from. Saves without it get one
    /// rebuilt on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<LocationId>,
}

impl Location {
    pub fn new(id: &str, name: &str, description_short: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            description_short: description_short.to_string(),
            exits: Vec::new(),
            items: ItemList::new(),
            npcs: Vec::new(),
            actions: BTreeMap::new(),
            current: false,
            visited: false,
            parent: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_item(mut self, item: crate::Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_npc(mut self, npc: Npc) -> Self {
        self.npcs.push(npc);
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.insert(action.id.clone(), action);
        self
    }

    /// Marks the location visited. Returns `true` on the first visit.
    pub fn visit(&mut self) -> bool {
        !std::mem::replace(&mut self.visited, true)
    }
}

/// Arena of locations plus the starting point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationGraph {
    start: LocationId,
    locations: Vec<Location>,
}

impl LocationGraph {
    /// Creates a graph whose starting location is `start`.
    pub fn new(start: Location) -> Self {
        Self {
            start: LocationId(0),
            locations: vec![start],
        }
    }

    pub fn add(&mut self, location: Location) -> LocationId {
        self.locations.push(location);
        LocationId(self.locations.len() - 1)
    }

    /// Adds a one-way exit `from --exit--> to`.
    pub fn connect(&mut self, from: LocationId, exit: &str, to: LocationId) {
        if let Some(location) = self.locations.get_mut(from.0) {
            location.exits.push(Exit {
                id: exit.to_string(),
                target: to,
            });
        }
    }

    /// Adds exits in both directions.
    pub fn connect_both(&mut self, a: LocationId, a_to_b: &str, b: LocationId, b_to_a: &str) {
        self.connect(a, a_to_b, b);
        self.connect(b, b_to_a, a);
    }

    pub fn start(&self) -> LocationId {
        self.start
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(id.0)
    }

    pub fn get_mut(&mut self, id: LocationId) -> Option<&mut Location> {
        self.locations.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Checks that the start and every exit target exist.
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.get(self.start).is_none() {
            return Err(WorldError::MissingStart(self.start));
        }
        for (index, location) in self.locations.iter().enumerate() {
            for exit in &location.exits {
                if self.get(exit.target).is_none() {
                    return Err(WorldError::DanglingExit {
                        location: LocationId(index),
                        exit: exit.id.clone(),
                        target: exit.target,
                    });
                }
            }
        }
        Ok(())
    }

    /// Makes a freshly built graph ready: the start becomes current and
    /// visited.
    pub fn begin(&mut self) -> LocationId {
        let start = self.start;
        if let Some(location) = self.get_mut(start) {
            location.current = true;
            location.visit();
        }
        start
    }

    /// Post-load pass over every location reachable from the start.
    ///
    /// Runs the item and action refresh hooks, drops actions that fail to
    /// prepare, fills in missing `parent` links of visited locations
    /// along the traversal tree, and returns the location flagged
    /// `current` (the start if none is). Saved parent links are kept
    /// unless they dangle.
    pub fn prepare(&mut self) -> LocationId {
        let len = self.locations.len();
        for location in &mut self.locations {
            if location.parent.is_some_and(|parent| parent.0 >= len) {
                location.parent = None;
            }
        }

        let mut seen = vec![false; self.locations.len()];
        let mut stack = vec![self.start];
        let mut current = None;
        if let Some(flag) = seen.get_mut(self.start.0) {
            *flag = true;
        }

        while let Some(id) = stack.pop() {
            let Some(location) = self.locations.get_mut(id.0) else {
                continue;
            };
            for item in location.items.iter_mut() {
                item.prepare();
            }
            for npc in &mut location.npcs {
                npc.prepare();
            }
            location.actions.retain(|action_id, action| {
                let keep = action.prepare();
                if !keep {
                    tracing::debug!(location = %location.id, action = %action_id, "dropping malformed action");
                }
                keep
            });
            if location.current && current.is_none() {
                current = Some(id);
            }

            let targets: Vec<LocationId> = location.exits.iter().map(|exit| exit.target).collect();
            for target in targets {
                let Some(flag) = seen.get_mut(target.0) else {
                    continue;
                };
                if *flag {
                    continue;
                }
                *flag = true;
                if let Some(next) = self.locations.get_mut(target.0) {
                    if next.visited && next.parent.is_none() {
                        next.parent = Some(id);
                    }
                }
                stack.push(target);
            }
        }

        let current = current.unwrap_or(self.start);
        if let Some(location) = self.get_mut(current) {
            location.current = true;
        }
        current
    }

    /// Resolves an exit name from `from`. `"back"` follows the parent link.
    pub fn resolve_exit(&self, from: LocationId, way: &str) -> Option<LocationId> {
        let location = self.get(from)?;
        if way == BACK_EXIT {
            return location.parent;
        }
        location
            .exits
            .iter()
            .find(|exit| exit.id == way)
            .map(|exit| exit.target)
    }

    /// Exit name → short description of the destination, including `back`.
    pub fn exit_descriptions(&self, from: LocationId) -> BTreeMap<String, String> {
        let mut exits = BTreeMap::new();
        let Some(location) = self.get(from) else {
            return exits;
        };
        for exit in &location.exits {
            if let Some(target) = self.get(exit.target) {
                exits.insert(exit.id.clone(), target.description_short.clone());
            }
        }
        if let Some(parent) = location.parent.and_then(|p| self.get(p)) {
            exits.insert(BACK_EXIT.to_string(), parent.description_short.clone());
        }
        exits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Item, ItemKind};

    /// hall <-> corridor <-> vault, with corridor also looping to hall.
    fn looped() -> LocationGraph {
        let mut graph = LocationGraph::new(Location::new("hall", "Hall", "a hall"));
        let corridor = graph.add(Location::new("corridor", "Corridor", "a corridor"));
        let vault = graph.add(Location::new("vault", "Vault", "a vault"));
        graph.connect_both(graph.start(), "north", corridor, "south");
        graph.connect_both(corridor, "east", vault, "west");
        graph.connect(vault, "shortcut", graph.start());
        graph
    }

    #[test]
    fn test_prepare_terminates_on_cycles_and_finds_current() {
        let mut graph = looped();
        graph.begin();
        let vault = LocationId(2);
        graph.get_mut(LocationId(0)).unwrap().current = false;
        graph.get_mut(vault).unwrap().current = true;
        assert_eq!(graph.prepare(), vault);
    }

    #[test]
    fn test_prepare_defaults_to_start() {
        let mut graph = looped();
        assert_eq!(graph.prepare(), graph.start());
        assert!(graph.get(graph.start()).unwrap().current);
    }

    #[test]
    fn test_prepare_rebuilds_parents_for_visited_only() {
        let mut graph = looped();
        graph.begin();
        graph.get_mut(LocationId(1)).unwrap().visited = true;
        graph.prepare();
        assert_eq!(graph.get(LocationId(1)).unwrap().parent, Some(LocationId(0)));
        assert_eq!(graph.get(LocationId(2)).unwrap().parent, None);
        assert_eq!(graph.get(LocationId(0)).unwrap().parent, None);
    }

    #[test]
    fn test_prepare_drops_malformed_actions() {
        let mut graph = LocationGraph::new(
            Location::new("hall", "Hall", "a hall")
                .with_action(Action::new("ok", "fine"))
                .with_action(Action::new("bad", "broken").with_charges(-3)),
        );
        graph.prepare();
        let actions = &graph.get(graph.start()).unwrap().actions;
        assert!(actions.contains_key("ok"));
        assert!(!actions.contains_key("bad"));
    }

    #[test]
    fn test_resolve_exit_and_back() {
        let mut graph = looped();
        let corridor = graph.resolve_exit(graph.start(), "north").unwrap();
        assert_eq!(corridor, LocationId(1));
        assert_eq!(graph.resolve_exit(corridor, BACK_EXIT), None);
        graph.get_mut(corridor).unwrap().parent = Some(graph.start());
        assert_eq!(graph.resolve_exit(corridor, BACK_EXIT), Some(graph.start()));
        assert_eq!(graph.resolve_exit(corridor, "up"), None);
    }

    #[test]
    fn test_exit_descriptions_include_back() {
        let mut graph = looped();
        graph.get_mut(LocationId(1)).unwrap().parent = Some(graph.start());
        let exits = graph.exit_descriptions(LocationId(1));
        assert_eq!(exits.get("south").map(String::as_str), Some("a hall"));
        assert_eq!(exits.get("back").map(String::as_str), Some("a hall"));
        assert_eq!(exits.get("east").map(String::as_str), Some("a vault"));
    }

    #[test]
    fn test_validate_catches_dangling_exit() {
        let mut graph = looped();
        graph.connect(LocationId(0), "void", LocationId(99));
        assert!(matches!(graph.validate(), Err(WorldError::DanglingExit { .. })));
        assert!(looped().validate().is_ok());
    }

    #[test]
    fn test_graph_round_trips_through_json_with_parents() {
        let mut graph = looped();
        graph.begin();
        graph.get_mut(LocationId(1)).unwrap().parent = Some(graph.start());
        graph
            .get_mut(LocationId(1))
            .unwrap()
            .items
            .push(Item::new("rock", "Rock", ItemKind::Misc));
        let json = serde_json::to_string(&graph).unwrap();
        let back: LocationGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 3);
        assert_eq!(back.get(LocationId(1)).unwrap().parent, Some(graph.start()));
        assert_eq!(back.get(LocationId(2)).unwrap().parent, None);
        assert_eq!(back.get(LocationId(1)).unwrap().items.len(), 1);
    }

    #[test]
    fn test_reload_keeps_travel_time_parent() {
        // start -> a, start -> b, a -> b; the party went start, a, b.
        let mut graph = LocationGraph::new(Location::new("start", "Start", "the start"));
        let a = graph.add(Location::new("a", "A", "room a"));
        let b = graph.add(Location::new("b", "B", "room b"));
        graph.connect(graph.start(), "left", a);
        graph.connect(graph.start(), "right", b);
        graph.connect(a, "on", b);
        graph.begin();
        for (from, to) in [(graph.start(), a), (a, b)] {
            let next = graph.get_mut(to).unwrap();
            next.visit();
            next.parent = Some(from);
        }

        let json = serde_json::to_string(&graph).unwrap();
        let mut back: LocationGraph = serde_json::from_str(&json).unwrap();
        back.prepare();
        assert_eq!(back.get(b).unwrap().parent, Some(a));
        assert_eq!(back.resolve_exit(b, BACK_EXIT), Some(a));
    }

    #[test]
    fn test_prepare_drops_dangling_parent() {
        let mut graph = looped();
        graph.begin();
        let corridor = graph.get_mut(LocationId(1)).unwrap();
        corridor.visited = true;
        corridor.parent = Some(LocationId(42));
        graph.prepare();
        assert_eq!(graph.get(LocationId(1)).unwrap().parent, Some(LocationId(0)));
    }

    #[test]
    fn test_visit_reports_first_visit_only() {
        let mut location = Location::new("hall", "Hall", "a hall");
        assert!(location.visit());
        assert!(!location.visit());
    }
}
