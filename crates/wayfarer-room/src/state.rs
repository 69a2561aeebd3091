//! A room's game state and the verbs that act on it.
//!
//! [`Room`] is plain synchronous state. The actor in `room.rs` owns one
//! and feeds it commands one at a time, which is the only thing that
//! makes this code free of locks.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::time::Instant;
use wayfarer_protocol::{CombatView, Guid, PlayerId, Reply, RoomId, RoomView};
use wayfarer_world::{
    ActionOutcome, Effect, Fighter, LocationGraph, LocationId, Npc, Player, Team,
};

use crate::combat::{CombatQueue, Combatants, FighterRef};
use crate::history::MessageLog;
use crate::persistence::{RoomStore, SavedRoom};
use crate::room::RoomInfo;
use crate::voting::TravelVote;
use crate::{RoomConfig, RoomError, Verb};

/// `true` if `fighter` is a legal attack target for someone on `team`
/// who typed `key`.
fn is_target(fighter: &dyn Fighter, key: &str, team: Team) -> bool {
    fighter.is_alive()
        && fighter.team() != team
        && (fighter.fighter_id() == key || fighter.guid().to_string() == key)
}

pub(crate) struct Room {
    id: RoomId,
    graph: LocationGraph,
    current: LocationId,
    /// Connected players in join order.
    players: Vec<Player>,
    log: MessageLog,
    vote: TravelVote,
    combat: CombatQueue,
    rng: StdRng,
    config: RoomConfig,
    store: RoomStore,
}

impl Room {
    /// Rebuilds runtime state from a saved (or freshly built) room.
    pub(crate) fn restore(saved: SavedRoom, config: RoomConfig, store: RoomStore) -> Self {
        let SavedRoom {
            id,
            location: mut graph,
            message_count,
        } = saved;
        let current = graph.prepare();
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            id,
            graph,
            current,
            players: Vec::new(),
            log: MessageLog::resume(message_count),
            vote: TravelVote::default(),
            combat: CombatQueue::default(),
            rng,
            config,
            store,
        }
    }

    pub(crate) fn id(&self) -> &RoomId {
        &self.id
    }

    pub(crate) fn player_count(&self) -> usize {
        self.players.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub(crate) fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.id.clone(),
            player_count: self.players.len(),
            max_players: self.config.max_players,
            location: self
                .graph
                .get(self.current)
                .map(|location| location.id.clone())
                .unwrap_or_default(),
            voting: self.vote.is_active(),
            combat: self.combat.state(),
            message_count: self.log.last_id(),
        }
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    pub(crate) fn join(&mut self, player: Player) -> Result<(), RoomError> {
        if self.player_index(player.id).is_some() {
            return Err(RoomError::AlreadyInRoom(player.id, self.id.clone()));
        }
        if self.players.len() >= self.config.max_players {
            return Err(RoomError::RoomFull(self.id.clone()));
        }

        let player_id = player.id;
        self.log.subscribe(player_id);
        self.log
            .tell_all_except(format!("{} has joined the party", player.name), player_id);
        self.combat.enroll(FighterRef::Player(player_id));
        self.players.push(player);

        tracing::info!(
            room_id = %self.id,
            %player_id,
            players = self.players.len(),
            "player joined"
        );
        Ok(())
    }

    /// Removes a player and persists them. Their vote and combat slot go
    /// with them.
    pub(crate) fn leave(&mut self, player_id: PlayerId) -> Result<Player, RoomError> {
        let index = self
            .player_index(player_id)
            .ok_or_else(|| RoomError::NotInRoom(player_id, self.id.clone()))?;
        let player = self.players.remove(index);

        self.vote.withdraw(player_id);
        self.log.unsubscribe(player_id);
        self.log.tell_all(format!("{} has left the party", player.name));
        self.with_roster(|combat, roster, log| {
            combat.remove(roster, log, FighterRef::Player(player_id));
            combat.settle(roster, log);
        });

        if let Err(err) = self.store.save_player(&player) {
            tracing::error!(room_id = %self.id, %player_id, %err, "failed to save player");
        }
        tracing::info!(
            room_id = %self.id,
            %player_id,
            players = self.players.len(),
            "player left"
        );
        Ok(player)
    }

    // -----------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------

    /// Writes the room to its save file. Failures are logged, not retried.
    pub(crate) fn save(&self) -> bool {
        match self
            .store
            .save_room(&self.id, &self.graph, self.log.last_id())
        {
            Ok(()) => {
                tracing::info!(room_id = %self.id, "room saved");
                true
            }
            Err(err) => {
                tracing::error!(room_id = %self.id, %err, "failed to save room");
                false
            }
        }
    }

    /// Saves the room and every connected player.
    pub(crate) fn save_everything(&self) {
        self.save();
        for player in &self.players {
            if let Err(err) = self.store.save_player(player) {
                tracing::error!(room_id = %self.id, player_id = %player.id, %err, "failed to save player");
            }
        }
    }

    // -----------------------------------------------------------------
    // Command processing
    // -----------------------------------------------------------------

    /// Runs one command and produces its reply.
    ///
    /// An expired vote is resolved first (unless the command is itself a
    /// `go`, which resolves it after casting), then pending NPC turns are
    /// played out, then the verb runs.
    pub(crate) fn process(
        &mut self,
        player_id: PlayerId,
        verb: Verb,
        param: &str,
        now: Instant,
    ) -> Reply {
        if verb != Verb::Go && self.vote.is_expired(now) {
            self.resolve_vote(now);
        }
        self.settle();

        let Some(index) = self.player_index(player_id) else {
            tracing::debug!(room_id = %self.id, %player_id, %verb, "command from non-member, ignoring");
            return Reply::Null;
        };

        match verb {
            Verb::Attack => {
                self.attack(player_id, param);
                self.view(player_id)
            }
            Verb::Defend => {
                self.defend(player_id);
                self.view(player_id)
            }
            Verb::Ability => Reply::Null,
            Verb::Save => {
                self.save();
                Reply::Null
            }
            Verb::Look => self.view(player_id),
            Verb::Do => {
                if !param.is_empty() {
                    self.perform(index, param);
                }
                self.view(player_id)
            }
            Verb::Go => {
                if !param.is_empty() {
                    self.go(player_id, param, now);
                }
                self.view(player_id)
            }
            Verb::Inventory => Reply::Inventory(self.players[index].inventory.views()),
            Verb::Inspect => self.inspect(index, param),
            Verb::Pickup => {
                if !param.is_empty() && self.pickup(index, param) {
                    self.view(player_id)
                } else {
                    Reply::Null
                }
            }
            Verb::Drop => {
                if self.drop_item(index, param) {
                    self.view(player_id)
                } else {
                    Reply::Null
                }
            }
            Verb::Use => {
                if self.use_item(index, param) {
                    self.view(player_id)
                } else {
                    Reply::Null
                }
            }
            Verb::Stats => Reply::Stats(self.players[index].stats()),
            Verb::Equip => {
                let player = &mut self.players[index];
                if player.equip(param) {
                    Reply::Stats(player.stats())
                } else {
                    Reply::Null
                }
            }
            Verb::Unknown(other) => {
                tracing::debug!(room_id = %self.id, %player_id, verb = %other, "unknown verb");
                Reply::Null
            }
        }
    }

    fn player_index(&self, player_id: PlayerId) -> Option<usize> {
        self.players.iter().position(|player| player.id == player_id)
    }

    fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|player| player.id).collect()
    }

    // -----------------------------------------------------------------
    // Combat
    // -----------------------------------------------------------------

    /// Lends the combat queue a roster of this room's players and the
    /// current location's NPCs.
    fn with_roster<R>(
        &mut self,
        f: impl FnOnce(&mut CombatQueue, &mut Combatants<'_>, &mut MessageLog) -> R,
    ) -> R {
        let npcs: &mut [Npc] = self
            .graph
            .get_mut(self.current)
            .map(|location| location.npcs.as_mut_slice())
            .unwrap_or_default();
        let mut roster = Combatants {
            players: &mut self.players,
            npcs,
        };
        f(&mut self.combat, &mut roster, &mut self.log)
    }

    fn settle(&mut self) {
        if self.combat.in_progress() {
            self.with_roster(|combat, roster, log| combat.settle(roster, log));
        }
    }

    /// Resolves `key` against connected players first, then the current
    /// location's NPCs.
    fn find_enemy(&self, key: &str, team: Team) -> Option<FighterRef> {
        if let Some(player) = self.players.iter().find(|p| is_target(*p, key, team)) {
            return Some(FighterRef::Player(player.id));
        }
        self.graph
            .get(self.current)?
            .npcs
            .iter()
            .find(|npc| is_target(*npc, key, team))
            .map(|npc| FighterRef::Npc(npc.guid))
    }

    fn attack(&mut self, player_id: PlayerId, target: &str) {
        let me = FighterRef::Player(player_id);
        if self.combat.current() != Some(me) {
            return;
        }
        let Some(target) = self.find_enemy(target, Team::Players) else {
            tracing::debug!(room_id = %self.id, %player_id, target, "no such enemy");
            return;
        };
        self.combat.enroll(target);
        self.with_roster(|combat, roster, log| {
            if combat.attack(roster, log, target) {
                combat.settle(roster, log);
            }
        });
    }

    fn defend(&mut self, player_id: PlayerId) {
        if self.combat.current() != Some(FighterRef::Player(player_id)) {
            return;
        }
        self.with_roster(|combat, roster, log| {
            if combat.defend(roster, log) {
                combat.settle(roster, log);
            }
        });
    }

    // -----------------------------------------------------------------
    // Travel
    // -----------------------------------------------------------------

    fn go(&mut self, player_id: PlayerId, way: &str, now: Instant) {
        let Some(destination) = self.graph.resolve_exit(self.current, way) else {
            return;
        };
        if self.players.len() == 1 {
            self.travel(destination);
            return;
        }

        self.vote
            .cast(player_id, destination, now, self.config.vote_timeout);
        let (voted, total) = self.vote.tally(&self.player_ids());
        let short = self.short_description(destination);
        let name = self
            .player_index(player_id)
            .map(|index| self.players[index].name.clone())
            .unwrap_or_default();
        let status = format!("({voted} of {total} players voted)");
        self.log.tell_all_except(
            format!("{name} wants to go to {short} {status}"),
            player_id,
        );
        self.log
            .tell(format!("You want to go to {short} {status}"), player_id);

        self.resolve_vote(now);
    }

    /// Travels if every connected player voted or the deadline passed.
    fn resolve_vote(&mut self, now: Instant) {
        if !self.vote.is_active() {
            return;
        }
        let roster = self.player_ids();
        if !self.vote.is_unanimous(&roster) && !self.vote.is_expired(now) {
            return;
        }
        match self.vote.winner(&roster, &mut self.rng) {
            Some(destination) => self.travel(destination),
            None => {
                tracing::debug!(room_id = %self.id, "vote expired without votes");
                self.vote.reset();
            }
        }
    }

    fn travel(&mut self, destination: LocationId) {
        self.vote.reset();
        let previous = self.current;
        let short = self.short_description(destination);
        self.log.tell_all(format!("You went to {short}"));

        if let Some(old) = self.graph.get_mut(previous) {
            old.current = false;
        }
        if let Some(new) = self.graph.get_mut(destination) {
            new.current = true;
            if new.visit() {
                new.parent = Some(previous);
            }
        }
        self.current = destination;
        // Enemies stay behind with their location, so any fight is over.
        if self.combat.in_progress() {
            self.combat.end(&mut self.log);
        }
        self.combat.forget_npcs();

        tracing::info!(room_id = %self.id, from = %previous, to = %destination, "party travelled");
    }

    fn short_description(&self, location: LocationId) -> String {
        self.graph
            .get(location)
            .map(|location| location.description_short.clone())
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------
    // Actions and items
    // -----------------------------------------------------------------

    fn perform(&mut self, index: usize, action_id: &str) {
        let player_id = self.players[index].id;
        let Some(location) = self.graph.get_mut(self.current) else {
            return;
        };
        let Some(action) = location.actions.get_mut(action_id) else {
            tracing::debug!(room_id = %self.id, %player_id, action = action_id, "no such action");
            return;
        };
        match action.attempt(&self.players[index]) {
            ActionOutcome::Performed(effects) => {
                for effect in effects {
                    self.apply(index, effect);
                }
            }
            ActionOutcome::Blocked(Some(message)) => {
                self.log.tell(message, player_id);
            }
            ActionOutcome::Blocked(None) | ActionOutcome::Exhausted => {}
        }
    }

    fn apply(&mut self, index: usize, effect: Effect) {
        let player_id = self.players[index].id;
        match effect {
            Effect::Message { text } => {
                self.log.tell_all(text);
            }
            Effect::GiveItem { item } => {
                self.log.tell(format!("You received {}", item.name), player_id);
                self.players[index].give(item);
            }
            Effect::DropItem { item } => {
                if let Some(location) = self.graph.get_mut(self.current) {
                    location.items.push(item);
                }
            }
            Effect::SpawnNpc { npc } => {
                self.log.tell_all(format!("{} appears", npc.name));
                if let Some(location) = self.graph.get_mut(self.current) {
                    location.npcs.push(npc);
                }
            }
            Effect::Heal { amount } => self.players[index].heal(amount),
        }
    }

    /// Own inventory first, then the floor of the current location.
    fn inspect(&self, index: usize, key: &str) -> Reply {
        self.players[index]
            .inventory
            .get(key)
            .or_else(|| self.graph.get(self.current)?.items.get(key))
            .map_or(Reply::Null, |item| Reply::Item(item.detail()))
    }

    fn pickup(&mut self, index: usize, key: &str) -> bool {
        let Some(location) = self.graph.get_mut(self.current) else {
            return false;
        };
        let Some(name) = location.items.get(key).map(|item| item.name.clone()) else {
            return false;
        };
        let player = &mut self.players[index];
        if !player.pickup(&mut location.items, key) {
            return false;
        }
        let player_id = player.id;
        self.log
            .tell_all_except(format!("{} picked up {name}", player.name), player_id);
        self.log.tell(format!("You picked up {name}"), player_id);
        true
    }

    fn drop_item(&mut self, index: usize, key: &str) -> bool {
        let Some(location) = self.graph.get_mut(self.current) else {
            return false;
        };
        let player = &mut self.players[index];
        let Some(name) = player.inventory.get(key).map(|item| item.name.clone()) else {
            return false;
        };
        if !player.drop_item(&mut location.items, key) {
            return false;
        }
        let player_id = player.id;
        self.log
            .tell_all_except(format!("{} dropped {name}", player.name), player_id);
        self.log.tell(format!("You dropped {name}"), player_id);
        true
    }

    fn use_item(&mut self, index: usize, key: &str) -> bool {
        let player = &mut self.players[index];
        let Some(name) = player.inventory.get(key).map(|item| item.name.clone()) else {
            return false;
        };
        if !player.use_item(key) {
            return false;
        }
        let player_id = player.id;
        self.log.tell(format!("You used {name}"), player_id);
        true
    }

    // -----------------------------------------------------------------
    // View
    // -----------------------------------------------------------------

    /// Builds `player_id`'s view of the room.
    ///
    /// Generating a view is also what pulls the party into a fight:
    /// hostile NPCs of the current location are enrolled, and combat
    /// starts when both sides have someone standing.
    pub(crate) fn view(&mut self, player_id: PlayerId) -> Reply {
        let mut recruits: Vec<FighterRef> = self
            .players
            .iter()
            .map(|player| FighterRef::Player(player.id))
            .collect();
        if let Some(location) = self.graph.get(self.current) {
            recruits.extend(
                location
                    .npcs
                    .iter()
                    .filter(|npc| npc.is_hostile())
                    .map(|npc| FighterRef::Npc(npc.guid)),
            );
        }
        for fighter in recruits {
            self.combat.enroll(fighter);
        }
        self.with_roster(|combat, roster, log| {
            combat.start(roster, log);
            combat.settle(roster, log);
        });

        let history = self.log.deliver(player_id);
        let Some(location) = self.graph.get(self.current) else {
            return Reply::Null;
        };

        let mut view = RoomView {
            name: location.name.clone(),
            description: location.description.clone(),
            history,
            exits: BTreeMap::new(),
            actions: BTreeMap::new(),
            items: None,
            npcs: location.npcs.iter().map(Npc::view).collect(),
            combat: None,
        };

        match self.combat.current() {
            Some(current) => {
                let (id, guid) = self
                    .fighter_label(current)
                    .unwrap_or_else(|| (String::new(), Guid(0)));
                view.combat = Some(CombatView {
                    your_turn: current == FighterRef::Player(player_id),
                    id,
                    guid,
                });
            }
            None => {
                view.items = Some(location.items.views());
                view.exits = self.graph.exit_descriptions(self.current);
                view.actions = location
                    .actions
                    .values()
                    .filter(|action| action.has_charges())
                    .map(|action| (action.id.clone(), action.description.clone()))
                    .collect();
            }
        }
        Reply::View(view)
    }

    fn fighter_label(&self, key: FighterRef) -> Option<(String, Guid)> {
        match key {
            FighterRef::Player(id) => self
                .players
                .iter()
                .find(|player| player.id == id)
                .map(|player| (player.username.clone(), player.guid)),
            FighterRef::Npc(guid) => self
                .graph
                .get(self.current)?
                .npcs
                .iter()
                .find(|npc| npc.guid == guid)
                .map(|npc| (npc.id.clone(), npc.guid)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wayfarer_protocol::HistoryEntry;
    use crate::combat::CombatState;
    use wayfarer_world::{Action, Item, ItemKind, Location};

    const ALICE: PlayerId = PlayerId(1);
    const BOB: PlayerId = PlayerId(2);

    fn temp_store(tag: &str) -> RoomStore {
        RoomStore::new(std::env::temp_dir().join(format!(
            "wayfarer-state-{tag}-{}",
            std::process::id()
        )))
    }

    /// camp --north--> forest --east--> lair (goblin)
    fn world() -> LocationGraph {
        let camp = Location::new("camp", "Camp", "the camp")
            .with_item(Item::new("torch", "Torch", ItemKind::Misc))
            .with_action(
                Action::new("search", "Search the tent")
                    .with_charges(1)
                    .with_effect(Effect::GiveItem {
                        item: Item::new("map", "Map", ItemKind::Misc),
                    }),
            )
            .with_action(
                Action::new("unlock", "Unlock the chest").requires_item("key", "You need a key."),
            )
            .with_action(
                Action::new("horn", "Blow the horn")
                    .with_charges(1)
                    .with_effect(Effect::SpawnNpc {
                        npc: Npc::hostile("ogre", "Ogre", 40.0, 3.0),
                    }),
            );
        let mut graph = LocationGraph::new(camp);
        let forest = graph.add(Location::new("forest", "Forest", "the forest"));
        let lair = graph.add(
            Location::new("lair", "Lair", "a goblin lair")
                .with_npc(Npc::hostile("goblin", "Goblin", 15.0, 5.0)),
        );
        graph.connect(graph.start(), "north", forest);
        graph.connect(forest, "east", lair);
        graph
    }

    fn room(tag: &str) -> Room {
        let config = RoomConfig {
            rng_seed: Some(1),
            ..RoomConfig::default()
        };
        Room::restore(
            SavedRoom::fresh(RoomId::from(tag), world()),
            config,
            temp_store(tag),
        )
    }

    fn player(id: PlayerId, name: &str) -> Player {
        Player::new(id, &name.to_lowercase(), name)
    }

    fn texts(history: &[HistoryEntry]) -> Vec<&str> {
        history.iter().map(|e| e.text.as_str()).collect()
    }

    fn view(reply: Reply) -> RoomView {
        match reply {
            Reply::View(view) => view,
            other => panic!("expected a view, got {other:?}"),
        }
    }

    #[test]
    fn test_non_member_gets_null() {
        let mut room = room("non-member");
        let reply = room.process(ALICE, Verb::Look, "", Instant::now());
        assert!(reply.is_null());
    }

    #[test]
    fn test_join_broadcasts_to_others_only() {
        let mut room = room("join");
        room.join(player(ALICE, "Alice")).unwrap();
        room.join(player(BOB, "Bob")).unwrap();

        let alice = view(room.process(ALICE, Verb::Look, "", Instant::now()));
        assert_eq!(texts(&alice.history), vec!["Bob has joined the party"]);
        let bob = view(room.process(BOB, Verb::Look, "", Instant::now()));
        assert!(bob.history.is_empty());
    }

    #[test]
    fn test_join_twice_and_full_room_rejected() {
        let mut room = Room::restore(
            SavedRoom::fresh(RoomId::from("full"), world()),
            RoomConfig {
                max_players: 1,
                ..RoomConfig::default()
            },
            temp_store("full"),
        );
        room.join(player(ALICE, "Alice")).unwrap();
        assert!(matches!(
            room.join(player(ALICE, "Alice")),
            Err(RoomError::AlreadyInRoom(..))
        ));
        assert!(matches!(
            room.join(player(BOB, "Bob")),
            Err(RoomError::RoomFull(_))
        ));
    }

    #[test]
    fn test_view_lists_items_exits_and_charged_actions() {
        let mut room = room("view");
        room.join(player(ALICE, "Alice")).unwrap();
        let view = view(room.process(ALICE, Verb::Look, "", Instant::now()));

        assert_eq!(view.name, "Camp");
        assert_eq!(view.exits.get("north").map(String::as_str), Some("the forest"));
        assert!(view.actions.contains_key("search"));
        assert_eq!(view.items.as_ref().map(Vec::len), Some(1));
        assert!(view.combat.is_none());
    }

    #[test]
    fn test_single_player_travels_without_vote() {
        let mut room = room("solo-travel");
        room.join(player(ALICE, "Alice")).unwrap();
        let view = view(room.process(ALICE, Verb::Go, "north", Instant::now()));

        assert_eq!(view.name, "Forest");
        assert!(!room.vote.is_active());
        assert_eq!(view.exits.get("back").map(String::as_str), Some("the camp"));
        assert!(texts(&view.history).contains(&"You went to the forest"));
        assert_eq!(room.info().location, "forest");
    }

    #[test]
    fn test_bad_exit_is_ignored() {
        let mut room = room("bad-exit");
        room.join(player(ALICE, "Alice")).unwrap();
        let view = view(room.process(ALICE, Verb::Go, "up", Instant::now()));
        assert_eq!(view.name, "Camp");
        // No parent yet, so "back" goes nowhere either.
        let view_back = view_of(&mut room, Verb::Go, "back");
        assert_eq!(view_back.name, "Camp");
    }

    fn view_of(room: &mut Room, verb: Verb, param: &str) -> RoomView {
        view(room.process(ALICE, verb, param, Instant::now()))
    }

    #[test]
    fn test_two_player_vote_resolves_when_unanimous() {
        let mut room = room("vote");
        room.join(player(ALICE, "Alice")).unwrap();
        room.join(player(BOB, "Bob")).unwrap();
        let now = Instant::now();

        room.process(ALICE, Verb::Go, "north", now);
        assert!(room.vote.is_active());
        assert_eq!(room.info().location, "camp");

        let bob = view(room.process(BOB, Verb::Go, "north", now));
        assert_eq!(bob.name, "Forest");
        assert!(!room.vote.is_active());
        assert!(texts(&bob.history).contains(&"You want to go to the forest (2 of 2 players voted)"));
    }

    #[test]
    fn test_expired_vote_resolves_on_any_command() {
        let mut room = room("expire");
        room.join(player(ALICE, "Alice")).unwrap();
        room.join(player(BOB, "Bob")).unwrap();
        let now = Instant::now();

        room.process(ALICE, Verb::Go, "north", now);
        let early = view(room.process(BOB, Verb::Look, "", now + Duration::from_secs(9)));
        assert_eq!(early.name, "Camp");

        let late = view(room.process(BOB, Verb::Look, "", now + Duration::from_secs(10)));
        assert_eq!(late.name, "Forest");
    }

    #[test]
    fn test_travel_during_combat_leaves_the_fight() {
        let mut room = room("combat-travel");
        room.join(player(ALICE, "Alice")).unwrap();
        view_of(&mut room, Verb::Go, "north");
        let lair = view_of(&mut room, Verb::Go, "east");

        assert_eq!(lair.name, "Lair");
        assert!(lair.combat.is_some());
        assert!(lair.exits.is_empty());
        assert!(lair.items.is_none());

        let fled = view_of(&mut room, Verb::Go, "back");
        assert_eq!(fled.name, "Forest");
        assert!(fled.combat.is_none());
        assert!(texts(&fled.history).contains(&"Combat is over"));
        assert_eq!(room.info().combat, CombatState::Idle);
        assert!(fled.exits.contains_key("east"));

        // The goblin is still waiting.
        let again = view_of(&mut room, Verb::Go, "east");
        assert!(again.combat.is_some());
    }

    #[test]
    fn test_vote_expiring_mid_fight_ends_combat() {
        let mut room = room("vote-fight");
        room.join(player(ALICE, "Alice")).unwrap();
        room.join(player(BOB, "Bob")).unwrap();
        let now = Instant::now();

        room.process(ALICE, Verb::Go, "north", now);
        let horn = view(room.process(BOB, Verb::Do, "horn", now));
        assert!(horn.combat.is_some());
        assert!(room.vote.is_active());

        let moved = view(room.process(ALICE, Verb::Look, "", now + Duration::from_secs(11)));
        assert_eq!(moved.name, "Forest");
        assert!(moved.combat.is_none());
        assert!(texts(&moved.history).contains(&"Combat is over"));
        assert_eq!(room.info().combat, CombatState::Idle);
        assert!(room.combat.current().is_none());

        // Nobody is stuck: travel still works.
        let back = view(room.process(ALICE, Verb::Go, "back", now + Duration::from_secs(12)));
        assert_eq!(back.name, "Forest");
        let back = view(room.process(BOB, Verb::Go, "back", now + Duration::from_secs(12)));
        assert_eq!(back.name, "Camp");
    }

    #[test]
    fn test_attack_kills_goblin_and_combat_ends() {
        let mut room = room("fight");
        room.join(player(ALICE, "Alice")).unwrap();
        view_of(&mut room, Verb::Go, "north");
        let lair = view_of(&mut room, Verb::Go, "east");
        let combat = lair.combat.unwrap();
        assert!(combat.your_turn);
        assert_eq!(combat.id, "alice");

        view_of(&mut room, Verb::Attack, "goblin");
        let done = view_of(&mut room, Verb::Attack, "goblin");

        assert!(done.combat.is_none());
        assert!(texts(&done.history).contains(&"Goblin has been slain"));
        assert_eq!(room.players[0].health, 97.0);
    }

    #[test]
    fn test_attack_on_missing_target_keeps_turn() {
        let mut room = room("miss");
        room.join(player(ALICE, "Alice")).unwrap();
        view_of(&mut room, Verb::Go, "north");
        view_of(&mut room, Verb::Go, "east");

        let after = view_of(&mut room, Verb::Attack, "dragon");
        assert!(after.combat.unwrap().your_turn);
        assert_eq!(room.players[0].health, 100.0);
    }

    #[test]
    fn test_do_action_spends_charge_and_gives_item() {
        let mut room = room("do");
        room.join(player(ALICE, "Alice")).unwrap();
        let view = view_of(&mut room, Verb::Do, "search");

        assert!(!view.actions.contains_key("search"));
        assert!(room.players[0].owns("map"));
        assert!(texts(&view.history).contains(&"You received Map"));
    }

    #[test]
    fn test_blocked_action_tells_only_actor() {
        let mut room = room("blocked");
        room.join(player(ALICE, "Alice")).unwrap();
        room.join(player(BOB, "Bob")).unwrap();
        let alice = view_of(&mut room, Verb::Do, "unlock");
        assert!(texts(&alice.history).contains(&"You need a key."));

        let bob = view(room.process(BOB, Verb::Look, "", Instant::now()));
        assert!(!texts(&bob.history).contains(&"You need a key."));
    }

    #[test]
    fn test_item_verbs() {
        let mut room = room("items");
        room.join(player(ALICE, "Alice")).unwrap();

        assert!(matches!(
            room.process(ALICE, Verb::Inspect, "torch", Instant::now()),
            Reply::Item(_)
        ));
        assert!(room.process(ALICE, Verb::Pickup, "", Instant::now()).is_null());
        assert!(room.process(ALICE, Verb::Pickup, "rope", Instant::now()).is_null());

        let after = view_of(&mut room, Verb::Pickup, "torch");
        assert_eq!(after.items.as_ref().map(Vec::len), Some(0));
        let Reply::Inventory(items) = room.process(ALICE, Verb::Inventory, "", Instant::now())
        else {
            panic!("expected inventory");
        };
        assert_eq!(items.len(), 1);

        assert!(room.process(ALICE, Verb::Use, "torch", Instant::now()).is_null());
        assert!(room.process(ALICE, Verb::Equip, "torch", Instant::now()).is_null());
        assert!(matches!(
            room.process(ALICE, Verb::Stats, "", Instant::now()),
            Reply::Stats(_)
        ));

        let dropped = view_of(&mut room, Verb::Drop, "torch");
        assert_eq!(dropped.items.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_unknown_and_ability_reply_null() {
        let mut room = room("null");
        room.join(player(ALICE, "Alice")).unwrap();
        assert!(room.process(ALICE, Verb::from("dance"), "", Instant::now()).is_null());
        assert!(room.process(ALICE, Verb::Ability, "fireball", Instant::now()).is_null());
    }

    #[test]
    fn test_leave_removes_vote_and_reports() {
        let mut room = room("leave");
        room.join(player(ALICE, "Alice")).unwrap();
        room.join(player(BOB, "Bob")).unwrap();
        room.process(BOB, Verb::Go, "north", Instant::now());

        let bob = room.leave(BOB).unwrap();
        assert_eq!(bob.username, "bob");
        assert_eq!(room.vote.choice(BOB), None);
        assert!(matches!(room.leave(BOB), Err(RoomError::NotInRoom(..))));

        let alice = view_of(&mut room, Verb::Look, "");
        assert!(texts(&alice.history).contains(&"Bob has left the party"));
    }
}
