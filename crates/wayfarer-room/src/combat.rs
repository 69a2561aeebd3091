//! Turn-based combat: who fights, whose turn it is, and what a turn does.
//!
//! The queue never owns fighters. It stores [`FighterRef`] keys and looks
//! the entities up through a [`Roster`] the room builds from its players
//! and the current location's NPCs. That keeps one owner per entity and
//! lets the same queue drive players and NPCs uniformly through the
//! [`Fighter`] trait.
//!
//! ```text
//!        enroll + both teams alive
//!   Idle ─────────────────────────→ InProgress
//!    ↑                                  │
//!    └──── one team has nobody alive ───┘
//! ```

use std::collections::HashSet;
use std::fmt;

use wayfarer_protocol::{Guid, PlayerId};
use wayfarer_world::{Fighter, Npc, Player, Team};

use crate::history::MessageLog;

/// Key identifying an enrolled fighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum FighterRef {
    Player(PlayerId),
    Npc(Guid),
}

/// Resolves fighter keys to the entities they name.
pub(crate) trait Roster {
    fn fighter(&self, key: FighterRef) -> Option<&dyn Fighter>;
    fn fighter_mut(&mut self, key: FighterRef) -> Option<&mut dyn Fighter>;
}

/// The roster a room lends to the queue: its players and the NPCs of the
/// current location.
pub(crate) struct Combatants<'a> {
    pub(crate) players: &'a mut [Player],
    pub(crate) npcs: &'a mut [Npc],
}

impl Roster for Combatants<'_> {
    fn fighter(&self, key: FighterRef) -> Option<&dyn Fighter> {
        match key {
            FighterRef::Player(id) => self
                .players
                .iter()
                .find(|player| player.id == id)
                .map(|player| player as &dyn Fighter),
            FighterRef::Npc(guid) => self
                .npcs
                .iter()
                .find(|npc| npc.guid == guid)
                .map(|npc| npc as &dyn Fighter),
        }
    }

    fn fighter_mut(&mut self, key: FighterRef) -> Option<&mut dyn Fighter> {
        match key {
            FighterRef::Player(id) => self
                .players
                .iter_mut()
                .find(|player| player.id == id)
                .map(|player| player as &mut dyn Fighter),
            FighterRef::Npc(guid) => self
                .npcs
                .iter_mut()
                .find(|npc| npc.guid == guid)
                .map(|npc| npc as &mut dyn Fighter),
        }
    }
}

/// Whether a fight is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombatState {
    #[default]
    Idle,
    InProgress,
}

impl fmt::Display for CombatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::InProgress => write!(f, "InProgress"),
        }
    }
}

/// Damage dealt by one blow. Never below one point before the defensive
/// stance halves it, so every fight finishes.
fn strike_damage(attack: f64, defense: f64, guarded: bool) -> f64 {
    let base = (attack - defense).max(1.0);
    if guarded { base / 2.0 } else { base }
}

fn is_alive(roster: &impl Roster, key: FighterRef) -> bool {
    roster.fighter(key).is_some_and(|fighter| fighter.is_alive())
}

#[derive(Debug, Default)]
pub(crate) struct CombatQueue {
    state: CombatState,
    /// Turn rotation in enrollment order.
    order: Vec<FighterRef>,
    /// Index into `order` of the fighter on turn. Only meaningful while
    /// in progress, where it always names a living fighter.
    turn: usize,
    /// Fighters in a defensive stance until their next turn.
    defending: HashSet<FighterRef>,
}

impl CombatQueue {
    pub(crate) fn state(&self) -> CombatState {
        self.state
    }

    pub(crate) fn in_progress(&self) -> bool {
        self.state == CombatState::InProgress
    }

    /// Adds a fighter to the end of the rotation if not already enrolled.
    pub(crate) fn enroll(&mut self, key: FighterRef) {
        if !self.order.contains(&key) {
            self.order.push(key);
        }
    }

    #[cfg(test)]
    pub(crate) fn is_enrolled(&self, key: FighterRef) -> bool {
        self.order.contains(&key)
    }

    /// The fighter on turn, while combat is in progress.
    pub(crate) fn current(&self) -> Option<FighterRef> {
        if self.in_progress() {
            self.order.get(self.turn).copied()
        } else {
            None
        }
    }

    #[cfg(test)]
    pub(crate) fn is_defending(&self, key: FighterRef) -> bool {
        self.defending.contains(&key)
    }

    /// `true` if both teams have a living enrolled fighter.
    pub(crate) fn is_available(&self, roster: &impl Roster) -> bool {
        let mut players = false;
        let mut monsters = false;
        for fighter in self.order.iter().filter_map(|key| roster.fighter(*key)) {
            if fighter.is_alive() {
                match fighter.team() {
                    Team::Players => players = true,
                    Team::Monsters => monsters = true,
                }
            }
        }
        players && monsters
    }

    /// Idle → InProgress, if both sides can fight. The first living
    /// fighter in enrollment order takes the first turn.
    pub(crate) fn start(&mut self, roster: &impl Roster, log: &mut MessageLog) -> bool {
        if self.in_progress() || !self.is_available(roster) {
            return false;
        }
        self.order.retain(|key| is_alive(roster, *key));
        self.turn = 0;
        self.defending.clear();
        self.state = CombatState::InProgress;
        log.tell_all("Combat has begun!");
        tracing::info!(fighters = self.order.len(), "combat started");
        true
    }

    /// The fighter on turn attacks `target`.
    ///
    /// Returns `false` without touching the turn when there is no fight,
    /// or the target is missing, dead, or on the attacker's team.
    pub(crate) fn attack(
        &mut self,
        roster: &mut impl Roster,
        log: &mut MessageLog,
        target: FighterRef,
    ) -> bool {
        let Some(attacker) = self.current() else {
            return false;
        };
        if !self.strike(roster, log, attacker, target) {
            return false;
        }
        self.advance(roster, log);
        true
    }

    /// The fighter on turn takes a defensive stance, ending its turn.
    pub(crate) fn defend(&mut self, roster: &mut impl Roster, log: &mut MessageLog) -> bool {
        let Some(current) = self.current() else {
            return false;
        };
        if let Some(fighter) = roster.fighter(current) {
            log.tell_all(format!("{} raises their guard", fighter.display_name()));
        }
        self.defending.insert(current);
        self.advance(roster, log);
        true
    }

    /// Resolves one non-interactive turn: attack the first living
    /// opponent in rotation order, then pass the turn on.
    pub(crate) fn auto_turn(&mut self, roster: &mut impl Roster, log: &mut MessageLog) {
        let Some(current) = self.current() else {
            return;
        };
        if let Some(target) = self.pick_target(roster, current) {
            self.strike(roster, log, current, target);
        }
        self.advance(roster, log);
    }

    /// Runs automatic turns until combat ends or an interactive fighter
    /// is on turn.
    pub(crate) fn settle(&mut self, roster: &mut impl Roster, log: &mut MessageLog) {
        while let Some(current) = self.current() {
            match roster.fighter(current).map(|fighter| fighter.is_interactive()) {
                Some(true) => break,
                Some(false) => self.auto_turn(roster, log),
                // The fighter vanished; skip past it.
                None => self.normalize(roster, log),
            }
        }
    }

    /// Drops a fighter from the rotation (e.g. a player leaving the room).
    ///
    /// The removed fighter must already be gone from `roster`.
    pub(crate) fn remove(
        &mut self,
        roster: &impl Roster,
        log: &mut MessageLog,
        key: FighterRef,
    ) {
        let Some(pos) = self.order.iter().position(|k| *k == key) else {
            return;
        };
        self.order.remove(pos);
        self.defending.remove(&key);
        if pos < self.turn {
            self.turn -= 1;
        }
        if self.turn >= self.order.len() {
            self.turn = 0;
        }
        self.normalize(roster, log);
    }

    /// Forgets every enrolled NPC. Used when the party leaves a location
    /// outside of combat.
    pub(crate) fn forget_npcs(&mut self) {
        if !self.in_progress() {
            self.order.retain(|key| matches!(key, FighterRef::Player(_)));
        }
    }

    fn pick_target(&self, roster: &impl Roster, attacker: FighterRef) -> Option<FighterRef> {
        let team = roster.fighter(attacker)?.team();
        self.order.iter().copied().find(|key| {
            roster
                .fighter(*key)
                .is_some_and(|fighter| fighter.is_alive() && fighter.team() != team)
        })
    }

    fn strike(
        &mut self,
        roster: &mut impl Roster,
        log: &mut MessageLog,
        attacker: FighterRef,
        target: FighterRef,
    ) -> bool {
        let Some((power, attacker_name, attacker_team)) = roster.fighter(attacker).map(|f| {
            (f.attack_power(), f.display_name().to_string(), f.team())
        }) else {
            return false;
        };
        let guarded = self.defending.contains(&target);
        let Some(victim) = roster.fighter_mut(target) else {
            return false;
        };
        if !victim.is_alive() || victim.team() == attacker_team {
            return false;
        }

        let damage = strike_damage(power, victim.defense(), guarded);
        let taken = victim.take_damage(damage);
        let victim_name = victim.display_name().to_string();
        let slain = !victim.is_alive();

        log.tell_all(format!("{attacker_name} attacks {victim_name} for {taken} damage"));
        if slain {
            log.tell_all(format!("{victim_name} has been slain"));
        }
        true
    }

    fn advance(&mut self, roster: &impl Roster, log: &mut MessageLog) {
        if !self.in_progress() || self.order.is_empty() {
            return;
        }
        self.turn = (self.turn + 1) % self.order.len();
        self.normalize(roster, log);
        if let Some(current) = self.current() {
            self.defending.remove(&current);
        }
    }

    /// Recomputes the rotation: dead and vanished fighters are dropped,
    /// the turn moves to the first living fighter at or after the current
    /// slot, and combat ends if a side has nobody left.
    fn normalize(&mut self, roster: &impl Roster, log: &mut MessageLog) {
        if !self.in_progress() {
            return;
        }
        let len = self.order.len();
        let on_turn = (0..len)
            .map(|step| self.order[(self.turn + step) % len])
            .find(|key| is_alive(roster, *key));
        self.order.retain(|key| is_alive(roster, *key));

        match on_turn {
            Some(next) if self.is_available(roster) => {
                self.turn = self.order.iter().position(|k| *k == next).unwrap_or(0);
            }
            _ => self.end(log),
        }
    }

    /// Stops the fight and forgets every enrolled NPC.
    pub(crate) fn end(&mut self, log: &mut MessageLog) {
        self.state = CombatState::Idle;
        self.turn = 0;
        self.defending.clear();
        self.order.retain(|key| matches!(key, FighterRef::Player(_)));
        log.tell_all("Combat is over");
        tracing::info!("combat ended");
    }
}
