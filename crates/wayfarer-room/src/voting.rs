//! Travel votes: how a room with several players picks its next location.
//!
//! A vote opens on the first `go` request and stays open until either
//! every connected player has chosen a destination or its deadline
//! passes. There is no timer: the room checks the deadline when it
//! processes the next command.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use wayfarer_protocol::PlayerId;
use wayfarer_world::LocationId;

#[derive(Debug, Default)]
pub(crate) struct TravelVote {
    /// `Some` while a vote is open.
    deadline: Option<Instant>,
    choices: HashMap<PlayerId, LocationId>,
}

impl TravelVote {
    pub(crate) fn is_active(&self) -> bool {
        self.deadline.is_some()
    }

    /// `true` if a vote is open and its deadline has passed.
    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= now)
    }

    #[cfg(test)]
    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Records (or overwrites) `player`'s choice. Opens the vote with a
    /// deadline of `now + timeout` if none is open; an open vote keeps
    /// its original deadline.
    pub(crate) fn cast(
        &mut self,
        player: PlayerId,
        destination: LocationId,
        now: Instant,
        timeout: Duration,
    ) {
        if self.deadline.is_none() {
            self.deadline = Some(now + timeout);
        }
        self.choices.insert(player, destination);
    }

    #[cfg(test)]
    pub(crate) fn choice(&self, player: PlayerId) -> Option<LocationId> {
        self.choices.get(&player).copied()
    }

    /// Forgets a departing player's choice.
    pub(crate) fn withdraw(&mut self, player: PlayerId) {
        self.choices.remove(&player);
    }

    /// `(voted, total)` over the current roster.
    pub(crate) fn tally(&self, roster: &[PlayerId]) -> (usize, usize) {
        let voted = roster
            .iter()
            .filter(|player| self.choices.contains_key(*player))
            .count();
        (voted, roster.len())
    }

    /// `true` if every player on the roster has a recorded choice.
    pub(crate) fn is_unanimous(&self, roster: &[PlayerId]) -> bool {
        !roster.is_empty() && roster.iter().all(|player| self.choices.contains_key(player))
    }

    /// The destination with the most votes among roster members. Ties are
    /// broken uniformly at random among every tied destination.
    pub(crate) fn winner<R: Rng>(
        &self,
        roster: &[PlayerId],
        rng: &mut R,
    ) -> Option<LocationId> {
        // BTreeMap keeps candidate order stable, so a seeded rng gives
        // reproducible picks.
        let mut counts: BTreeMap<LocationId, usize> = BTreeMap::new();
        for destination in roster.iter().filter_map(|player| self.choices.get(player)) {
            *counts.entry(*destination).or_default() += 1;
        }

        let best = counts.values().copied().max()?;
        let tied: Vec<LocationId> = counts
            .into_iter()
            .filter(|&(_, votes)| votes == best)
            .map(|(destination, _)| destination)
            .collect();
        Some(tied[rng.random_range(0..tied.len())])
    }

    /// Closes the vote and clears every recorded choice.
    pub(crate) fn reset(&mut self) {
        self.deadline = None;
        self.choices.clear();
    }
}
