//! Append-only room history with per-player delivery cursors.
//!
//! Every message gets the next id from a room-scoped counter. Each
//! player has a cursor: the highest id already shown to them. A delivery
//! returns everything newer than the cursor that the player may see, then
//! moves the cursor forward. Cursors never move backwards, so nothing is
//! delivered twice and nothing visible is skipped.

use std::collections::HashMap;

use wayfarer_protocol::{HistoryEntry, PlayerId, Recipient};

/// A single history entry and who may see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MessageObject {
    pub(crate) id: u64,
    pub(crate) text: String,
    pub(crate) visibility: Recipient,
}

#[derive(Debug, Default)]
pub(crate) struct MessageLog {
    entries: Vec<MessageObject>,
    last_id: u64,
    cursors: HashMap<PlayerId, u64>,
}

impl MessageLog {
    /// Creates an empty log whose next id follows `last_id`. Used when a
    /// room is restored so ids keep increasing across restarts.
    pub(crate) fn resume(last_id: u64) -> Self {
        Self {
            last_id,
            ..Self::default()
        }
    }

    pub(crate) fn last_id(&self) -> u64 {
        self.last_id
    }

    pub(crate) fn push(&mut self, text: String, visibility: Recipient) -> u64 {
        self.last_id += 1;
        self.entries.push(MessageObject {
            id: self.last_id,
            text,
            visibility,
        });
        self.last_id
    }

    pub(crate) fn tell_all(&mut self, text: impl Into<String>) -> u64 {
        self.push(text.into(), Recipient::All)
    }

    pub(crate) fn tell_all_except(&mut self, text: impl Into<String>, player: PlayerId) -> u64 {
        self.push(text.into(), Recipient::AllExcept(player))
    }

    pub(crate) fn tell(&mut self, text: impl Into<String>, player: PlayerId) -> u64 {
        self.push(text.into(), Recipient::Player(player))
    }

    /// Starts tracking `player` from the current end of the log, so a
    /// newcomer does not receive the backlog.
    pub(crate) fn subscribe(&mut self, player: PlayerId) {
        self.cursors.insert(player, self.last_id);
    }

    pub(crate) fn unsubscribe(&mut self, player: PlayerId) {
        self.cursors.remove(&player);
    }

    #[cfg(test)]
    pub(crate) fn cursor(&self, player: PlayerId) -> Option<u64> {
        self.cursors.get(&player).copied()
    }

    /// Returns every undelivered message visible to `player` in id order
    /// and advances their cursor to the highest id returned.
    pub(crate) fn deliver(&mut self, player: PlayerId) -> Vec<HistoryEntry> {
        let from = *self.cursors.entry(player).or_insert(0);

        // Entries are sorted by id, so skip straight past the cursor.
        let start = self.entries.partition_point(|entry| entry.id <= from);
        let delivered: Vec<HistoryEntry> = self.entries[start..]
            .iter()
            .filter(|entry| entry.visibility.is_visible_to(player))
            .map(|entry| HistoryEntry {
                id: entry.id,
                text: entry.text.clone(),
            })
            .collect();

        if let Some(last) = delivered.last() {
            self.cursors.insert(player, last.id);
        }
        delivered
    }
}
