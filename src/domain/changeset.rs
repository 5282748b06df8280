use serde::Serialize;
use std::fmt::Display;

use crate::domain::records::{
    MatchEventRecord, MatchPlayerRecord, PlayerStatRecord, Stored, TeamStatRecord,
};

/// A record that carries its own reconciliation key.
pub trait Keyed {
    type Key: Ord + Clone + Display;
    fn key(&self) -> &Self::Key;
}

/// An existing record paired with the incoming values that replace it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Update<E, D> {
    pub existing: E,
    pub incoming: D,
}

/// Create/update/delete partition between incoming and persisted records.
///
/// Every key lands in exactly one list: incoming-only keys in `to_create`,
/// keys present on both sides in `to_update`, persisted-only keys in
/// `to_delete`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeSet<D, E> {
    pub to_create: Vec<D>,
    pub to_update: Vec<Update<E, D>>,
    pub to_delete: Vec<E>,
}

impl<D, E> Default for ChangeSet<D, E> {
    fn default() -> Self {
        Self {
            to_create: Vec::new(),
            to_update: Vec::new(),
            to_delete: Vec::new(),
        }
    }
}

impl<D, E> ChangeSet<D, E> {
    pub fn summary(&self) -> Summary {
        Summary::new(self.to_create.len(), self.to_update.len(), self.to_delete.len())
    }

    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    /// Number of distinct keys this change-set touches.
    pub fn len(&self) -> usize {
        self.to_create.len() + self.to_update.len() + self.to_delete.len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
    pub total: usize,
}

impl Summary {
    pub fn new(creates: usize, updates: usize, deletes: usize) -> Self {
        Self {
            creates,
            updates,
            deletes,
            total: creates + updates + deletes,
        }
    }
}

pub type PlayerChangeSet = ChangeSet<MatchPlayerRecord, Stored<MatchPlayerRecord>>;
pub type EventChangeSet = ChangeSet<MatchEventRecord, Stored<MatchEventRecord>>;
pub type PlayerStatChangeSet = ChangeSet<PlayerStatRecord, Stored<PlayerStatRecord>>;
pub type TeamStatChangeSet = ChangeSet<TeamStatRecord, Stored<TeamStatRecord>>;

/// All change-sets for one fixture sync, applied in a single transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchChangeSets {
    pub players: PlayerChangeSet,
    pub events: EventChangeSet,
    pub player_stats: PlayerStatChangeSet,
    pub team_stats: TeamStatChangeSet,
}

impl MatchChangeSets {
    pub fn summary(&self) -> SyncSummary {
        let players = self.players.summary();
        let events = self.events.summary();
        let player_stats = self.player_stats.summary();
        let team_stats = self.team_stats.summary();
        SyncSummary {
            total_changes: players.total + events.total + player_stats.total + team_stats.total,
            players,
            events,
            player_stats,
            team_stats,
        }
    }
}

/// Per-kind counts of one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub players: Summary,
    pub events: Summary,
    pub player_stats: Summary,
    pub team_stats: Summary,
    pub total_changes: usize,
}
