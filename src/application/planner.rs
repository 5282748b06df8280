use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::application::identity::MergedPlayers;
use crate::domain::changeset::{ChangeSet, Keyed, MatchChangeSets, Update};
use crate::domain::errors::{DroppedRecord, RecordKind, SyncError};
use crate::domain::records::{
    ExistingMatch, MatchEventRecord, MatchPlayerRecord, PlayerStatRecord, TeamStatRecord,
};

// ─── Change-Set Planner ───

/// Partitions freshly observed records against persisted ones by key.
///
/// Updates are unconditional: a key present on both sides is always paired,
/// persistence applies the incoming values wholesale. `to_create` and
/// `to_update` follow incoming order, `to_delete` follows existing order.
#[derive(Debug, Default)]
pub struct ChangeSetPlanner;

impl ChangeSetPlanner {
    pub fn new() -> Self {
        Self
    }

    pub fn plan<K, D, E>(&self, incoming: Vec<D>, existing: Vec<E>) -> ChangeSet<D, E>
    where
        K: Ord + Clone + std::fmt::Display,
        D: Keyed<Key = K>,
        E: Keyed<Key = K>,
    {
        let mut existing_slots: Vec<Option<E>> = Vec::with_capacity(existing.len());
        let mut existing_index: BTreeMap<K, usize> = BTreeMap::new();
        let mut duplicates = Vec::new();

        for entity in existing {
            if existing_index.contains_key(entity.key()) {
                // Stored duplicates cannot pair with anything; remove them.
                warn!(key = %entity.key(), "duplicate persisted key, scheduling delete");
                duplicates.push(entity);
                continue;
            }
            existing_index.insert(entity.key().clone(), existing_slots.len());
            existing_slots.push(Some(entity));
        }

        let mut cs = ChangeSet::default();
        let mut seen: BTreeSet<K> = BTreeSet::new();

        for dto in incoming {
            if !seen.insert(dto.key().clone()) {
                warn!(key = %dto.key(), "duplicate incoming key, keeping the first");
                continue;
            }
            let slot = existing_index
                .get(dto.key())
                .and_then(|&i| existing_slots[i].take());
            match slot {
                Some(entity) => cs.to_update.push(Update {
                    existing: entity,
                    incoming: dto,
                }),
                None => cs.to_create.push(dto),
            }
        }

        cs.to_delete = existing_slots.into_iter().flatten().collect();
        cs.to_delete.extend(duplicates);
        cs
    }

    /// Plan a fixed-key reconciliation that never deletes.
    ///
    /// Team statistics always describe both sides; a side missing from one
    /// poll keeps its last persisted line.
    pub fn plan_retaining<K, D, E>(&self, incoming: Vec<D>, existing: Vec<E>) -> ChangeSet<D, E>
    where
        K: Ord + Clone + std::fmt::Display,
        D: Keyed<Key = K>,
        E: Keyed<Key = K>,
    {
        let mut cs = self.plan(incoming, existing);
        cs.to_delete.clear();
        cs
    }

    /// Plan every entity kind of one fixture.
    ///
    /// `player_stats` must already be linked against `players` (see
    /// [`link_player_stats`]).
    pub fn plan_match(
        &self,
        players: &MergedPlayers,
        events: Vec<MatchEventRecord>,
        player_stats: Vec<PlayerStatRecord>,
        team_stats: Vec<TeamStatRecord>,
        existing: ExistingMatch,
    ) -> MatchChangeSets {
        let incoming_players: Vec<MatchPlayerRecord> = players.values().cloned().collect();
        MatchChangeSets {
            players: self.plan(incoming_players, existing.players),
            events: self.plan(events, existing.events),
            player_stats: self.plan(player_stats, existing.player_stats),
            team_stats: self.plan_retaining(team_stats, existing.team_stats),
        }
    }
}

/// Drop player statistics whose key is not part of the merged player map.
///
/// A stat line for an unknown player cannot be linked to a player row; it is
/// skipped with a warning so the rest of the batch still lands.
pub fn link_player_stats(
    stats: Vec<PlayerStatRecord>,
    players: &MergedPlayers,
    dropped: &mut Vec<DroppedRecord>,
) -> Vec<PlayerStatRecord> {
    stats
        .into_iter()
        .filter(|stat| {
            if players.contains_key(&stat.player_key) {
                return true;
            }
            let err = SyncError::UnmatchedPlayer {
                key: stat.player_key.clone(),
            };
            warn!(key = %stat.player_key, error = %err, "dropping player statistics");
            dropped.push(DroppedRecord::new(RecordKind::PlayerStat, &err));
            false
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::{PlayerSource, Stored};
    use crate::domain::value_objects::{MatchPlayerKey, Side};

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        key: u32,
        val: &'static str,
    }

    impl Keyed for Row {
        type Key = u32;
        fn key(&self) -> &u32 {
            &self.key
        }
    }

    fn rows(pairs: &[(u32, &'static str)]) -> Vec<Row> {
        pairs.iter().map(|&(key, val)| Row { key, val }).collect()
    }

    fn keys<'a>(it: impl Iterator<Item = &'a Row>) -> Vec<u32> {
        it.map(|r| r.key).collect()
    }

    #[test]
    fn partitions_create_update_delete() {
        let cs = ChangeSetPlanner::new().plan(
            rows(&[(1, "new"), (2, "changed")]),
            rows(&[(2, "old"), (3, "gone")]),
        );

        assert_eq!(keys(cs.to_create.iter()), vec![1]);
        assert_eq!(cs.to_update.len(), 1);
        assert_eq!(cs.to_update[0].existing.val, "old");
        assert_eq!(cs.to_update[0].incoming.val, "changed");
        assert_eq!(keys(cs.to_delete.iter()), vec![3]);
    }

    #[test]
    fn identical_records_are_still_updated() {
        let same = rows(&[(1, "a"), (2, "b")]);
        let cs = ChangeSetPlanner::new().plan(same.clone(), same);
        assert!(cs.to_create.is_empty());
        assert!(cs.to_delete.is_empty());
        assert_eq!(cs.to_update.len(), 2);
    }

    #[test]
    fn preserves_incoming_and_existing_order() {
        let cs = ChangeSetPlanner::new().plan(
            rows(&[(9, ""), (4, ""), (7, ""), (1, "")]),
            rows(&[(8, ""), (7, ""), (2, ""), (9, "")]),
        );
        assert_eq!(keys(cs.to_create.iter()), vec![4, 1]);
        assert_eq!(keys(cs.to_update.iter().map(|u| &u.incoming)), vec![9, 7]);
        assert_eq!(keys(cs.to_delete.iter()), vec![8, 2]);
    }

    #[test]
    fn every_key_lands_in_exactly_one_list() {
        let incoming = rows(&[(1, ""), (2, ""), (3, ""), (5, ""), (8, "")]);
        let existing = rows(&[(2, ""), (3, ""), (4, ""), (6, ""), (8, "")]);
        let union: BTreeSet<u32> = incoming.iter().chain(&existing).map(|r| r.key).collect();

        let cs = ChangeSetPlanner::new().plan(incoming, existing);

        let mut touched: Vec<u32> = keys(cs.to_create.iter());
        touched.extend(cs.to_update.iter().map(|u| u.existing.key));
        touched.extend(keys(cs.to_delete.iter()));
        let distinct: BTreeSet<u32> = touched.iter().copied().collect();

        assert_eq!(cs.len(), union.len());
        assert_eq!(touched.len(), distinct.len());
        assert_eq!(distinct, union);
        assert_eq!(cs.summary().total, union.len());
    }

    #[test]
    fn duplicate_incoming_keys_keep_the_first() {
        let cs = ChangeSetPlanner::new().plan(rows(&[(1, "first"), (1, "second")]), Vec::<Row>::new());
        assert_eq!(cs.to_create, rows(&[(1, "first")]));
    }

    #[test]
    fn retaining_plan_never_deletes() {
        let cs = ChangeSetPlanner::new()
            .plan_retaining(rows(&[(1, "home")]), rows(&[(1, "old"), (2, "away")]));
        assert_eq!(cs.to_update.len(), 1);
        assert!(cs.to_delete.is_empty());
    }

    #[test]
    fn empty_inputs_give_empty_change_set() {
        let cs: ChangeSet<Row, Row> = ChangeSetPlanner::new().plan(vec![], vec![]);
        assert!(cs.is_empty());
    }

    // ── link_player_stats ──

    fn player(key: &str) -> MatchPlayerRecord {
        MatchPlayerRecord {
            key: MatchPlayerKey::from_stored(key),
            provider_id: None,
            name: None,
            number: None,
            position: None,
            side: Side::Home,
            non_lineup_player: false,
            source: PlayerSource::Lineup,
        }
    }

    fn stat(key: &str) -> PlayerStatRecord {
        PlayerStatRecord {
            player_key: MatchPlayerKey::from_stored(key),
            side: Side::Home,
            minutes_played: None,
            rating: None,
            goals: 0,
            assists: 0,
            shots: 0,
            passes: 0,
            tackles: 0,
            yellow_cards: 0,
            red_cards: 0,
        }
    }

    #[test]
    fn unmatched_stat_is_dropped_and_batch_continues() {
        let players: MergedPlayers = [player("id:1"), player("id:2")]
            .into_iter()
            .map(|p| (p.key.clone(), p))
            .collect();
        let mut dropped = Vec::new();

        let linked = link_player_stats(
            vec![stat("id:1"), stat("id:99"), stat("id:2")],
            &players,
            &mut dropped,
        );

        assert_eq!(linked, vec![stat("id:1"), stat("id:2")]);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].kind, RecordKind::PlayerStat);
        assert!(dropped[0].reason.contains("id:99"));
    }

    #[test]
    fn plan_match_reconciles_players_and_keeps_team_sides() {
        let players: MergedPlayers = [player("id:1")]
            .into_iter()
            .map(|p| (p.key.clone(), p))
            .collect();
        let existing = ExistingMatch {
            players: vec![Stored {
                id: 10,
                value: player("id:2"),
            }],
            team_stats: vec![Stored {
                id: 11,
                value: TeamStatRecord {
                    side: Side::Away,
                    possession: None,
                    shots: 0,
                    shots_on_target: 0,
                    corners: 0,
                    fouls: 0,
                    offsides: 0,
                    yellow_cards: 0,
                    red_cards: 0,
                },
            }],
            ..ExistingMatch::default()
        };

        let sets = ChangeSetPlanner::new().plan_match(&players, vec![], vec![], vec![], existing);

        assert_eq!(sets.players.to_create.len(), 1);
        assert_eq!(sets.players.to_delete.len(), 1);
        assert_eq!(sets.players.to_delete[0].id, 10);
        assert!(sets.team_stats.is_empty());
        assert_eq!(sets.summary().total_changes, 2);
    }
}
