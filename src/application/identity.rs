use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::errors::SyncError;
use crate::domain::payload::PlayerRef;
use crate::domain::records::{MatchPlayerRecord, PlayerSource};
use crate::domain::value_objects::{MatchPlayerKey, Side};

/// One appearance of a player in one source.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSighting {
    pub side: Side,
    pub player: PlayerRef,
}

impl PlayerSighting {
    pub fn new(side: Side, player: PlayerRef) -> Self {
        Self { side, player }
    }

    pub fn key(&self) -> Result<MatchPlayerKey, SyncError> {
        MatchPlayerKey::derive(self.player.id, self.player.name.as_deref())
    }
}

pub type MergedPlayers = BTreeMap<MatchPlayerKey, MatchPlayerRecord>;

// ─── Player Identity Resolver ───

/// Merges player sightings from lineup, event and statistics sources.
///
/// Priority is lineup > event > statistics. A key already present is never
/// overwritten and attributes are never merged field by field: the first
/// source to claim a key owns the whole record. Keys contributed by events or
/// statistics are marked `non_lineup_player`.
#[derive(Debug, Default)]
pub struct PlayerIdentityResolver;

impl PlayerIdentityResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(
        &self,
        lineup: &[PlayerSighting],
        events: &[PlayerSighting],
        statistics: &[PlayerSighting],
    ) -> Result<MergedPlayers, SyncError> {
        let mut merged = MergedPlayers::new();

        for (source, sightings) in [
            (PlayerSource::Lineup, lineup),
            (PlayerSource::Event, events),
            (PlayerSource::Statistics, statistics),
        ] {
            for sighting in sightings {
                let key = sighting.key()?;
                if merged.contains_key(&key) {
                    debug!(key = %key, source = source.as_str(), "player already merged, skipping");
                    continue;
                }
                let record = to_record(key.clone(), sighting, source);
                merged.insert(key, record);
            }
        }

        Ok(merged)
    }
}

fn to_record(key: MatchPlayerKey, sighting: &PlayerSighting, source: PlayerSource) -> MatchPlayerRecord {
    let player = &sighting.player;
    MatchPlayerRecord {
        key,
        provider_id: player.id,
        name: player
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        number: player.number,
        position: player.position.clone(),
        side: sighting.side,
        non_lineup_player: source != PlayerSource::Lineup,
        source,
    }
}

/// Both sides have at least one lineup player.
pub fn has_complete_lineup(players: &MergedPlayers) -> bool {
    let fielded = |side: Side| {
        players
            .values()
            .any(|p| p.side == side && p.source == PlayerSource::Lineup)
    };
    fielded(Side::Home) && fielded(Side::Away)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sighting(side: Side, id: Option<i64>, name: &str, number: Option<i32>) -> PlayerSighting {
        PlayerSighting::new(
            side,
            PlayerRef {
                id,
                name: Some(name.to_string()),
                number,
                position: None,
            },
        )
    }

    fn key(raw: &str) -> MatchPlayerKey {
        MatchPlayerKey::from_stored(raw)
    }

    #[test]
    fn lineup_wins_over_event_sighting() {
        let lineup = vec![sighting(Side::Home, Some(7), "Lineup Name", Some(7))];
        let events = vec![sighting(Side::Home, Some(7), "Event Name", Some(99))];

        let merged = PlayerIdentityResolver::new()
            .resolve(&lineup, &events, &[])
            .unwrap();

        let p = &merged[&key("id:7")];
        assert_eq!(merged.len(), 1);
        assert!(!p.non_lineup_player);
        assert_eq!(p.name.as_deref(), Some("Lineup Name"));
        assert_eq!(p.number, Some(7));
        assert_eq!(p.source, PlayerSource::Lineup);
    }

    #[test]
    fn event_wins_over_statistics_and_both_are_non_lineup() {
        let events = vec![sighting(Side::Away, None, "Sub Striker", None)];
        let stats = vec![
            sighting(Side::Away, None, " sub striker ", Some(20)),
            sighting(Side::Away, Some(44), "Stat Only", Some(4)),
        ];

        let merged = PlayerIdentityResolver::new()
            .resolve(&[], &events, &stats)
            .unwrap();

        assert_eq!(merged.len(), 2);
        let from_event = &merged[&key("name:sub striker")];
        assert_eq!(from_event.source, PlayerSource::Event);
        assert_eq!(from_event.number, None);
        assert!(from_event.non_lineup_player);

        let from_stats = &merged[&key("id:44")];
        assert_eq!(from_stats.source, PlayerSource::Statistics);
        assert!(from_stats.non_lineup_player);
    }

    #[test]
    fn result_size_is_distinct_identities() {
        let lineup = vec![
            sighting(Side::Home, Some(1), "A", None),
            sighting(Side::Home, Some(2), "B", None),
        ];
        let events = vec![
            sighting(Side::Home, Some(2), "B", None),
            sighting(Side::Home, Some(3), "C", None),
        ];
        let stats = vec![
            sighting(Side::Home, Some(1), "A", None),
            sighting(Side::Home, Some(3), "C", None),
            sighting(Side::Away, Some(4), "D", None),
        ];

        let merged = PlayerIdentityResolver::new()
            .resolve(&lineup, &events, &stats)
            .unwrap();
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn reordering_within_a_source_gives_the_same_map() {
        let lineup = vec![
            sighting(Side::Home, Some(1), "A", Some(1)),
            sighting(Side::Away, Some(2), "B", Some(2)),
        ];
        let events = vec![
            sighting(Side::Home, None, "C", None),
            sighting(Side::Away, Some(5), "E", None),
        ];
        let mut lineup_rev = lineup.clone();
        lineup_rev.reverse();
        let mut events_rev = events.clone();
        events_rev.reverse();

        let resolver = PlayerIdentityResolver::new();
        assert_eq!(
            resolver.resolve(&lineup, &events, &[]).unwrap(),
            resolver.resolve(&lineup_rev, &events_rev, &[]).unwrap(),
        );
    }

    #[test]
    fn anonymous_sighting_is_rejected() {
        let bad = PlayerSighting::new(Side::Home, PlayerRef::default());
        let err = PlayerIdentityResolver::new()
            .resolve(&[], &[bad], &[])
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidIdentity { .. }));
    }

    #[test]
    fn complete_lineup_needs_both_sides() {
        let resolver = PlayerIdentityResolver::new();
        let home_only = resolver
            .resolve(&[sighting(Side::Home, Some(1), "A", None)], &[], &[])
            .unwrap();
        assert!(!has_complete_lineup(&home_only));

        let away_from_stats = resolver
            .resolve(
                &[sighting(Side::Home, Some(1), "A", None)],
                &[],
                &[sighting(Side::Away, Some(2), "B", None)],
            )
            .unwrap();
        assert!(!has_complete_lineup(&away_from_stats));

        let both = resolver
            .resolve(
                &[
                    sighting(Side::Home, Some(1), "A", None),
                    sighting(Side::Away, Some(2), "B", None),
                ],
                &[],
                &[],
            )
            .unwrap();
        assert!(has_complete_lineup(&both));
    }
}
