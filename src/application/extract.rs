use std::collections::BTreeMap;

use tracing::warn;

use crate::application::identity::PlayerSighting;
use crate::domain::errors::{DroppedRecord, RecordKind};
use crate::domain::payload::{PlayerRef, RawMatchPayload};
use crate::domain::records::{MatchEventRecord, PlayerStatRecord, TeamStatRecord};
use crate::domain::value_objects::{EventKey, MatchPlayerKey, Side};

/// Structured data pulled out of one provider payload.
///
/// Sightings are split per source so the resolver can apply priority.
/// Every player reference in here has a derivable key: anonymous ones were
/// rejected and recorded in `dropped`.
#[derive(Debug, Clone, Default)]
pub struct MatchExtract {
    pub lineup: Vec<PlayerSighting>,
    pub event_players: Vec<PlayerSighting>,
    pub stat_players: Vec<PlayerSighting>,
    pub events: Vec<MatchEventRecord>,
    pub player_stats: Vec<PlayerStatRecord>,
    pub team_stats: Vec<TeamStatRecord>,
    pub dropped: Vec<DroppedRecord>,
}

pub fn extract(payload: &RawMatchPayload) -> MatchExtract {
    let mut out = MatchExtract::default();

    for lineup in &payload.lineups {
        for player in lineup.starting.iter().chain(&lineup.substitutes) {
            if accept(player, RecordKind::LineupPlayer, &mut out.dropped).is_some() {
                out.lineup.push(PlayerSighting::new(lineup.side, player.clone()));
            }
        }
    }

    let mut ordinals: BTreeMap<String, usize> = BTreeMap::new();
    for event in &payload.events {
        let player_key = event_player(event.side, event.player.as_ref(), &mut out);
        let assist_key = event_player(event.side, event.assist.as_ref(), &mut out);

        let prefix = EventKey::prefix(
            event.side,
            event.minute,
            event.extra_minute,
            &event.kind,
            player_key.as_ref(),
        );
        let ordinal = ordinals.entry(prefix.clone()).or_insert(0);
        *ordinal += 1;

        out.events.push(MatchEventRecord {
            key: EventKey::with_ordinal(&prefix, *ordinal),
            side: event.side,
            minute: event.minute,
            extra_minute: event.extra_minute,
            kind: event.kind.trim().to_string(),
            detail: event.detail.clone(),
            player_key,
            assist_key,
        });
    }

    for stat in &payload.player_stats {
        let Some(player_key) = accept(&stat.player, RecordKind::PlayerStat, &mut out.dropped) else {
            continue;
        };
        out.stat_players
            .push(PlayerSighting::new(stat.side, stat.player.clone()));
        out.player_stats.push(PlayerStatRecord {
            player_key,
            side: stat.side,
            minutes_played: stat.minutes_played,
            rating: stat.rating,
            goals: stat.goals,
            assists: stat.assists,
            shots: stat.shots,
            passes: stat.passes,
            tackles: stat.tackles,
            yellow_cards: stat.yellow_cards,
            red_cards: stat.red_cards,
        });
    }

    for team in &payload.team_stats {
        if out.team_stats.iter().any(|t| t.side == team.side) {
            warn!(side = %team.side, "duplicate team statistics line, keeping the first");
            continue;
        }
        out.team_stats.push(TeamStatRecord {
            side: team.side,
            possession: team.possession,
            shots: team.shots,
            shots_on_target: team.shots_on_target,
            corners: team.corners,
            fouls: team.fouls,
            offsides: team.offsides,
            yellow_cards: team.yellow_cards,
            red_cards: team.red_cards,
        });
    }

    out
}

/// Derive the key of a player reference, recording a dropped record if it
/// has no identity.
fn accept(
    player: &PlayerRef,
    kind: RecordKind,
    dropped: &mut Vec<DroppedRecord>,
) -> Option<MatchPlayerKey> {
    match MatchPlayerKey::derive(player.id, player.name.as_deref()) {
        Ok(key) => Some(key),
        Err(err) => {
            warn!(kind = ?kind, number = ?player.number, error = %err, "dropping player record");
            dropped.push(DroppedRecord::new(kind, &err));
            None
        }
    }
}

/// Event player references are optional. An anonymous one is cleared but the
/// event itself is kept.
fn event_player(side: Side, player: Option<&PlayerRef>, out: &mut MatchExtract) -> Option<MatchPlayerKey> {
    let player = player?;
    if player.id.is_none() && player.name.is_none() {
        return None;
    }
    let key = accept(player, RecordKind::EventPlayer, &mut out.dropped)?;
    out.event_players.push(PlayerSighting::new(side, player.clone()));
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payload::{EventDto, FixtureState, LineupDto, PlayerStatDto, TeamStatDto};

    fn player(id: Option<i64>, name: Option<&str>) -> PlayerRef {
        PlayerRef {
            id,
            name: name.map(str::to_string),
            number: None,
            position: None,
        }
    }

    fn goal(side: Side, minute: i32, scorer: Option<PlayerRef>) -> EventDto {
        EventDto {
            side,
            minute,
            extra_minute: None,
            kind: "Goal".into(),
            detail: Some("Normal Goal".into()),
            player: scorer,
            assist: None,
        }
    }

    fn stat(side: Side, p: PlayerRef) -> PlayerStatDto {
        PlayerStatDto {
            side,
            player: p,
            minutes_played: Some(90),
            rating: Some(7.1),
            goals: 0,
            assists: 0,
            shots: 1,
            passes: 30,
            tackles: 2,
            yellow_cards: 0,
            red_cards: 0,
        }
    }

    fn payload() -> RawMatchPayload {
        RawMatchPayload {
            fixture: FixtureState {
                status_code: "1H".into(),
                elapsed_minutes: Some(30),
                kickoff: None,
            },
            lineups: vec![LineupDto {
                side: Side::Home,
                starting: vec![player(Some(1), Some("Keeper")), player(None, Some(""))],
                substitutes: vec![player(None, Some("Bench Guy"))],
            }],
            events: vec![
                goal(Side::Home, 10, Some(player(Some(9), Some("Nine")))),
                goal(Side::Home, 10, Some(player(Some(9), Some("Nine")))),
                goal(Side::Away, 12, Some(player(None, Some("  ")))),
            ],
            player_stats: vec![stat(Side::Home, player(Some(1), None)), stat(Side::Away, player(None, None))],
            team_stats: vec![],
        }
    }

    #[test]
    fn anonymous_lineup_and_stat_players_are_dropped() {
        let out = extract(&payload());
        assert_eq!(out.lineup.len(), 2);
        assert_eq!(out.player_stats.len(), 1);
        assert_eq!(out.stat_players.len(), 1);

        let kinds: Vec<RecordKind> = out.dropped.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![RecordKind::LineupPlayer, RecordKind::EventPlayer, RecordKind::PlayerStat]
        );
    }

    #[test]
    fn repeated_events_get_increasing_ordinals() {
        let out = extract(&payload());
        let keys: Vec<&str> = out.events.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["home:10+0:goal:id:9#1", "home:10+0:goal:id:9#2", "away:12+0:goal:-#1"]
        );
    }

    #[test]
    fn event_with_blank_player_keeps_event_without_reference() {
        let out = extract(&payload());
        let away_goal = &out.events[2];
        assert_eq!(away_goal.player_key, None);
        assert_eq!(out.event_players.len(), 2);
    }

    #[test]
    fn duplicate_team_lines_keep_first() {
        let mut p = payload();
        let line = |shots| TeamStatDto {
            side: Side::Home,
            possession: Some(55.0),
            shots,
            shots_on_target: 0,
            corners: 0,
            fouls: 0,
            offsides: 0,
            yellow_cards: 0,
            red_cards: 0,
        };
        p.team_stats = vec![line(4), line(8)];
        let out = extract(&p);
        assert_eq!(out.team_stats.len(), 1);
        assert_eq!(out.team_stats[0].shots, 4);
    }
}
