use serde::{Deserialize, Serialize};

use crate::domain::changeset::Keyed;
use crate::domain::value_objects::{EventKey, MatchPlayerKey, Side};

/// Source a player sighting came from, in priority order (lineup wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerSource {
    Lineup,
    Event,
    Statistics,
}

impl PlayerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerSource::Lineup => "lineup",
            PlayerSource::Event => "event",
            PlayerSource::Statistics => "statistics",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lineup" => Some(PlayerSource::Lineup),
            "event" => Some(PlayerSource::Event),
            "statistics" => Some(PlayerSource::Statistics),
            _ => None,
        }
    }
}

/// Merged view of one player for one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPlayerRecord {
    pub key: MatchPlayerKey,
    pub provider_id: Option<i64>,
    pub name: Option<String>,
    pub number: Option<i32>,
    pub position: Option<String>,
    pub side: Side,
    /// Seen only through an event or a statistics line, never in a lineup.
    pub non_lineup_player: bool,
    /// Source whose attributes won the merge.
    pub source: PlayerSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEventRecord {
    pub key: EventKey,
    pub side: Side,
    pub minute: i32,
    pub extra_minute: Option<i32>,
    pub kind: String,
    pub detail: Option<String>,
    pub player_key: Option<MatchPlayerKey>,
    pub assist_key: Option<MatchPlayerKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatRecord {
    pub player_key: MatchPlayerKey,
    pub side: Side,
    pub minutes_played: Option<i32>,
    pub rating: Option<f64>,
    pub goals: i32,
    pub assists: i32,
    pub shots: i32,
    pub passes: i32,
    pub tackles: i32,
    pub yellow_cards: i32,
    pub red_cards: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStatRecord {
    pub side: Side,
    pub possession: Option<f64>,
    pub shots: i32,
    pub shots_on_target: i32,
    pub corners: i32,
    pub fouls: i32,
    pub offsides: i32,
    pub yellow_cards: i32,
    pub red_cards: i32,
}

impl Keyed for MatchPlayerRecord {
    type Key = MatchPlayerKey;
    fn key(&self) -> &MatchPlayerKey {
        &self.key
    }
}

impl Keyed for MatchEventRecord {
    type Key = EventKey;
    fn key(&self) -> &EventKey {
        &self.key
    }
}

impl Keyed for PlayerStatRecord {
    type Key = MatchPlayerKey;
    fn key(&self) -> &MatchPlayerKey {
        &self.player_key
    }
}

impl Keyed for TeamStatRecord {
    type Key = Side;
    fn key(&self) -> &Side {
        &self.side
    }
}

/// A record as persisted: the store's row id plus the last applied values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<T> {
    pub id: i64,
    pub value: T,
}

impl<T: Keyed> Keyed for Stored<T> {
    type Key = T::Key;
    fn key(&self) -> &T::Key {
        self.value.key()
    }
}

/// Everything previously persisted for one fixture, in storage order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExistingMatch {
    pub players: Vec<Stored<MatchPlayerRecord>>,
    pub events: Vec<Stored<MatchEventRecord>>,
    pub player_stats: Vec<Stored<PlayerStatRecord>>,
    pub team_stats: Vec<Stored<TeamStatRecord>>,
}

impl ExistingMatch {
    pub fn row_count(&self) -> usize {
        self.players.len() + self.events.len() + self.player_stats.len() + self.team_stats.len()
    }
}
