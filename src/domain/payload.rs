use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Side;

/// Everything a provider returns for one fixture on one poll.
///
/// Providers map their own response schema onto this shape; the engine never
/// sees provider JSON directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMatchPayload {
    pub fixture: FixtureState,
    #[serde(default)]
    pub lineups: Vec<LineupDto>,
    #[serde(default)]
    pub events: Vec<EventDto>,
    #[serde(default)]
    pub player_stats: Vec<PlayerStatDto>,
    #[serde(default)]
    pub team_stats: Vec<TeamStatDto>,
}

/// Raw status of the fixture as reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixtureState {
    /// Short status code, e.g. `NS`, `1H`, `FT`.
    pub status_code: String,
    #[serde(default)]
    pub elapsed_minutes: Option<i32>,
    #[serde(default)]
    pub kickoff: Option<DateTime<Utc>>,
}

/// A player as referenced by any source. Either `id` or `name` identifies it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRef {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub number: Option<i32>,
    #[serde(default)]
    pub position: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupDto {
    pub side: Side,
    #[serde(default)]
    pub starting: Vec<PlayerRef>,
    #[serde(default)]
    pub substitutes: Vec<PlayerRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDto {
    pub side: Side,
    pub minute: i32,
    #[serde(default)]
    pub extra_minute: Option<i32>,
    /// Provider event type, e.g. `Goal`, `Card`, `subst`.
    pub kind: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub player: Option<PlayerRef>,
    #[serde(default)]
    pub assist: Option<PlayerRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatDto {
    pub side: Side,
    pub player: PlayerRef,
    #[serde(default)]
    pub minutes_played: Option<i32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub goals: i32,
    #[serde(default)]
    pub assists: i32,
    #[serde(default)]
    pub shots: i32,
    #[serde(default)]
    pub passes: i32,
    #[serde(default)]
    pub tackles: i32,
    #[serde(default)]
    pub yellow_cards: i32,
    #[serde(default)]
    pub red_cards: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStatDto {
    pub side: Side,
    #[serde(default)]
    pub possession: Option<f64>,
    #[serde(default)]
    pub shots: i32,
    #[serde(default)]
    pub shots_on_target: i32,
    #[serde(default)]
    pub corners: i32,
    #[serde(default)]
    pub fouls: i32,
    #[serde(default)]
    pub offsides: i32,
    #[serde(default)]
    pub yellow_cards: i32,
    #[serde(default)]
    pub red_cards: i32,
}
