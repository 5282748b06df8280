use serde::Serialize;
use thiserror::Error;

use crate::domain::value_objects::{FixtureUid, MatchPlayerKey};

/// Failures the sync engine distinguishes.
///
/// `InvalidIdentity` and `UnmatchedPlayer` are recovered per record (log and
/// skip). The others abort the fixture's sync attempt and surface as
/// [`crate::SyncOutcome::Error`], leaving the polling job alive.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("invalid player identity: {context}")]
    InvalidIdentity { context: String },

    #[error("statistic references unknown player {key}")]
    UnmatchedPlayer { key: MatchPlayerKey },

    #[error("no registered provider supports fixture {0}")]
    NoSupportingProvider(FixtureUid),

    #[error("fixture {0} is not registered")]
    UnknownFixture(FixtureUid),

    #[error("provider {provider} failed: {message}")]
    Provider { provider: String, message: String },

    #[error("persistence failure: {0}")]
    Persistence(String),
}

/// Entity kind a dropped record belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    LineupPlayer,
    EventPlayer,
    PlayerStat,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::LineupPlayer => "lineup_player",
            RecordKind::EventPlayer => "event_player",
            RecordKind::PlayerStat => "player_stat",
        }
    }
}

/// A record skipped during extraction or linking, kept for the sync report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedRecord {
    pub kind: RecordKind,
    pub reason: String,
}

impl DroppedRecord {
    pub fn new(kind: RecordKind, err: &SyncError) -> Self {
        Self {
            kind,
            reason: err.to_string(),
        }
    }
}
