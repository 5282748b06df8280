use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::SyncError;

/// Opaque external identifier of a fixture (the `uid`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FixtureUid(pub String);

impl FixtureUid {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FixtureUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Provider-specific numeric id of a fixture. Persistence is keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FixtureApiId(pub i64);

impl fmt::Display for FixtureApiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A trackable fixture. Created at registration time and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureIdentity {
    pub uid: FixtureUid,
    pub api_id: FixtureApiId,
    pub kickoff: Option<DateTime<Utc>>,
}

/// Home or away. Team statistics are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "home" => Some(Side::Home),
            "away" => Some(Side::Away),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── MatchPlayerKey ──────────────────────────────────────────────────────────

const ID_PREFIX: &str = "id:";
const NAME_PREFIX: &str = "name:";

/// Canonical key of a player within one match.
///
/// `id:<provider id>` when the provider supplies an id, otherwise
/// `name:<trimmed lowercased name>`. This is the join point between lineup,
/// event and statistics sightings. It is not a cross-match identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchPlayerKey(String);

impl MatchPlayerKey {
    pub fn derive(id: Option<i64>, name: Option<&str>) -> Result<Self, SyncError> {
        if let Some(id) = id {
            return Ok(Self(format!("{ID_PREFIX}{id}")));
        }
        match name.map(str::trim) {
            Some(n) if !n.is_empty() => Ok(Self(format!("{NAME_PREFIX}{}", n.to_lowercase()))),
            _ => Err(SyncError::InvalidIdentity {
                context: "player has neither an id nor a name".to_string(),
            }),
        }
    }

    /// Rebuild a key read back from storage.
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_id_based(&self) -> bool {
        self.0.starts_with(ID_PREFIX)
    }
}

impl fmt::Display for MatchPlayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Sequence-stable identity of a match event.
///
/// Built from `(side, minute, extra, kind, player)` plus an ordinal that
/// counts earlier events sharing the same prefix in provider order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKey(pub String);

impl EventKey {
    pub fn prefix(
        side: Side,
        minute: i32,
        extra_minute: Option<i32>,
        kind: &str,
        player: Option<&MatchPlayerKey>,
    ) -> String {
        format!(
            "{}:{}+{}:{}:{}",
            side,
            minute,
            extra_minute.unwrap_or(0),
            kind.trim().to_lowercase(),
            player.map(MatchPlayerKey::as_str).unwrap_or("-"),
        )
    }

    pub fn with_ordinal(prefix: &str, ordinal: usize) -> Self {
        Self(format!("{prefix}#{ordinal}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
