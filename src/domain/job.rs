use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::domain::value_objects::FixtureUid;

/// Polling phase. Each phase has its own recurring job per fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    PreMatch,
    Live,
    PostMatch,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::PreMatch => "pre-match",
            Phase::Live => "live",
            Phase::PostMatch => "post-match",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a recurring job on the job substrate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobKey {
    pub phase: Phase,
    pub fixture: FixtureUid,
}

impl JobKey {
    pub fn new(phase: Phase, fixture: FixtureUid) -> Self {
        Self { phase, fixture }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.phase, self.fixture)
    }
}

/// When a job first fires and how often it repeats afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub start_at: DateTime<Utc>,
    pub every: Duration,
}

impl Trigger {
    pub fn starting_at(start_at: DateTime<Utc>, every: Duration) -> Self {
        Self { start_at, every }
    }
}

/// The job whose tick produced an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobContext {
    pub key: JobKey,
}

impl JobContext {
    pub fn new(key: JobKey) -> Self {
        Self { key }
    }

    pub fn phase(&self) -> Phase {
        self.key.phase
    }
}
