use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::changeset::SyncSummary;
use crate::domain::errors::DroppedRecord;
use crate::domain::job::Phase;
use crate::domain::value_objects::FixtureUid;

/// Result of one sync attempt for one fixture.
///
/// Exactly one variant is produced per attempt and it is the only signal the
/// job lifecycle controller acts on. The enum is closed so the controller's
/// dispatch is checked for exhaustiveness at compile time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SyncOutcome {
    PreMatch {
        lineup_cached: bool,
        kickoff_time: Option<DateTime<Utc>>,
        should_terminate_pre_match_job: bool,
    },
    Live {
        kickoff_time: Option<DateTime<Utc>>,
        is_match_finished: bool,
        elapsed_minutes: Option<i32>,
        status_code: String,
    },
    PostMatch {
        kickoff_time: Option<DateTime<Utc>>,
        should_stop_polling: bool,
        minutes_since_finish: i64,
        status_code: String,
        elapsed_minutes: Option<i32>,
    },
    Error {
        message: String,
        kickoff_time: Option<DateTime<Utc>>,
    },
}

impl SyncOutcome {
    pub fn kickoff_time(&self) -> Option<DateTime<Utc>> {
        match self {
            SyncOutcome::PreMatch { kickoff_time, .. }
            | SyncOutcome::Live { kickoff_time, .. }
            | SyncOutcome::PostMatch { kickoff_time, .. }
            | SyncOutcome::Error { kickoff_time, .. } => *kickoff_time,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SyncOutcome::PreMatch { .. } => "pre_match",
            SyncOutcome::Live { .. } => "live",
            SyncOutcome::PostMatch { .. } => "post_match",
            SyncOutcome::Error { .. } => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SyncOutcome::Error { .. })
    }

    /// Interpret the outcome from the point of view of the job that ran it.
    ///
    /// A finished fixture seen by a pre-match or live job (and not yet past the
    /// post-match cutoff) means the match ended while that job was polling, so
    /// it is reported as a finished live match. Everything else is unchanged.
    pub fn for_job(self, phase: Phase) -> SyncOutcome {
        match self {
            SyncOutcome::PostMatch {
                kickoff_time,
                should_stop_polling: false,
                status_code,
                elapsed_minutes,
                ..
            } if phase != Phase::PostMatch => SyncOutcome::Live {
                kickoff_time,
                is_match_finished: true,
                elapsed_minutes,
                status_code,
            },
            other => other,
        }
    }
}

/// Outcome of a sync plus what it changed, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub sync_id: String,
    pub fixture: FixtureUid,
    pub synced_at: DateTime<Utc>,
    pub outcome: SyncOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SyncSummary>,
    pub dropped: Vec<DroppedRecord>,
}

impl SyncReport {
    pub fn new(
        fixture: FixtureUid,
        synced_at: DateTime<Utc>,
        outcome: SyncOutcome,
        summary: Option<SyncSummary>,
        dropped: Vec<DroppedRecord>,
    ) -> Self {
        Self {
            sync_id: format!(
                "sync_{}_{}",
                synced_at.format("%Y%m%d_%H%M%S"),
                uuid::Uuid::new_v4().simple()
            ),
            fixture,
            synced_at,
            outcome,
            summary,
            dropped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(stop: bool) -> SyncOutcome {
        SyncOutcome::PostMatch {
            kickoff_time: None,
            should_stop_polling: stop,
            minutes_since_finish: 5,
            status_code: "FT".into(),
            elapsed_minutes: Some(90),
        }
    }

    #[test]
    fn finished_match_seen_by_live_job_is_a_finished_live_match() {
        match finished(false).for_job(Phase::Live) {
            SyncOutcome::Live {
                is_match_finished,
                status_code,
                elapsed_minutes,
                ..
            } => {
                assert!(is_match_finished);
                assert_eq!(status_code, "FT");
                assert_eq!(elapsed_minutes, Some(90));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn post_match_job_keeps_post_match_outcome() {
        assert_eq!(finished(false).for_job(Phase::PostMatch), finished(false));
    }

    #[test]
    fn stopped_polling_is_never_rewritten() {
        assert_eq!(finished(true).for_job(Phase::Live), finished(true));
    }

    #[test]
    fn serialises_with_phase_tag() {
        let json = serde_json::to_value(SyncOutcome::Error {
            message: "boom".into(),
            kickoff_time: None,
        })
        .unwrap();
        assert_eq!(json["phase"], "error");
        assert_eq!(json["message"], "boom");
    }
}
