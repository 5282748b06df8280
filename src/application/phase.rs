use chrono::{DateTime, Duration, Utc};

use crate::domain::outcome::SyncOutcome;

/// Status codes of a fixture that will not produce more live data.
pub const FINISHED_STATUSES: &[&str] = &["FT", "AET", "PEN", "AWD", "WO", "CANC", "PST", "ABD"];

/// Status codes of a fixture in play (or interrupted mid-play).
pub const LIVE_STATUSES: &[&str] = &["1H", "HT", "2H", "ET", "BT", "P", "SUSP", "LIVE"];

pub const NOT_STARTED: &str = "NS";

/// Used as the finish estimate when a finished fixture reports no elapsed time.
const REGULATION_MINUTES: i64 = 90;

/// What the analyzer needs to know about a fixture at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseInput {
    pub status_code: String,
    pub elapsed_minutes: Option<i32>,
    pub kickoff: Option<DateTime<Utc>>,
    pub has_complete_lineup: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseThresholds {
    pub post_match_polling_cutoff_minutes: i64,
    pub kickoff_imminent_threshold_minutes: i64,
}

/// Upper bound for either threshold (one week).
pub const MAX_THRESHOLD_MINUTES: i64 = 7 * 24 * 60;

impl PhaseThresholds {
    /// Clamp both thresholds into `0..=MAX_THRESHOLD_MINUTES`.
    pub fn bounded(self) -> Self {
        Self {
            post_match_polling_cutoff_minutes: self
                .post_match_polling_cutoff_minutes
                .clamp(0, MAX_THRESHOLD_MINUTES),
            kickoff_imminent_threshold_minutes: self
                .kickoff_imminent_threshold_minutes
                .clamp(0, MAX_THRESHOLD_MINUTES),
        }
    }
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            post_match_polling_cutoff_minutes: 60,
            kickoff_imminent_threshold_minutes: 1,
        }
    }
}

// ─── Phase Analyzer ───

/// Classifies a fixture into a [`SyncOutcome`] from its raw status.
///
/// First match wins:
/// 1. finished status → `PostMatch`, stop polling once the estimated finish
///    (kickoff + elapsed) is older than the cutoff
/// 2. live status → `Live`
/// 3. `NS` with kickoff already past → `Live` (provider has not flipped yet)
/// 4. anything else → `PreMatch`, ending pre-match polling once the lineup is
///    complete or kickoff is imminent
#[derive(Debug, Clone, Default)]
pub struct PhaseAnalyzer {
    thresholds: PhaseThresholds,
}

impl PhaseAnalyzer {
    pub fn new(thresholds: PhaseThresholds) -> Self {
        Self {
            thresholds: thresholds.bounded(),
        }
    }

    pub fn analyze(&self, input: &PhaseInput, now: DateTime<Utc>) -> SyncOutcome {
        let status = input.status_code.trim().to_uppercase();

        if FINISHED_STATUSES.contains(&status.as_str()) {
            let (should_stop_polling, minutes_since_finish) = self.post_match_window(input, now);
            return SyncOutcome::PostMatch {
                kickoff_time: input.kickoff,
                should_stop_polling,
                minutes_since_finish,
                status_code: status,
                elapsed_minutes: input.elapsed_minutes,
            };
        }

        let kicked_off = input.kickoff.is_some_and(|k| k < now);
        if LIVE_STATUSES.contains(&status.as_str()) || (status == NOT_STARTED && kicked_off) {
            return SyncOutcome::Live {
                kickoff_time: input.kickoff,
                is_match_finished: false,
                elapsed_minutes: input.elapsed_minutes,
                status_code: status,
            };
        }

        let imminent = input.kickoff.is_some_and(|k| {
            k - now <= Duration::minutes(self.thresholds.kickoff_imminent_threshold_minutes)
        });
        SyncOutcome::PreMatch {
            lineup_cached: input.has_complete_lineup,
            kickoff_time: input.kickoff,
            should_terminate_pre_match_job: input.has_complete_lineup || imminent,
        }
    }

    /// Without a kickoff there is no finish to wait on, so polling stops.
    fn post_match_window(&self, input: &PhaseInput, now: DateTime<Utc>) -> (bool, i64) {
        let cutoff = self.thresholds.post_match_polling_cutoff_minutes;
        let Some(kickoff) = input.kickoff else {
            return (true, cutoff);
        };
        let elapsed = input
            .elapsed_minutes
            .map(i64::from)
            .unwrap_or(REGULATION_MINUTES);
        let finished_at = kickoff + Duration::minutes(elapsed);
        let since = now - finished_at;
        (since > Duration::minutes(cutoff), since.num_minutes())
    }
}
