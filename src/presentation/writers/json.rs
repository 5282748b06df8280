use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::{outcome::SyncReport, ports::OutputWriter};

// ─── Serialisation view ───────────────────────────────────────────────────────
//
// Wraps the domain report and adds a couple of derived fields for readers
// that do not want to walk the nested structures.

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    report: &'a SyncReport,
    outcome_label: &'static str,
    total_changes: usize,
    dropped_by_kind: BTreeMap<&'static str, usize>,
}

pub struct JsonWriter;

impl OutputWriter for JsonWriter {
    fn format(&self, report: &SyncReport) -> Result<String> {
        let mut dropped_by_kind = BTreeMap::new();
        for d in &report.dropped {
            *dropped_by_kind.entry(d.kind.as_str()).or_insert(0) += 1;
        }

        let view = JsonReport {
            report,
            outcome_label: report.outcome.label(),
            total_changes: report.summary.map(|s| s.total_changes).unwrap_or(0),
            dropped_by_kind,
        };
        Ok(serde_json::to_string_pretty(&view)?)
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::changeset::{Summary, SyncSummary};
    use crate::domain::errors::{DroppedRecord, RecordKind, SyncError};
    use crate::domain::outcome::SyncOutcome;
    use crate::domain::value_objects::{FixtureUid, MatchPlayerKey};
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    fn report() -> SyncReport {
        let at = Utc.with_ymd_and_hms(2026, 6, 11, 20, 30, 0).unwrap();
        let unmatched = SyncError::UnmatchedPlayer {
            key: MatchPlayerKey::derive(Some(77), None).unwrap(),
        };
        SyncReport::new(
            FixtureUid::new("fx-1"),
            at,
            SyncOutcome::Live {
                kickoff_time: Some(at),
                is_match_finished: false,
                elapsed_minutes: Some(30),
                status_code: "1H".into(),
            },
            Some(SyncSummary {
                players: Summary::new(22, 0, 0),
                events: Summary::new(2, 0, 0),
                player_stats: Summary::default(),
                team_stats: Summary::new(2, 0, 0),
                total_changes: 26,
            }),
            vec![DroppedRecord::new(RecordKind::PlayerStat, &unmatched)],
        )
    }

    #[test]
    fn outcome_is_tagged_by_phase() {
        let output = JsonWriter.format(&report()).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["fixture"], "fx-1");
        assert_eq!(parsed["outcome"]["phase"], "live");
        assert_eq!(parsed["outcome"]["elapsed_minutes"], 30);
        assert_eq!(parsed["outcome_label"], "live");
        assert!(parsed["sync_id"].as_str().unwrap().starts_with("sync_20260611_203000_"));
    }

    #[test]
    fn carries_summary_and_dropped_counts() {
        let output = JsonWriter.format(&report()).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["total_changes"], 26);
        assert_eq!(parsed["summary"]["players"]["creates"], 22);
        assert_eq!(parsed["dropped_by_kind"]["player_stat"], 1);
        assert_eq!(parsed["dropped"][0]["kind"], "player_stat");
        assert!(parsed["dropped"][0]["reason"]
            .as_str()
            .unwrap()
            .contains("id:77"));
    }

    #[test]
    fn error_report_has_no_summary() {
        let mut r = report();
        r.outcome = SyncOutcome::Error {
            message: "provider down".into(),
            kickoff_time: None,
        };
        r.summary = None;
        let parsed: Value = serde_json::from_str(&JsonWriter.format(&r).unwrap()).unwrap();

        assert_eq!(parsed["outcome"]["phase"], "error");
        assert!(parsed.get("summary").is_none());
        assert_eq!(parsed["total_changes"], 0);
    }
}
