use crate::application::monitoring::PerfReport;
use crate::domain::changeset::Summary;
use crate::domain::outcome::{SyncOutcome, SyncReport};
use colored::*;
use tabled::settings::{object::Columns, Alignment, Modify, Style};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct KindRow {
    kind: String,
    creates: String,
    updates: String,
    deletes: String,
}

#[derive(Tabled)]
struct DroppedRow {
    kind: String,
    reason: String,
}

fn kind_row(kind: &str, s: &Summary) -> KindRow {
    KindRow {
        kind: kind.bold().to_string(),
        creates: s.creates.to_string().green().to_string(),
        updates: s.updates.to_string().yellow().to_string(),
        deletes: s.deletes.to_string().red().to_string(),
    }
}

fn outcome_line(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::PreMatch {
            lineup_cached,
            should_terminate_pre_match_job,
            ..
        } => format!(
            "{}  lineup cached: {}  terminate pre-match job: {}",
            "PRE-MATCH".blue().bold(),
            lineup_cached,
            should_terminate_pre_match_job
        ),
        SyncOutcome::Live {
            is_match_finished,
            elapsed_minutes,
            status_code,
            ..
        } => format!(
            "{}  status: {}  elapsed: {}  finished: {}",
            "LIVE".green().bold(),
            status_code,
            elapsed_minutes.map_or("-".to_string(), |m| format!("{m}'")),
            is_match_finished
        ),
        SyncOutcome::PostMatch {
            should_stop_polling,
            minutes_since_finish,
            status_code,
            ..
        } => format!(
            "{}  status: {}  {} min since finish  stop polling: {}",
            "POST-MATCH".magenta().bold(),
            status_code,
            minutes_since_finish,
            should_stop_polling
        ),
        SyncOutcome::Error { message, .. } => {
            format!("{}  {}", "ERROR".red().bold(), message)
        }
    }
}

pub fn print_report(report: &SyncReport) {
    println!();

    println!("{}", "MATCHSYNC REPORT".bold().cyan());
    println!("Fixture: {}", report.fixture.as_str().blue());
    println!("Sync: {}", report.sync_id.bright_yellow());
    if let Some(kickoff) = report.outcome.kickoff_time() {
        println!("Kickoff: {}", kickoff.to_rfc3339().dimmed());
    }
    println!("{}", outcome_line(&report.outcome));
    println!();

    let Some(summary) = &report.summary else {
        return;
    };

    if summary.total_changes == 0 {
        println!("{}", "Store already up to date.".italic());
    } else {
        let rows = vec![
            kind_row("players", &summary.players),
            kind_row("events", &summary.events),
            kind_row("player_stats", &summary.player_stats),
            kind_row("team_stats", &summary.team_stats),
        ];
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(1..=3)).with(Alignment::right()))
            .to_string();
        println!("{table}");
        println!(
            "  Total: {} change(s)",
            summary.total_changes.to_string().bold()
        );
    }

    if !report.dropped.is_empty() {
        println!();
        println!(
            "{} {} record(s) dropped",
            "⚠".yellow(),
            report.dropped.len().to_string().bold()
        );
        let rows: Vec<DroppedRow> = report
            .dropped
            .iter()
            .map(|d| DroppedRow {
                kind: d.kind.as_str().yellow().to_string(),
                reason: d.reason.dimmed().to_string(),
            })
            .collect();
        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{table}");
    }
    println!();
}

// ─── Performance summary ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PerfRow {
    operation: String,
    fixture: String,
    #[tabled(rename = "rows")]
    rows: String,
    #[tabled(rename = "time (ms)")]
    duration_ms: String,
}

/// Print a performance timing table to stdout.
pub fn print_perf_summary(report: &PerfReport) {
    if report.timings.is_empty() {
        return;
    }

    println!("{}", "PERFORMANCE".bold().cyan());

    let rows: Vec<PerfRow> = report
        .timings
        .iter()
        .map(|t| PerfRow {
            operation: t.operation.dimmed().to_string(),
            fixture: t.fixture.to_string().bold().to_string(),
            rows: t.rows.to_string(),
            duration_ms: format_duration(t.duration_ms),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..=3)).with(Alignment::right()))
        .to_string();

    println!("{table}");

    println!(
        "  Total: {} row(s) loaded  ·  {} row(s) written  ·  {} ms elapsed",
        report.total_rows_loaded.to_string().bold(),
        report.total_rows_written.to_string().bold(),
        format_duration(report.total_ms),
    );
    println!();
}

fn format_duration(ms: u128) -> String {
    if ms >= 1_000 {
        format!("{:.1}s", ms as f64 / 1_000.0).yellow().to_string()
    } else if ms >= 100 {
        ms.to_string().yellow().to_string()
    } else {
        ms.to_string().green().to_string()
    }
}
