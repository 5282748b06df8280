use crate::domain::changeset::MatchChangeSets;
use crate::domain::ports::MatchStore;
use crate::domain::records::ExistingMatch;
use crate::domain::value_objects::{FixtureApiId, FixtureIdentity, FixtureUid};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{info, instrument};

// ─── PerfReport ──────────────────────────────────────────────────────────────

/// A single timed store operation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OpTiming {
    /// Operation name: "load_existing" or "apply_change_sets".
    pub operation: &'static str,
    /// Fixture the operation ran for.
    pub fixture: FixtureApiId,
    /// Elapsed wall time in milliseconds.
    pub duration_ms: u128,
    /// Rows loaded or written.
    pub rows: usize,
}

/// Accumulated store timings, shared across decorators via `Arc<Mutex<_>>`.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct PerfReport {
    pub timings: Vec<OpTiming>,
    pub total_rows_loaded: usize,
    pub total_rows_written: usize,
    pub total_ms: u128,
}

impl PerfReport {
    pub fn new() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::default()))
    }

    fn record(report: &Arc<Mutex<Self>>, timing: OpTiming) {
        if let Ok(mut r) = report.lock() {
            r.total_ms += timing.duration_ms;
            match timing.operation {
                "load_existing" => r.total_rows_loaded += timing.rows,
                _ => r.total_rows_written += timing.rows,
            }
            r.timings.push(timing);
        }
    }

    /// Copy of the current state, for printing.
    pub fn snapshot(report: &Arc<Mutex<Self>>) -> Self {
        report.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

// ─── MonitoringMatchStore ────────────────────────────────────────────────────

/// Decorator: wraps any `MatchStore`, measures wall time of loads and
/// applies, and appends the result to the shared `PerfReport`.
pub struct MonitoringMatchStore {
    inner: Arc<dyn MatchStore>,
    report: Arc<Mutex<PerfReport>>,
}

impl MonitoringMatchStore {
    pub fn new(inner: Arc<dyn MatchStore>, report: Arc<Mutex<PerfReport>>) -> Self {
        Self { inner, report }
    }
}

#[async_trait]
impl MatchStore for MonitoringMatchStore {
    async fn find_fixture(&self, uid: &FixtureUid) -> Result<Option<FixtureIdentity>> {
        self.inner.find_fixture(uid).await
    }

    async fn upsert_fixture(&self, fixture: &FixtureIdentity) -> Result<()> {
        self.inner.upsert_fixture(fixture).await
    }

    #[instrument(
        name = "load_existing",
        skip(self, api_id),
        fields(fixture.api_id = %api_id),
        level = "info"
    )]
    async fn load_existing(&self, api_id: FixtureApiId) -> Result<ExistingMatch> {
        let start = Instant::now();
        let existing = self.inner.load_existing(api_id).await?;
        let duration_ms = start.elapsed().as_millis();
        let rows = existing.row_count();

        info!(fixture = %api_id, rows, duration_ms, "load_existing completed");

        PerfReport::record(
            &self.report,
            OpTiming {
                operation: "load_existing",
                fixture: api_id,
                duration_ms,
                rows,
            },
        );

        Ok(existing)
    }

    #[instrument(
        name = "apply_change_sets",
        skip(self, api_id, sets),
        fields(fixture.api_id = %api_id, changes = sets.summary().total_changes),
        level = "info"
    )]
    async fn apply_change_sets(&self, api_id: FixtureApiId, sets: &MatchChangeSets) -> Result<()> {
        let start = Instant::now();
        self.inner.apply_change_sets(api_id, sets).await?;
        let duration_ms = start.elapsed().as_millis();
        let rows = sets.summary().total_changes;

        info!(fixture = %api_id, rows, duration_ms, "apply_change_sets completed");

        PerfReport::record(
            &self.report,
            OpTiming {
                operation: "apply_change_sets",
                fixture: api_id,
                duration_ms,
                rows,
            },
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::store::memory::InMemoryMatchStore;

    #[tokio::test]
    async fn records_one_timing_per_store_call() {
        let report = PerfReport::new();
        let store = MonitoringMatchStore::new(Arc::new(InMemoryMatchStore::new()), Arc::clone(&report));

        store.load_existing(FixtureApiId(1)).await.unwrap();
        store
            .apply_change_sets(FixtureApiId(1), &MatchChangeSets::default())
            .await
            .unwrap();

        let snapshot = PerfReport::snapshot(&report);
        let ops: Vec<&str> = snapshot.timings.iter().map(|t| t.operation).collect();
        assert_eq!(ops, vec!["load_existing", "apply_change_sets"]);
        assert_eq!(snapshot.total_rows_loaded, 0);
        assert_eq!(snapshot.total_rows_written, 0);
    }
}
