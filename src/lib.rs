use anyhow::Result;
use std::sync::{Arc, Mutex};

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

// ─── Log level ────────────────────────────────────────────────────────────────

/// Controls the verbosity of matchsync's internal tracing output.
///
/// Pass to [`init_tracing`] before calling any async entry point.
///
/// | Variant | `tracing` level | When to use                              |
/// |---------|-----------------|------------------------------------------|
/// | `Error` | `error`         | `--quiet` / CI scripting                 |
/// | `Info`  | `info`          | Default: one line per sync and per job   |
/// | `Debug` | `debug`         | `--verbose`: SQL statements, job ticks   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    #[default]
    Info,
    Debug,
}

/// Initialise the global `tracing` subscriber for matchsync.
///
/// Respects `RUST_LOG` when set, falling back to `level` otherwise. Call
/// once at startup. Library consumers that manage their own subscriber
/// should skip this.
///
/// Only available with the `cli` feature (pulls in `tracing-subscriber`).
#[cfg(feature = "cli")]
pub fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;

    let default_filter = match level {
        LogLevel::Error => "matchsync=error",
        LogLevel::Info => "matchsync=info",
        LogLevel::Debug => "matchsync=debug",
    };

    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

// ─── Public API Facade ───

pub use application::identity::{has_complete_lineup, PlayerIdentityResolver};
pub use application::lifecycle::{JobLifecycleController, PollingIntervals, SyncJobHandler, Transition};
pub use application::monitoring::PerfReport;
pub use application::phase::{PhaseAnalyzer, PhaseInput, PhaseThresholds};
pub use application::planner::ChangeSetPlanner;
pub use application::sync::{ProviderRegistry, SyncOrchestrator};
pub use domain::changeset::{ChangeSet, MatchChangeSets, Summary, SyncSummary};
pub use domain::errors::{DroppedRecord, SyncError};
pub use domain::job::{JobContext, JobKey, Phase, Trigger};
pub use domain::outcome::{SyncOutcome, SyncReport};
pub use domain::payload::RawMatchPayload;
pub use domain::ports::{Clock, JobHandler, JobScheduler, MatchStore, ProviderSync};
pub use domain::value_objects::{FixtureApiId, FixtureIdentity, FixtureUid, MatchPlayerKey, Side};
pub use infrastructure::config::{AppConfig, DbConfig, FixtureConfig, ProviderConfig, SyncConfig};

use crate::application::lifecycle::track_fixture;
use crate::application::monitoring::MonitoringMatchStore;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::db::client::connect;
use crate::infrastructure::provider::json_file::JsonFileProvider;
use crate::infrastructure::scheduler::TokioJobScheduler;
use crate::infrastructure::store::memory::InMemoryMatchStore;

// ─── Engine ───

/// Everything needed to sync fixtures and keep their polling jobs running,
/// wired around one store.
pub struct Engine {
    store: Arc<dyn MatchStore>,
    orchestrator: Arc<SyncOrchestrator>,
    controller: Arc<JobLifecycleController>,
    scheduler: Arc<TokioJobScheduler>,
    // The scheduler only holds this weakly.
    _handler: Arc<dyn JobHandler>,
    report: Arc<Mutex<PerfReport>>,
}

impl Engine {
    /// Wire an engine around `store`, timing every store call.
    pub fn new(cfg: &AppConfig, store: Arc<dyn MatchStore>) -> Result<Self> {
        let report = PerfReport::new();
        let store: Arc<dyn MatchStore> =
            Arc::new(MonitoringMatchStore::new(store, Arc::clone(&report)));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let replay: Arc<dyn ProviderSync> =
            Arc::new(JsonFileProvider::new(&cfg.provider.payload_dir));
        let providers = ProviderRegistry::new(vec![replay]);
        let orchestrator = Arc::new(SyncOrchestrator::new(
            providers,
            Arc::clone(&store),
            Arc::clone(&clock),
            PhaseAnalyzer::new(cfg.sync.thresholds()),
        ));

        let scheduler = Arc::new(TokioJobScheduler::new(Arc::clone(&clock)));
        let controller = Arc::new(JobLifecycleController::new(
            scheduler.clone(),
            clock,
            cfg.sync.intervals(),
        ));
        let handler: Arc<dyn JobHandler> = Arc::new(SyncJobHandler::new(
            Arc::clone(&orchestrator),
            Arc::clone(&controller),
        ));
        scheduler.bind(&handler)?;

        Ok(Self {
            store,
            orchestrator,
            controller,
            scheduler,
            _handler: handler,
            report,
        })
    }

    /// One sync pass for `uid`, outside of any job.
    pub async fn sync(&self, uid: &FixtureUid) -> SyncReport {
        self.orchestrator.sync_fixture_with_report(uid).await
    }

    /// Upsert the fixture and register its polling jobs.
    pub async fn track(&self, fixture: &FixtureIdentity) -> Result<()> {
        track_fixture(self.store.as_ref(), &self.controller, fixture).await
    }

    /// Track every configured fixture; returns how many were registered.
    pub async fn track_all(&self, fixtures: &[FixtureConfig]) -> Result<usize> {
        for fixture in fixtures {
            self.track(&fixture.identity()).await?;
        }
        Ok(fixtures.len())
    }

    /// Keys of all live polling jobs.
    pub fn jobs(&self) -> Result<Vec<JobKey>> {
        self.scheduler.jobs()
    }

    /// Stop every polling job. Runs in flight still complete.
    pub fn shutdown(&self) -> Result<usize> {
        self.scheduler.shutdown()
    }

    pub fn perf(&self) -> PerfReport {
        PerfReport::snapshot(&self.report)
    }
}

// ─── Public entry points ───

/// Engine over the configured database.
pub async fn build_engine(cfg: &AppConfig) -> Result<Engine> {
    let store = Arc::new(connect(&cfg.database).await?);
    Engine::new(cfg, store)
}

/// Engine over an in-memory store seeded with the configured fixtures.
///
/// Nothing touches the database, so a sync shows what a first pass against
/// an empty store would write.
pub async fn build_dry_run_engine(cfg: &AppConfig) -> Result<Engine> {
    let store = Arc::new(InMemoryMatchStore::new());
    for fixture in &cfg.fixtures {
        store.upsert_fixture(&fixture.identity()).await?;
    }
    Engine::new(cfg, store)
}

/// Create the tables in the configured database.
pub async fn migrate(cfg: &AppConfig) -> Result<()> {
    connect(&cfg.database).await?.migrate().await
}

/// Upsert every configured fixture into the database without scheduling.
pub async fn register_fixtures(cfg: &AppConfig) -> Result<usize> {
    let store = connect(&cfg.database).await?;
    for fixture in &cfg.fixtures {
        store.upsert_fixture(&fixture.identity()).await?;
    }
    Ok(cfg.fixtures.len())
}
