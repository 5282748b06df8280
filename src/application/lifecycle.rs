use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::application::sync::SyncOrchestrator;
use crate::domain::job::{JobContext, JobKey, Phase, Trigger};
use crate::domain::outcome::SyncOutcome;
use crate::domain::ports::{Clock, JobHandler, JobScheduler, MatchStore};
use crate::domain::value_objects::{FixtureIdentity, FixtureUid};

/// Repeat interval of each phase's polling job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingIntervals {
    pub pre_match: Duration,
    pub live: Duration,
    pub post_match: Duration,
}

impl Default for PollingIntervals {
    fn default() -> Self {
        Self {
            pre_match: Duration::from_secs(300),
            live: Duration::from_secs(60),
            post_match: Duration::from_secs(300),
        }
    }
}

impl PollingIntervals {
    pub fn for_phase(&self, phase: Phase) -> Duration {
        match phase {
            Phase::PreMatch => self.pre_match,
            Phase::Live => self.live,
            Phase::PostMatch => self.post_match,
        }
    }
}

/// What the controller did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed; the current job fires again on its schedule.
    Keep,
    /// The current job was cancelled.
    Cancelled,
    /// The current job was cancelled and the post-match job registered.
    HandedToPostMatch,
}

// ─── Job Lifecycle Controller ───

/// Turns sync outcomes into job substrate mutations.
///
/// | outcome                              | effect                               |
/// |--------------------------------------|--------------------------------------|
/// | `PreMatch`, terminate (pre-match job)| cancel pre-match, keep live job      |
/// | `Live`, seen by the pre-match job    | cancel pre-match, keep live job      |
/// | `Live`, match finished               | cancel current, register post-match  |
/// | `PostMatch`, stop polling            | cancel current job (terminal)        |
/// | `Error`, or any other case           | nothing, next tick retries           |
pub struct JobLifecycleController {
    scheduler: Arc<dyn JobScheduler>,
    clock: Arc<dyn Clock>,
    intervals: PollingIntervals,
}

impl JobLifecycleController {
    pub fn new(scheduler: Arc<dyn JobScheduler>, clock: Arc<dyn Clock>, intervals: PollingIntervals) -> Self {
        Self {
            scheduler,
            clock,
            intervals,
        }
    }

    pub async fn on_outcome(
        &self,
        fixture: &FixtureUid,
        outcome: &SyncOutcome,
        ctx: &JobContext,
    ) -> Result<Transition> {
        let current = &ctx.key;
        let phase = ctx.phase();
        let transition = match outcome.clone().for_job(phase) {
            SyncOutcome::PreMatch {
                should_terminate_pre_match_job: true,
                ..
            } if phase == Phase::PreMatch => self.retire_pre_match(fixture, current).await?,
            SyncOutcome::PreMatch { .. } => Transition::Keep,
            SyncOutcome::Live {
                is_match_finished: true,
                ..
            } => {
                self.scheduler.cancel(current).await?;
                let post = JobKey::new(Phase::PostMatch, fixture.clone());
                let trigger = Trigger::starting_at(self.clock.now(), self.intervals.post_match);
                self.register(post, trigger).await?;
                Transition::HandedToPostMatch
            }
            // Kick-off passed between two pre-match ticks.
            SyncOutcome::Live { .. } if phase == Phase::PreMatch => {
                self.retire_pre_match(fixture, current).await?
            }
            SyncOutcome::Live { .. } => Transition::Keep,
            SyncOutcome::PostMatch {
                should_stop_polling: true,
                ..
            } => {
                self.scheduler.cancel(current).await?;
                info!(fixture = %fixture, "polling finished for fixture");
                Transition::Cancelled
            }
            SyncOutcome::PostMatch { .. } => Transition::Keep,
            SyncOutcome::Error { .. } => Transition::Keep,
        };

        debug!(job = %current, outcome = outcome.label(), transition = ?transition, "outcome handled");
        Ok(transition)
    }

    /// Cancel the pre-match job, making sure the live job carries on polling.
    async fn retire_pre_match(&self, fixture: &FixtureUid, current: &JobKey) -> Result<Transition> {
        self.scheduler.cancel(current).await?;
        let live = JobKey::new(Phase::Live, fixture.clone());
        if !self.scheduler.exists(&live).await? {
            let trigger = Trigger::starting_at(self.clock.now(), self.intervals.live);
            self.register(live, trigger).await?;
        }
        Ok(Transition::Cancelled)
    }

    /// Register the jobs of a newly trackable fixture.
    ///
    /// The pre-match job starts now when kickoff is still ahead; the live job
    /// starts at kickoff (or now if kickoff is unknown or already past).
    pub async fn register_fixture(&self, fixture: &FixtureIdentity) -> Result<()> {
        let now = self.clock.now();
        let kickoff = fixture.kickoff.unwrap_or(now);

        if kickoff > now {
            self.register(
                JobKey::new(Phase::PreMatch, fixture.uid.clone()),
                Trigger::starting_at(now, self.intervals.pre_match),
            )
            .await?;
        }
        self.register(
            JobKey::new(Phase::Live, fixture.uid.clone()),
            Trigger::starting_at(kickoff.max(now), self.intervals.live),
        )
        .await
    }

    /// Idempotent registration: an existing job under `key` is replaced.
    async fn register(&self, key: JobKey, trigger: Trigger) -> Result<()> {
        if self.scheduler.exists(&key).await? {
            self.scheduler.cancel(&key).await?;
        }
        info!(job = %key, start_at = %trigger.start_at, every_secs = trigger.every.as_secs(), "registering job");
        self.scheduler.schedule(key, trigger).await
    }
}

// ─── SyncJobHandler ───

/// What runs on every job tick: one sync, then the lifecycle decision.
pub struct SyncJobHandler {
    orchestrator: Arc<SyncOrchestrator>,
    controller: Arc<JobLifecycleController>,
}

impl SyncJobHandler {
    pub fn new(orchestrator: Arc<SyncOrchestrator>, controller: Arc<JobLifecycleController>) -> Self {
        Self {
            orchestrator,
            controller,
        }
    }
}

#[async_trait]
impl JobHandler for SyncJobHandler {
    async fn run(&self, key: &JobKey) {
        let outcome = self.orchestrator.sync_fixture(&key.fixture).await;
        let ctx = JobContext::new(key.clone());
        if let Err(err) = self.controller.on_outcome(&key.fixture, &outcome, &ctx).await {
            error!(job = %key, error = %err, "job transition failed");
        }
    }
}

/// Upsert the fixture and register its polling jobs.
pub async fn track_fixture(
    store: &dyn MatchStore,
    controller: &JobLifecycleController,
    fixture: &FixtureIdentity,
) -> Result<()> {
    store.upsert_fixture(fixture).await?;
    controller.register_fixture(fixture).await
}
