use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::job::{JobKey, Trigger};
use crate::domain::ports::{Clock, JobHandler, JobScheduler};

/// In-process job substrate: one tokio task per job key.
///
/// Each task waits until `start_at`, then calls the bound [`JobHandler`]
/// every `every`. Runs of one job never overlap: the next tick is awaited
/// only after the previous run returned. Cancellation is cooperative, so a
/// run in flight completes and the task exits before the next tick. This is
/// what lets a handler cancel the very job it is running in.
///
/// The handler is held weakly because it usually owns (through the
/// lifecycle controller) an `Arc` of this scheduler.
pub struct TokioJobScheduler {
    jobs: Mutex<HashMap<JobKey, CancellationToken>>,
    handler: OnceLock<Weak<dyn JobHandler>>,
    clock: Arc<dyn Clock>,
}

impl TokioJobScheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            handler: OnceLock::new(),
            clock,
        }
    }

    /// Attach the handler every job runs. Can be done once.
    pub fn bind(&self, handler: &Arc<dyn JobHandler>) -> Result<()> {
        self.handler
            .set(Arc::downgrade(handler))
            .map_err(|_| anyhow!("job handler already bound"))
    }

    /// Keys of all live jobs, sorted.
    pub fn jobs(&self) -> Result<Vec<JobKey>> {
        let mut keys: Vec<JobKey> = self.lock()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    /// Cancel every job. Runs in flight still complete.
    pub fn shutdown(&self) -> Result<usize> {
        let mut jobs = self.lock()?;
        let n = jobs.len();
        for (_, token) in jobs.drain() {
            token.cancel();
        }
        info!(jobs = n, "scheduler shut down");
        Ok(n)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<JobKey, CancellationToken>>> {
        self.jobs.lock().map_err(|_| anyhow!("job table lock poisoned"))
    }
}

#[async_trait]
impl JobScheduler for TokioJobScheduler {
    async fn schedule(&self, key: JobKey, trigger: Trigger) -> Result<()> {
        if trigger.every.is_zero() {
            return Err(anyhow!("job {key} needs a non-zero repeat interval"));
        }
        let Some(handler) = self.handler.get().cloned() else {
            return Err(anyhow!("no job handler bound; cannot schedule {key}"));
        };
        let token = CancellationToken::new();
        if let Some(previous) = self.lock()?.insert(key.clone(), token.clone()) {
            previous.cancel();
            debug!(job = %key, "replaced existing job");
        }

        let delay = (trigger.start_at - self.clock.now()).to_std().unwrap_or_default();
        tokio::spawn(run_job(key, trigger, delay, token, handler));
        Ok(())
    }

    async fn cancel(&self, key: &JobKey) -> Result<bool> {
        match self.lock()?.remove(key) {
            Some(token) => {
                token.cancel();
                debug!(job = %key, "job cancelled");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn exists(&self, key: &JobKey) -> Result<bool> {
        Ok(self.lock()?.contains_key(key))
    }
}

async fn run_job(
    key: JobKey,
    trigger: Trigger,
    delay: std::time::Duration,
    token: CancellationToken,
    handler: Weak<dyn JobHandler>,
) {
    tokio::select! {
        biased;
        _ = token.cancelled() => return,
        _ = tokio::time::sleep(delay) => {}
    }

    let mut ticker = tokio::time::interval(trigger.every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let Some(handler) = handler.upgrade() else {
            warn!(job = %key, "job handler dropped; stopping job");
            break;
        };
        handler.run(&key).await;
    }
    debug!(job = %key, "job task finished");
}
