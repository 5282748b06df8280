use crate::domain::{
    changeset::MatchChangeSets,
    job::{JobKey, Trigger},
    outcome::SyncReport,
    payload::RawMatchPayload,
    records::ExistingMatch,
    value_objects::{FixtureApiId, FixtureIdentity, FixtureUid},
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Port: one external data provider (implemented by JsonFileProvider)
#[async_trait]
pub trait ProviderSync: Send + Sync {
    fn name(&self) -> &'static str;
    fn supports(&self, fixture: &FixtureIdentity) -> bool;
    async fn fetch(&self, fixture: &FixtureIdentity) -> Result<RawMatchPayload>;
}

/// Port: relational store (implemented by SqlxMatchStore and InMemoryMatchStore)
#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn find_fixture(&self, uid: &FixtureUid) -> Result<Option<FixtureIdentity>>;
    async fn upsert_fixture(&self, fixture: &FixtureIdentity) -> Result<()>;
    async fn load_existing(&self, api_id: FixtureApiId) -> Result<ExistingMatch>;
    /// Apply every change-set atomically: either all of them land or none do.
    async fn apply_change_sets(&self, api_id: FixtureApiId, sets: &MatchChangeSets) -> Result<()>;
}

/// Port: recurring-job substrate (implemented by TokioJobScheduler)
#[async_trait]
pub trait JobScheduler: Send + Sync {
    async fn schedule(&self, key: JobKey, trigger: Trigger) -> Result<()>;
    /// Returns `true` if a job was registered under `key`.
    async fn cancel(&self, key: &JobKey) -> Result<bool>;
    async fn exists(&self, key: &JobKey) -> Result<bool>;
}

/// Port: work executed on each job tick (implemented by SyncJobHandler)
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn run(&self, key: &JobKey);
}

/// Port: wall clock (implemented by SystemClock and FixedClock)
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Port: report export format (implemented by JsonWriter)
pub trait OutputWriter {
    fn format(&self, report: &SyncReport) -> Result<String>;
    fn extension(&self) -> &'static str;
}
