use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::application::extract::extract;
use crate::application::identity::{has_complete_lineup, PlayerIdentityResolver};
use crate::application::phase::{PhaseAnalyzer, PhaseInput};
use crate::application::planner::{link_player_stats, ChangeSetPlanner};
use crate::domain::errors::SyncError;
use crate::domain::outcome::{SyncOutcome, SyncReport};
use crate::domain::ports::{Clock, MatchStore, ProviderSync};
use crate::domain::value_objects::{FixtureIdentity, FixtureUid};

// ─── Provider Registry ───

/// Ordered list of providers. The first one supporting a fixture is used.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ProviderSync>>,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<Arc<dyn ProviderSync>>) -> Self {
        Self { providers }
    }

    pub fn find(&self, fixture: &FixtureIdentity) -> Option<&Arc<dyn ProviderSync>> {
        self.providers.iter().find(|p| p.supports(fixture))
    }
}

// ─── Sync Orchestrator ───

/// Runs one sync pass for one fixture and classifies the result.
///
/// Steps, in order: locate the provider, fetch, extract, resolve players,
/// link statistics, load what is persisted, plan, apply in one transaction,
/// analyze the phase. Callers always get a [`SyncOutcome`]; fixture-level
/// failures become `SyncOutcome::Error`.
pub struct SyncOrchestrator {
    providers: ProviderRegistry,
    store: Arc<dyn MatchStore>,
    clock: Arc<dyn Clock>,
    resolver: PlayerIdentityResolver,
    planner: ChangeSetPlanner,
    analyzer: PhaseAnalyzer,
}

impl SyncOrchestrator {
    pub fn new(
        providers: ProviderRegistry,
        store: Arc<dyn MatchStore>,
        clock: Arc<dyn Clock>,
        analyzer: PhaseAnalyzer,
    ) -> Self {
        Self {
            providers,
            store,
            clock,
            resolver: PlayerIdentityResolver::new(),
            planner: ChangeSetPlanner::new(),
            analyzer,
        }
    }

    pub async fn sync_fixture(&self, uid: &FixtureUid) -> SyncOutcome {
        self.sync_fixture_with_report(uid).await.outcome
    }

    #[instrument(name = "sync_fixture", skip(self, uid), fields(fixture = %uid), level = "info")]
    pub async fn sync_fixture_with_report(&self, uid: &FixtureUid) -> SyncReport {
        let fixture = match self.store.find_fixture(uid).await {
            Ok(Some(fixture)) => fixture,
            Ok(None) => return self.failed(uid, None, SyncError::UnknownFixture(uid.clone())),
            Err(err) => {
                return self.failed(uid, None, SyncError::Persistence(format!("{err:#}")));
            }
        };

        match self.run(&fixture).await {
            Ok(report) => report,
            Err(err) => self.failed(uid, fixture.kickoff, err),
        }
    }

    async fn run(&self, fixture: &FixtureIdentity) -> Result<SyncReport, SyncError> {
        let provider = self
            .providers
            .find(fixture)
            .ok_or_else(|| SyncError::NoSupportingProvider(fixture.uid.clone()))?;

        let payload = provider
            .fetch(fixture)
            .await
            .map_err(|err| SyncError::Provider {
                provider: provider.name().to_string(),
                message: format!("{err:#}"),
            })?;

        let mut extracted = extract(&payload);
        let players = self.resolver.resolve(
            &extracted.lineup,
            &extracted.event_players,
            &extracted.stat_players,
        )?;
        let player_stats = link_player_stats(
            std::mem::take(&mut extracted.player_stats),
            &players,
            &mut extracted.dropped,
        );

        let existing = self
            .store
            .load_existing(fixture.api_id)
            .await
            .map_err(|err| SyncError::Persistence(format!("{err:#}")))?;

        let sets = self.planner.plan_match(
            &players,
            std::mem::take(&mut extracted.events),
            player_stats,
            std::mem::take(&mut extracted.team_stats),
            existing,
        );
        let summary = sets.summary();

        self.store
            .apply_change_sets(fixture.api_id, &sets)
            .await
            .map_err(|err| SyncError::Persistence(format!("{err:#}")))?;

        let now = self.clock.now();
        let outcome = self.analyzer.analyze(
            &PhaseInput {
                status_code: payload.fixture.status_code.clone(),
                elapsed_minutes: payload.fixture.elapsed_minutes,
                kickoff: payload.fixture.kickoff.or(fixture.kickoff),
                has_complete_lineup: has_complete_lineup(&players),
            },
            now,
        );

        info!(
            provider = provider.name(),
            outcome = outcome.label(),
            changes = summary.total_changes,
            dropped = extracted.dropped.len(),
            "fixture synced"
        );

        Ok(SyncReport::new(
            fixture.uid.clone(),
            now,
            outcome,
            Some(summary),
            extracted.dropped,
        ))
    }

    fn failed(
        &self,
        uid: &FixtureUid,
        kickoff: Option<chrono::DateTime<chrono::Utc>>,
        err: SyncError,
    ) -> SyncReport {
        warn!(fixture = %uid, error = %err, "fixture sync failed");
        SyncReport::new(
            uid.clone(),
            self.clock.now(),
            SyncOutcome::Error {
                message: err.to_string(),
                kickoff_time: kickoff,
            },
            None,
            Vec::new(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::changeset::MatchChangeSets;
    use crate::domain::payload::{FixtureState, LineupDto, PlayerRef, RawMatchPayload};
    use crate::domain::records::ExistingMatch;
    use crate::domain::value_objects::{FixtureApiId, Side};
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::store::memory::InMemoryMatchStore;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};

    struct StaticProvider {
        name: &'static str,
        accepts: bool,
        payload: Option<RawMatchPayload>,
    }

    #[async_trait]
    impl ProviderSync for StaticProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn supports(&self, _fixture: &FixtureIdentity) -> bool {
            self.accepts
        }

        async fn fetch(&self, _fixture: &FixtureIdentity) -> Result<RawMatchPayload> {
            self.payload.clone().ok_or_else(|| anyhow!("upstream timed out"))
        }
    }

    struct FailingStore {
        fixture: FixtureIdentity,
    }

    #[async_trait]
    impl MatchStore for FailingStore {
        async fn find_fixture(&self, _uid: &FixtureUid) -> Result<Option<FixtureIdentity>> {
            Ok(Some(self.fixture.clone()))
        }
        async fn upsert_fixture(&self, _fixture: &FixtureIdentity) -> Result<()> {
            Ok(())
        }
        async fn load_existing(&self, _api_id: FixtureApiId) -> Result<ExistingMatch> {
            Ok(ExistingMatch::default())
        }
        async fn apply_change_sets(&self, _api_id: FixtureApiId, _sets: &MatchChangeSets) -> Result<()> {
            Err(anyhow!("deadlock detected"))
        }
    }

    fn kickoff() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 11, 19, 0, 0).unwrap()
    }

    fn fixture() -> FixtureIdentity {
        FixtureIdentity {
            uid: FixtureUid::new("fx-1"),
            api_id: FixtureApiId(1001),
            kickoff: Some(kickoff()),
        }
    }

    fn lineup_payload() -> RawMatchPayload {
        let p = |id: i64| PlayerRef {
            id: Some(id),
            name: Some(format!("P{id}")),
            number: Some(id as i32),
            position: None,
        };
        RawMatchPayload {
            fixture: FixtureState {
                status_code: "NS".into(),
                elapsed_minutes: None,
                kickoff: Some(kickoff()),
            },
            lineups: vec![
                LineupDto {
                    side: Side::Home,
                    starting: vec![p(1)],
                    substitutes: vec![],
                },
                LineupDto {
                    side: Side::Away,
                    starting: vec![p(2)],
                    substitutes: vec![],
                },
            ],
            ..RawMatchPayload::default()
        }
    }

    fn provider(name: &'static str, accepts: bool, payload: Option<RawMatchPayload>) -> Arc<dyn ProviderSync> {
        Arc::new(StaticProvider {
            name,
            accepts,
            payload,
        })
    }

    fn orchestrator(store: Arc<dyn MatchStore>, providers: Vec<Arc<dyn ProviderSync>>) -> SyncOrchestrator {
        SyncOrchestrator::new(
            ProviderRegistry::new(providers),
            store,
            Arc::new(FixedClock::new(kickoff() - Duration::hours(2))),
            PhaseAnalyzer::default(),
        )
    }

    #[tokio::test]
    async fn unknown_fixture_is_an_error_outcome() {
        let store = Arc::new(InMemoryMatchStore::new());
        let orch = orchestrator(store, vec![]);
        let out = orch.sync_fixture(&FixtureUid::new("missing")).await;
        assert!(matches!(out, SyncOutcome::Error { kickoff_time: None, .. }));
    }

    #[tokio::test]
    async fn no_supporting_provider_is_an_error_outcome() {
        let store = Arc::new(InMemoryMatchStore::new());
        store.upsert_fixture(&fixture()).await.unwrap();
        let orch = orchestrator(store, vec![provider("other", false, None)]);

        match orch.sync_fixture(&fixture().uid).await {
            SyncOutcome::Error {
                message,
                kickoff_time,
            } => {
                assert!(message.contains("no registered provider"));
                assert_eq!(kickoff_time, Some(kickoff()));
            }
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn first_supporting_provider_wins() {
        let store = Arc::new(InMemoryMatchStore::new());
        store.upsert_fixture(&fixture()).await.unwrap();
        let orch = orchestrator(
            store,
            vec![
                provider("skipped", false, None),
                provider("primary", true, Some(lineup_payload())),
                provider("secondary", true, None),
            ],
        );

        let out = orch.sync_fixture(&fixture().uid).await;
        assert_eq!(
            out,
            SyncOutcome::PreMatch {
                lineup_cached: true,
                kickoff_time: Some(kickoff()),
                should_terminate_pre_match_job: true,
            }
        );
    }

    #[tokio::test]
    async fn provider_failure_is_an_error_outcome() {
        let store = Arc::new(InMemoryMatchStore::new());
        store.upsert_fixture(&fixture()).await.unwrap();
        let orch = orchestrator(store, vec![provider("flaky", true, None)]);

        let out = orch.sync_fixture(&fixture().uid).await;
        match out {
            SyncOutcome::Error { message, .. } => assert!(message.contains("upstream timed out")),
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn persistence_failure_is_an_error_outcome() {
        let store = Arc::new(FailingStore { fixture: fixture() });
        let orch = orchestrator(store, vec![provider("primary", true, Some(lineup_payload()))]);

        let report = orch.sync_fixture_with_report(&fixture().uid).await;
        assert!(report.outcome.is_error());
        assert!(report.summary.is_none());
    }

    #[tokio::test]
    async fn report_counts_created_players() {
        let store = Arc::new(InMemoryMatchStore::new());
        store.upsert_fixture(&fixture()).await.unwrap();
        let orch = orchestrator(
            store.clone(),
            vec![provider("primary", true, Some(lineup_payload()))],
        );

        let report = orch.sync_fixture_with_report(&fixture().uid).await;
        let summary = report.summary.unwrap();
        assert_eq!(summary.players.creates, 2);
        assert_eq!(summary.total_changes, 2);

        let existing = store.load_existing(FixtureApiId(1001)).await.unwrap();
        assert_eq!(existing.players.len(), 2);
    }
}
