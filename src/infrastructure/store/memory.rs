use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::domain::changeset::{ChangeSet, MatchChangeSets};
use crate::domain::ports::MatchStore;
use crate::domain::records::{ExistingMatch, Stored};
use crate::domain::value_objects::{FixtureApiId, FixtureIdentity, FixtureUid};

#[derive(Debug, Default)]
struct State {
    fixtures: BTreeMap<FixtureUid, FixtureIdentity>,
    matches: BTreeMap<FixtureApiId, ExistingMatch>,
    next_id: i64,
}

/// `MatchStore` held in process memory.
///
/// Change-sets are applied to a copy of the fixture's rows and swapped in
/// only if every step succeeds, so a failing apply leaves nothing behind.
#[derive(Debug, Default)]
pub struct InMemoryMatchStore {
    state: Mutex<State>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow::anyhow!("in-memory store lock poisoned"))
    }
}

#[async_trait]
impl MatchStore for InMemoryMatchStore {
    async fn find_fixture(&self, uid: &FixtureUid) -> Result<Option<FixtureIdentity>> {
        Ok(self.lock()?.fixtures.get(uid).cloned())
    }

    async fn upsert_fixture(&self, fixture: &FixtureIdentity) -> Result<()> {
        self.lock()?
            .fixtures
            .insert(fixture.uid.clone(), fixture.clone());
        Ok(())
    }

    async fn load_existing(&self, api_id: FixtureApiId) -> Result<ExistingMatch> {
        Ok(self.lock()?.matches.get(&api_id).cloned().unwrap_or_default())
    }

    async fn apply_change_sets(&self, api_id: FixtureApiId, sets: &MatchChangeSets) -> Result<()> {
        let mut state = self.lock()?;
        let mut next_id = state.next_id;
        let mut rows = state.matches.get(&api_id).cloned().unwrap_or_default();

        apply(&mut rows.players, &sets.players, &mut next_id)?;
        apply(&mut rows.events, &sets.events, &mut next_id)?;
        apply(&mut rows.player_stats, &sets.player_stats, &mut next_id)?;
        apply(&mut rows.team_stats, &sets.team_stats, &mut next_id)?;

        state.next_id = next_id;
        state.matches.insert(api_id, rows);
        Ok(())
    }
}

fn apply<T: Clone>(
    rows: &mut Vec<Stored<T>>,
    cs: &ChangeSet<T, Stored<T>>,
    next_id: &mut i64,
) -> Result<()> {
    for gone in &cs.to_delete {
        let Some(pos) = rows.iter().position(|r| r.id == gone.id) else {
            bail!("row {} to delete does not exist", gone.id);
        };
        rows.remove(pos);
    }
    for upd in &cs.to_update {
        let Some(row) = rows.iter_mut().find(|r| r.id == upd.existing.id) else {
            bail!("row {} to update does not exist", upd.existing.id);
        };
        row.value = upd.incoming.clone();
    }
    for new in &cs.to_create {
        *next_id += 1;
        rows.push(Stored {
            id: *next_id,
            value: new.clone(),
        });
    }
    Ok(())
}
