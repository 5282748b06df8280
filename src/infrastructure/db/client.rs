use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::any::{Any, AnyPoolOptions};
use sqlx::{AnyPool, Row, Transaction};
use std::sync::Arc;
use tracing::debug;

use crate::domain::changeset::{ChangeSet, MatchChangeSets};
use crate::domain::ports::MatchStore;
use crate::domain::records::{ExistingMatch, Stored};
use crate::domain::value_objects::{FixtureApiId, FixtureIdentity, FixtureUid};
use crate::infrastructure::config::DbConfig;
use crate::infrastructure::db::dialect::{from_driver, Dialect};
use crate::infrastructure::db::row_mapper::{bind_value, RowRecord, SqlValue};
use crate::infrastructure::db::sql_utils::{
    create_fixtures_sql, create_table_sql, delete_row_sql, insert_row_sql, select_fixture_sql,
    select_rows_sql, update_row_sql, upsert_fixture_sql, MATCH_TABLES,
};

pub struct SqlxMatchStore {
    pool: AnyPool,
    dialect: Arc<dyn Dialect>,
}

/// Connect to the database described in `cfg` and return a `SqlxMatchStore`.
pub async fn connect(cfg: &DbConfig) -> Result<SqlxMatchStore> {
    sqlx::any::install_default_drivers();

    let pool = AnyPoolOptions::new()
        .max_connections(cfg.max_connections.max(1))
        .connect(&cfg.url())
        .await
        .with_context(|| {
            format!(
                "Failed to connect to {} (driver: {})",
                cfg.dbname, cfg.driver
            )
        })?;

    debug!(
        "Connected to {}/{} via {} driver",
        cfg.host, cfg.dbname, cfg.driver
    );

    Ok(SqlxMatchStore {
        pool,
        dialect: Arc::from(from_driver(&cfg.driver)),
    })
}

impl SqlxMatchStore {
    /// Create every table this store needs. Safe to run repeatedly.
    pub async fn migrate(&self) -> Result<()> {
        let d = self.dialect.as_ref();
        let mut statements = vec![create_fixtures_sql(d)];
        statements.extend(MATCH_TABLES.iter().map(|layout| create_table_sql(layout, d)));

        for sql in &statements {
            debug!("Executing: {}", sql);
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to migrate ({})", d.name()))?;
        }
        Ok(())
    }

    async fn load_table<T: RowRecord>(&self, api_id: FixtureApiId) -> Result<Vec<Stored<T>>> {
        let layout = T::table();
        let sql = select_rows_sql(layout, self.dialect.as_ref());
        let rows = sqlx::query(&sql)
            .bind(api_id.0)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to query {} for fixture {}", layout.name, api_id))?;

        rows.iter()
            .map(|row| {
                Ok(Stored {
                    id: row.try_get("id")?,
                    value: T::from_row(row)
                        .with_context(|| format!("Failed to decode a {} row", layout.name))?,
                })
            })
            .collect()
    }

    /// Deletes first, then updates, then creates, so a key that moved between
    /// rows never trips the unique index.
    async fn apply_table<T: RowRecord>(
        &self,
        tx: &mut Transaction<'static, Any>,
        api_id: FixtureApiId,
        cs: &ChangeSet<T, Stored<T>>,
    ) -> Result<()> {
        let layout = T::table();
        let d = self.dialect.as_ref();

        if !cs.to_delete.is_empty() {
            let sql = delete_row_sql(layout, d);
            for row in &cs.to_delete {
                sqlx::query(&sql)
                    .bind(row.id)
                    .execute(&mut **tx)
                    .await
                    .with_context(|| format!("Failed to delete {} row {}", layout.name, row.id))?;
            }
        }

        if !cs.to_update.is_empty() {
            let sql = update_row_sql(layout, d);
            for upd in &cs.to_update {
                let mut query = sqlx::query(&sql);
                for value in upd.incoming.values() {
                    query = bind_value(query, &value);
                }
                query
                    .bind(upd.existing.id)
                    .execute(&mut **tx)
                    .await
                    .with_context(|| {
                        format!("Failed to update {} row {}", layout.name, upd.existing.id)
                    })?;
            }
        }

        if !cs.to_create.is_empty() {
            let sql = insert_row_sql(layout, d);
            for record in &cs.to_create {
                let mut query = sqlx::query(&sql).bind(api_id.0);
                for value in record.values() {
                    query = bind_value(query, &value);
                }
                query
                    .execute(&mut **tx)
                    .await
                    .with_context(|| format!("Failed to insert into {}", layout.name))?;
            }
        }

        debug!(
            table = layout.name,
            creates = cs.to_create.len(),
            updates = cs.to_update.len(),
            deletes = cs.to_delete.len(),
            "table applied"
        );
        Ok(())
    }
}

#[async_trait]
impl MatchStore for SqlxMatchStore {
    async fn find_fixture(&self, uid: &FixtureUid) -> Result<Option<FixtureIdentity>> {
        let sql = select_fixture_sql(self.dialect.as_ref());
        let row = sqlx::query(&sql)
            .bind(uid.as_str().to_string())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to look up fixture {uid}"))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let kickoff: Option<String> = row.try_get("kickoff")?;
        let kickoff = kickoff
            .map(|raw| {
                DateTime::parse_from_rfc3339(&raw)
                    .map(|t| t.with_timezone(&Utc))
                    .with_context(|| format!("Invalid kickoff '{raw}' for fixture {uid}"))
            })
            .transpose()?;

        Ok(Some(FixtureIdentity {
            uid: FixtureUid::new(row.try_get::<String, _>("uid")?),
            api_id: FixtureApiId(row.try_get("api_id")?),
            kickoff,
        }))
    }

    async fn upsert_fixture(&self, fixture: &FixtureIdentity) -> Result<()> {
        let sql = upsert_fixture_sql(self.dialect.as_ref());
        let kickoff = SqlValue::Text(fixture.kickoff.map(|t| t.to_rfc3339()));
        let query = sqlx::query(&sql)
            .bind(fixture.uid.as_str().to_string())
            .bind(fixture.api_id.0);
        bind_value(query, &kickoff)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to upsert fixture {}", fixture.uid))?;
        Ok(())
    }

    async fn load_existing(&self, api_id: FixtureApiId) -> Result<ExistingMatch> {
        Ok(ExistingMatch {
            players: self.load_table(api_id).await?,
            events: self.load_table(api_id).await?,
            player_stats: self.load_table(api_id).await?,
            team_stats: self.load_table(api_id).await?,
        })
    }

    async fn apply_change_sets(&self, api_id: FixtureApiId, sets: &MatchChangeSets) -> Result<()> {
        if sets.summary().total_changes == 0 {
            return Ok(());
        }

        // Dropping `tx` on any early return rolls everything back.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to open transaction")?;

        self.apply_table(&mut tx, api_id, &sets.players).await?;
        self.apply_table(&mut tx, api_id, &sets.events).await?;
        self.apply_table(&mut tx, api_id, &sets.player_stats).await?;
        self.apply_table(&mut tx, api_id, &sets.team_stats).await?;

        tx.commit()
            .await
            .with_context(|| format!("Failed to commit changes for fixture {api_id}"))?;
        Ok(())
    }
}
