use crate::infrastructure::db::dialect::Dialect;

/// One persisted column: name plus its portable type definition.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub ddl: &'static str,
}

const fn col(name: &'static str, ddl: &'static str) -> ColumnSpec {
    ColumnSpec { name, ddl }
}

/// Layout of one per-fixture table. Every such table carries a surrogate
/// `id`, the owning `fixture_api_id`, and is unique on
/// `(fixture_api_id, key_column)`.
#[derive(Debug)]
pub struct TableSpec {
    pub name: &'static str,
    pub key_column: &'static str,
    /// Value columns, in bind order.
    pub columns: &'static [ColumnSpec],
}

pub const FIXTURE_COLUMN: &str = "fixture_api_id";

const INT: &str = "BIGINT NOT NULL";
const INT_NULL: &str = "BIGINT";
const REAL_NULL: &str = "DOUBLE PRECISION";
const KEY: &str = "VARCHAR(255) NOT NULL";
const TEXT_NULL: &str = "VARCHAR(255)";
const SIDE: &str = "VARCHAR(8) NOT NULL";

pub const MATCH_PLAYERS: TableSpec = TableSpec {
    name: "match_players",
    key_column: "player_key",
    columns: &[
        col("player_key", KEY),
        col("provider_id", INT_NULL),
        col("name", TEXT_NULL),
        col("number", INT_NULL),
        col("position", TEXT_NULL),
        col("side", SIDE),
        col("non_lineup_player", INT),
        col("source", "VARCHAR(16) NOT NULL"),
    ],
};

pub const MATCH_EVENTS: TableSpec = TableSpec {
    name: "match_events",
    key_column: "event_key",
    columns: &[
        col("event_key", KEY),
        col("side", SIDE),
        col("minute", INT),
        col("extra_minute", INT_NULL),
        col("kind", "VARCHAR(64) NOT NULL"),
        col("detail", TEXT_NULL),
        col("player_key", TEXT_NULL),
        col("assist_key", TEXT_NULL),
    ],
};

pub const PLAYER_STATS: TableSpec = TableSpec {
    name: "player_stats",
    key_column: "player_key",
    columns: &[
        col("player_key", KEY),
        col("side", SIDE),
        col("minutes_played", INT_NULL),
        col("rating", REAL_NULL),
        col("goals", INT),
        col("assists", INT),
        col("shots", INT),
        col("passes", INT),
        col("tackles", INT),
        col("yellow_cards", INT),
        col("red_cards", INT),
    ],
};

pub const TEAM_STATS: TableSpec = TableSpec {
    name: "team_stats",
    key_column: "side",
    columns: &[
        col("side", SIDE),
        col("possession", REAL_NULL),
        col("shots", INT),
        col("shots_on_target", INT),
        col("corners", INT),
        col("fouls", INT),
        col("offsides", INT),
        col("yellow_cards", INT),
        col("red_cards", INT),
    ],
};

pub const MATCH_TABLES: [&TableSpec; 4] = [&MATCH_PLAYERS, &MATCH_EVENTS, &PLAYER_STATS, &TEAM_STATS];

fn placeholders(dialect: &dyn Dialect, from: usize, count: usize) -> Vec<String> {
    (from..from + count).map(|n| dialect.placeholder(n)).collect()
}

fn quoted_columns(layout: &TableSpec, dialect: &dyn Dialect) -> Vec<String> {
    layout.columns.iter().map(|c| dialect.quote_ident(c.name)).collect()
}

// ─── DDL ───

pub fn create_fixtures_sql(dialect: &dyn Dialect) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({}, {} VARCHAR(255) NOT NULL, {} BIGINT NOT NULL, {} VARCHAR(40), UNIQUE ({}))",
        dialect.quote_ident("fixtures"),
        dialect.id_column(),
        dialect.quote_ident("uid"),
        dialect.quote_ident("api_id"),
        dialect.quote_ident("kickoff"),
        dialect.quote_ident("uid"),
    )
}

pub fn create_table_sql(layout: &TableSpec, dialect: &dyn Dialect) -> String {
    let mut defs = vec![
        dialect.id_column().to_string(),
        format!("{} BIGINT NOT NULL", dialect.quote_ident(FIXTURE_COLUMN)),
    ];
    defs.extend(
        layout.columns
            .iter()
            .map(|c| format!("{} {}", dialect.quote_ident(c.name), c.ddl)),
    );
    defs.push(format!(
        "UNIQUE ({}, {})",
        dialect.quote_ident(FIXTURE_COLUMN),
        dialect.quote_ident(layout.key_column)
    ));
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        dialect.quote_ident(layout.name),
        defs.join(", ")
    )
}

// ─── Fixtures ───

pub fn select_fixture_sql(dialect: &dyn Dialect) -> String {
    format!(
        "SELECT {}, {}, {} FROM {} WHERE {} = {}",
        dialect.quote_ident("uid"),
        dialect.quote_ident("api_id"),
        dialect.quote_ident("kickoff"),
        dialect.quote_ident("fixtures"),
        dialect.quote_ident("uid"),
        dialect.placeholder(1)
    )
}

pub fn upsert_fixture_sql(dialect: &dyn Dialect) -> String {
    format!(
        "INSERT INTO {} ({}, {}, {}) VALUES ({}) {}",
        dialect.quote_ident("fixtures"),
        dialect.quote_ident("uid"),
        dialect.quote_ident("api_id"),
        dialect.quote_ident("kickoff"),
        placeholders(dialect, 1, 3).join(", "),
        dialect.upsert_clause(&["uid"], &["api_id", "kickoff"])
    )
}

// ─── Per-fixture rows ───

/// `SELECT id, <columns> … WHERE fixture_api_id = ? ORDER BY id`
pub fn select_rows_sql(layout: &TableSpec, dialect: &dyn Dialect) -> String {
    format!(
        "SELECT {}, {} FROM {} WHERE {} = {} ORDER BY {}",
        dialect.quote_ident("id"),
        quoted_columns(layout, dialect).join(", "),
        dialect.quote_ident(layout.name),
        dialect.quote_ident(FIXTURE_COLUMN),
        dialect.placeholder(1),
        dialect.quote_ident("id")
    )
}

/// Binds `fixture_api_id` first, then the value columns.
pub fn insert_row_sql(layout: &TableSpec, dialect: &dyn Dialect) -> String {
    let mut cols = vec![dialect.quote_ident(FIXTURE_COLUMN)];
    cols.extend(quoted_columns(layout, dialect));
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        dialect.quote_ident(layout.name),
        cols.join(", "),
        placeholders(dialect, 1, cols.len()).join(", ")
    )
}

/// Binds the value columns, then `id`.
pub fn update_row_sql(layout: &TableSpec, dialect: &dyn Dialect) -> String {
    let sets: Vec<String> = layout
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = {}", dialect.quote_ident(c.name), dialect.placeholder(i + 1)))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {} = {}",
        dialect.quote_ident(layout.name),
        sets.join(", "),
        dialect.quote_ident("id"),
        dialect.placeholder(layout.columns.len() + 1)
    )
}

pub fn delete_row_sql(layout: &TableSpec, dialect: &dyn Dialect) -> String {
    format!(
        "DELETE FROM {} WHERE {} = {}",
        dialect.quote_ident(layout.name),
        dialect.quote_ident("id"),
        dialect.placeholder(1)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::dialect::{MysqlDialect, PostgresDialect, SqliteDialect};

    #[test]
    fn team_stats_ddl_is_unique_per_fixture_and_side() {
        let sql = create_table_sql(&TEAM_STATS, &PostgresDialect);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"team_stats\" (\"id\" BIGSERIAL PRIMARY KEY, \"fixture_api_id\" BIGINT NOT NULL, \"side\" VARCHAR(8) NOT NULL"));
        assert!(sql.ends_with("UNIQUE (\"fixture_api_id\", \"side\"))"));
    }

    #[test]
    fn insert_numbers_placeholders_after_fixture_column() {
        let sql = insert_row_sql(&TEAM_STATS, &SqliteDialect);
        assert!(sql.starts_with("INSERT INTO \"team_stats\" (\"fixture_api_id\", \"side\", \"possession\""));
        assert!(sql.ends_with("VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"));
    }

    #[test]
    fn update_binds_id_last() {
        let sql = update_row_sql(&MATCH_EVENTS, &PostgresDialect);
        assert!(sql.contains("\"event_key\" = $1"));
        assert!(sql.ends_with("WHERE \"id\" = $9"));

        let sql = update_row_sql(&MATCH_EVENTS, &MysqlDialect);
        assert!(sql.ends_with("WHERE `id` = ?"));
        assert!(!sql.contains('$'));
    }

    #[test]
    fn select_is_ordered_by_id() {
        assert_eq!(
            select_rows_sql(&TEAM_STATS, &MysqlDialect),
            "SELECT `id`, `side`, `possession`, `shots`, `shots_on_target`, `corners`, `fouls`, `offsides`, `yellow_cards`, `red_cards` \
             FROM `team_stats` WHERE `fixture_api_id` = ? ORDER BY `id`"
        );
    }

    #[test]
    fn fixture_upsert_uses_dialect_clause() {
        let pg = upsert_fixture_sql(&PostgresDialect);
        assert!(pg.contains("VALUES ($1, $2, $3) ON CONFLICT (\"uid\")"));
        let my = upsert_fixture_sql(&MysqlDialect);
        assert!(my.contains("VALUES (?, ?, ?) ON DUPLICATE KEY UPDATE"));
    }
}
