// ─────────────────────────────────────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────────────────────────────────────

/// SQL dialect: the handful of places where the supported drivers disagree.
///
/// Pure string manipulation with no sqlx dependency; the query builders in
/// `sql_utils` call into it.
pub trait Dialect: Send + Sync {
    /// Driver name as a lowercase string ("postgres", "mysql", …).
    /// Used in log lines only, never for branching.
    fn name(&self) -> &'static str;

    /// Quote an identifier (table, column).
    /// - MySQL / MariaDB → backtick: `` `col` ``
    /// - PostgreSQL / SQLite → double-quote: `"col"`
    fn quote_ident(&self, s: &str) -> String;

    /// Bind placeholder for the `n`-th parameter, 1-based.
    fn placeholder(&self, n: usize) -> String;

    /// Column definition of the surrogate `id` primary key.
    fn id_column(&self) -> &'static str;

    /// Tail of an INSERT that turns it into an upsert on `conflict_cols`,
    /// overwriting `update_cols` with the incoming values.
    fn upsert_clause(&self, conflict_cols: &[&str], update_cols: &[&str]) -> String {
        let conflict: Vec<String> = conflict_cols.iter().map(|c| self.quote_ident(c)).collect();
        let sets: Vec<String> = update_cols
            .iter()
            .map(|c| {
                let q = self.quote_ident(c);
                format!("{q} = EXCLUDED.{q}")
            })
            .collect();
        format!("ON CONFLICT ({}) DO UPDATE SET {}", conflict.join(", "), sets.join(", "))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ─────────────────────────────────────────────────────────────────────────────

pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_ident(&self, s: &str) -> String {
        format!("\"{}\"", s.replace('"', "\"\""))
    }

    fn placeholder(&self, n: usize) -> String {
        format!("${n}")
    }

    fn id_column(&self) -> &'static str {
        "\"id\" BIGSERIAL PRIMARY KEY"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MySQL / MariaDB
// ─────────────────────────────────────────────────────────────────────────────

pub struct MysqlDialect;

impl Dialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_ident(&self, s: &str) -> String {
        format!("`{}`", s.replace('`', "``"))
    }

    fn placeholder(&self, _n: usize) -> String {
        "?".to_string()
    }

    fn id_column(&self) -> &'static str {
        "`id` BIGINT AUTO_INCREMENT PRIMARY KEY"
    }

    fn upsert_clause(&self, _conflict_cols: &[&str], update_cols: &[&str]) -> String {
        // MySQL infers the conflicting key from the table's unique indexes.
        let sets: Vec<String> = update_cols
            .iter()
            .map(|c| {
                let q = self.quote_ident(c);
                format!("{q} = VALUES({q})")
            })
            .collect();
        format!("ON DUPLICATE KEY UPDATE {}", sets.join(", "))
    }
}

// MariaDB shares MySQL's syntax for everything used here.
pub struct MariadbDialect;

impl Dialect for MariadbDialect {
    fn name(&self) -> &'static str {
        "mariadb"
    }

    fn quote_ident(&self, s: &str) -> String {
        MysqlDialect.quote_ident(s)
    }

    fn placeholder(&self, n: usize) -> String {
        MysqlDialect.placeholder(n)
    }

    fn id_column(&self) -> &'static str {
        MysqlDialect.id_column()
    }

    fn upsert_clause(&self, conflict_cols: &[&str], update_cols: &[&str]) -> String {
        MysqlDialect.upsert_clause(conflict_cols, update_cols)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite
// ─────────────────────────────────────────────────────────────────────────────

pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_ident(&self, s: &str) -> String {
        format!("\"{}\"", s.replace('"', "\"\""))
    }

    fn placeholder(&self, n: usize) -> String {
        format!("${n}")
    }

    fn id_column(&self) -> &'static str {
        "\"id\" INTEGER PRIMARY KEY AUTOINCREMENT"
    }
}

/// Pick the dialect for a configured driver name. Unknown names fall back
/// to PostgreSQL, matching `DbConfig::url`.
pub fn from_driver(driver: &str) -> Box<dyn Dialect> {
    match driver {
        "mysql" => Box::new(MysqlDialect),
        "mariadb" => Box::new(MariadbDialect),
        "sqlite" => Box::new(SqliteDialect),
        _ => Box::new(PostgresDialect),
    }
}
