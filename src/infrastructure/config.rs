use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::application::lifecycle::PollingIntervals;
use crate::application::phase::{PhaseThresholds, MAX_THRESHOLD_MINUTES};
use crate::domain::value_objects::{FixtureApiId, FixtureIdentity, FixtureUid};

/// Environment variables with this prefix override file values,
/// e.g. `MATCHSYNC__SYNC__LIVE_INTERVAL_SECS=30`.
const ENV_PREFIX: &str = "MATCHSYNC";

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub database: DbConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub fixtures: Vec<FixtureConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    /// Database driver: "postgres" (default), "mysql", "mariadb", or "sqlite".
    #[serde(default = "default_driver")]
    pub driver: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    /// Database name, or the file path (or `:memory:`) for sqlite.
    pub dbname: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_driver() -> String {
    "postgres".to_string()
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Directory holding one `<fixture uid>.json` payload per fixture.
    #[serde(default = "default_payload_dir")]
    pub payload_dir: String,
}

fn default_payload_dir() -> String {
    "payloads".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            payload_dir: default_payload_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    pub post_match_polling_cutoff_minutes: i64,
    pub kickoff_imminent_threshold_minutes: i64,
    pub pre_match_interval_secs: u64,
    pub live_interval_secs: u64,
    pub post_match_interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            post_match_polling_cutoff_minutes: 60,
            kickoff_imminent_threshold_minutes: 1,
            pre_match_interval_secs: 300,
            live_interval_secs: 60,
            post_match_interval_secs: 300,
        }
    }
}

impl SyncConfig {
    pub fn thresholds(&self) -> PhaseThresholds {
        PhaseThresholds {
            post_match_polling_cutoff_minutes: self.post_match_polling_cutoff_minutes,
            kickoff_imminent_threshold_minutes: self.kickoff_imminent_threshold_minutes,
        }
    }

    pub fn intervals(&self) -> PollingIntervals {
        PollingIntervals {
            pre_match: Duration::from_secs(self.pre_match_interval_secs.max(1)),
            live: Duration::from_secs(self.live_interval_secs.max(1)),
            post_match: Duration::from_secs(self.post_match_interval_secs.max(1)),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FixtureConfig {
    pub uid: String,
    pub api_id: i64,
    #[serde(default)]
    pub kickoff: Option<DateTime<Utc>>,
}

impl FixtureConfig {
    pub fn identity(&self) -> FixtureIdentity {
        FixtureIdentity {
            uid: FixtureUid::new(self.uid.clone()),
            api_id: FixtureApiId(self.api_id),
            kickoff: self.kickoff,
        }
    }
}

impl DbConfig {
    /// Build a sqlx-compatible connection URL from this config.
    pub fn url(&self) -> String {
        match self.driver.as_str() {
            "mysql" | "mariadb" => format!(
                "mysql://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.dbname
            ),
            "sqlite" if self.dbname == ":memory:" => "sqlite::memory:".to_string(),
            "sqlite" => format!("sqlite://{}?mode=rwc", self.dbname),
            _ => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.dbname
            ),
        }
    }
}

impl AppConfig {
    /// Load a TOML file, then apply `MATCHSYNC__*` environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let raw = config::Config::builder()
            .add_source(config::File::new(path, config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let cfg: AppConfig = raw
            .try_deserialize()
            .with_context(|| "Failed to parse config TOML")?;
        cfg.sync.validate()?;
        Ok(cfg)
    }
}

impl SyncConfig {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("post_match_polling_cutoff_minutes", self.post_match_polling_cutoff_minutes),
            ("kickoff_imminent_threshold_minutes", self.kickoff_imminent_threshold_minutes),
        ] {
            if !(0..=MAX_THRESHOLD_MINUTES).contains(&value) {
                bail!("sync.{name} must be between 0 and {MAX_THRESHOLD_MINUTES}, got {value}");
            }
        }
        Ok(())
    }
}
