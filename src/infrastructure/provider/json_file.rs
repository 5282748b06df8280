use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::payload::RawMatchPayload;
use crate::domain::ports::ProviderSync;
use crate::domain::value_objects::FixtureIdentity;

/// Provider that replays payloads from disk: `<dir>/<fixture uid>.json`.
///
/// Supports a fixture iff its payload file exists. The file is re-read on
/// every fetch so an external process can keep it current.
pub struct JsonFileProvider {
    dir: PathBuf,
}

impl JsonFileProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn payload_path(&self, fixture: &FixtureIdentity) -> PathBuf {
        self.dir.join(format!("{}.json", fixture.uid))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ProviderSync for JsonFileProvider {
    fn name(&self) -> &'static str {
        "json-file"
    }

    fn supports(&self, fixture: &FixtureIdentity) -> bool {
        self.payload_path(fixture).is_file()
    }

    async fn fetch(&self, fixture: &FixtureIdentity) -> Result<RawMatchPayload> {
        let path = self.payload_path(fixture);
        debug!(path = %path.display(), "reading payload");
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read payload {}", path.display()))?;
        let payload = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse payload {}", path.display()))?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{FixtureApiId, FixtureUid, Side};

    fn fixture(uid: &str) -> FixtureIdentity {
        FixtureIdentity {
            uid: FixtureUid::new(uid),
            api_id: FixtureApiId(1),
            kickoff: None,
        }
    }

    #[tokio::test]
    async fn reads_payload_of_supported_fixture() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("fx-1.json"),
            r#"{
                "fixture": {"status_code": "2H", "elapsed_minutes": 67},
                "lineups": [{"side": "home", "starting": [{"id": 4, "name": "Four"}]}],
                "team_stats": [{"side": "away", "possession": 41.5, "shots": 6}]
            }"#,
        )
        .unwrap();
        let provider = JsonFileProvider::new(dir.path());

        assert!(provider.supports(&fixture("fx-1")));
        assert!(!provider.supports(&fixture("fx-2")));

        let payload = provider.fetch(&fixture("fx-1")).await.unwrap();
        assert_eq!(payload.fixture.status_code, "2H");
        assert_eq!(payload.fixture.elapsed_minutes, Some(67));
        assert_eq!(payload.lineups[0].side, Side::Home);
        assert_eq!(payload.team_stats[0].possession, Some(41.5));
        assert!(payload.events.is_empty());
    }

    #[tokio::test]
    async fn malformed_payload_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        let provider = JsonFileProvider::new(dir.path());

        let err = provider.fetch(&fixture("bad")).await.unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse payload"));
    }
}
