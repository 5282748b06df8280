use crate::domain::{outcome::SyncReport, ports::OutputWriter};
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use self::json::JsonWriter;

pub mod json;

pub fn writer_for(format: &str) -> Option<Box<dyn OutputWriter>> {
    match format {
        "json" => Some(Box::new(JsonWriter)),
        _ => None,
    }
}

/// Writes the report to `<dir>/<sync_id>.<ext>` and returns the path.
pub fn write_to_file(writer: &dyn OutputWriter, report: &SyncReport, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let content = writer.format(report)?;
    let path = dir.join(format!("{}.{}", report.sync_id, writer.extension()));
    fs::write(&path, &content)?;
    Ok(path)
}
