use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PaperResult;

pub const CONFIG_FILE: &str = "config.json";
pub const MARKDOWN_FILE: &str = "report.md";

/// Resumable state written next to `report.md`, enough to rebuild a
/// `Report` from a preserved scratch directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub engine: String,
    pub variables: BTreeMap<String, String>,
    pub verbosity: u8,
}

impl ReportConfig {
    pub fn read(dir: &Path) -> PaperResult<Self> {
        let raw = std::fs::read_to_string(dir.join(CONFIG_FILE))?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write(&self, dir: &Path) -> PaperResult<()> {
        std::fs::write(dir.join(CONFIG_FILE), serde_json::to_string(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_snapshot_written_by_other_tools() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"engine": "default", "variables": {"title": "Weekly"}, "verbosity": 1}"#,
        )
        .unwrap();

        let config = ReportConfig::read(dir.path()).unwrap();
        assert_eq!(config.engine, "default");
        assert_eq!(config.variables["title"], "Weekly");
        assert_eq!(config.verbosity, 1);
    }

    #[test]
    fn test_missing_snapshot_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ReportConfig::read(dir.path()),
            Err(crate::error::PaperError::Io(_))
        ));
    }

    #[test]
    fn test_snapshot_keys() {
        let dir = tempfile::tempdir().unwrap();
        ReportConfig {
            engine: "minimal".to_string(),
            variables: BTreeMap::new(),
            verbosity: 0,
        }
        .write(dir.path())
        .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap())
                .unwrap();
        let mut keys: Vec<_> = raw.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["engine", "variables", "verbosity"]);
    }
}
