use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::PaperResult;

const SCRATCH_DIR: &str = ".report_temp";

/// Local working area for one workflow run: a scratch directory plus room
/// for archives and rendered files next to it. Two runs must not share a
/// workspace.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    _temp: Option<TempDir>,
}

impl Workspace {
    /// Fresh directory removed when the workspace is dropped.
    pub fn temporary() -> PaperResult<Self> {
        let temp = tempfile::Builder::new().prefix("paperdash-").tempdir()?;
        Ok(Self {
            root: temp.path().to_path_buf(),
            _temp: Some(temp),
        })
    }

    /// Existing or new directory that outlives the workspace.
    pub fn at(root: impl Into<PathBuf>) -> PaperResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root, _temp: None })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.root.join(SCRATCH_DIR)
    }

    pub fn archive_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.zip"))
    }

    /// Deletes the scratch directory and recreates it empty.
    pub fn reset_scratch(&self) -> PaperResult<PathBuf> {
        let scratch = self.scratch_dir();
        if scratch.exists() {
            std::fs::remove_dir_all(&scratch)?;
        }
        std::fs::create_dir_all(&scratch)?;
        Ok(scratch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_is_removed_on_drop() {
        let workspace = Workspace::temporary().unwrap();
        let root = workspace.root().to_path_buf();
        workspace.reset_scratch().unwrap();
        assert!(root.join(".report_temp").is_dir());

        drop(workspace);
        assert!(!root.exists());
    }

    #[test]
    fn test_persistent_workspace_survives() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("runs").join("weekly");
        {
            let workspace = Workspace::at(&root).unwrap();
            std::fs::write(workspace.archive_path("weekly"), b"zip").unwrap();
        }
        assert!(root.join("weekly.zip").exists());
    }

    #[test]
    fn test_reset_scratch_clears_contents() {
        let workspace = Workspace::temporary().unwrap();
        let scratch = workspace.reset_scratch().unwrap();
        std::fs::write(scratch.join("stale.png"), b"x").unwrap();

        let scratch = workspace.reset_scratch().unwrap();
        assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
    }

    #[test]
    fn test_paths() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::at(dir.path().join("ws")).unwrap();
        assert!(workspace.scratch_dir().ends_with(".report_temp"));
        assert!(workspace.archive_path("monthly").ends_with("monthly.zip"));
    }
}
