//! JSON file store for local source state.
//!
//! Keeps a single `state.json` under the store root. Writes go to a temp
//! file first and are renamed into place.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use super::local::SourceState;
use super::Result;

const STATE_FILE: &str = "state.json";

/// File-based JSON store for [`SourceState`].
pub struct JsonStateStore {
    root: PathBuf,
}

impl JsonStateStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Path of the state file.
    pub fn state_path(&self) -> PathBuf {
        self.root.join(STATE_FILE)
    }

    /// Load saved state, if any.
    pub async fn load(&self) -> Result<Option<SourceState>> {
        let path = self.state_path();
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).await?;
        let state = serde_json::from_str(&content)?;
        debug!("Loaded state from {}", path.display());
        Ok(Some(state))
    }

    /// Persist state.
    pub async fn save(&self, state: &SourceState) -> Result<()> {
        let path = self.state_path();
        let tmp = self.root.join(format!("{STATE_FILE}.tmp"));
        let content = serde_json::to_string_pretty(state)?;
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &path).await?;
        debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Remove saved state.
    pub async fn clear(&self) -> Result<()> {
        let path = self.state_path();
        if fs::try_exists(&path).await? {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use smokefree_core::SessionContext;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonStateStore::new(dir.path().join("state")).await.unwrap();
        assert!(store.load().await.unwrap().is_none());

        let anchor = Utc.with_ymd_and_hms(2026, 9, 9, 9, 0, 0).unwrap();
        let mut state = SourceState::new(SessionContext::default().with_quit_anchor(anchor));
        state.relapse_count = 2;
        store.save(&state).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.session, state.session);
        assert_eq!(loaded.milestones.len(), state.milestones.len());
        for (a, b) in loaded.milestones.iter().zip(&state.milestones) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.target_date, b.target_date);
        }
        assert_eq!(loaded.relapse_count, 2);

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_json_error() {
        let dir = TempDir::new().unwrap();
        let store = JsonStateStore::new(dir.path()).await.unwrap();
        std::fs::write(store.state_path(), "{not json").unwrap();

        assert!(matches!(store.load().await, Err(crate::SourceError::Json(_))));
    }
}
