//! Input draft persistence.
//!
//! The composer's unsent text survives restarts. Drafts live in a
//! small JSON map at `$PAH_HOME/state.json` under a fixed key, so the
//! format has room for other persisted scraps later.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::paths;

const DRAFT_KEY: &str = "chat-input";

/// Loads and saves the composer draft.
#[derive(Debug, Clone)]
pub struct DraftStore {
    path: PathBuf,
}

impl DraftStore {
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(paths::state_path()?))
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The saved draft, if any. A missing or unreadable state file is
    /// treated as no draft.
    pub fn load(&self) -> Option<String> {
        let map = read_state(&self.path).ok()?;
        map.get(DRAFT_KEY).filter(|s| !s.is_empty()).cloned()
    }

    pub fn save(&self, draft: &str) -> Result<()> {
        if draft.is_empty() {
            return self.clear();
        }
        let mut map = read_state(&self.path).unwrap_or_default();
        map.insert(DRAFT_KEY.to_owned(), draft.to_owned());
        self.write_state(&map)
    }

    pub fn clear(&self) -> Result<()> {
        let Ok(mut map) = read_state(&self.path) else {
            return Ok(());
        };
        if map.remove(DRAFT_KEY).is_some() {
            self.write_state(&map)?;
        }
        Ok(())
    }

    fn write_state(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, contents)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

fn read_state(path: &Path) -> Result<BTreeMap<String, String>> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
