use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dirs::home_dir;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

const STATE_FILE: &str = "state.json";

/// A rule row kept between invocations until it is combined or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftRule {
    pub id: u64,
    pub rule: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionData {
    #[serde(default)]
    last_output: Option<String>,
    #[serde(default)]
    drafts: Vec<DraftRule>,
    #[serde(default)]
    next_draft_id: u64,
}

/// Client-side state: the text last shown for a rule and the draft rows.
pub struct SessionStore {
    path: PathBuf,
    data: SessionData,
}

impl SessionStore {
    pub fn open(state_dir: Option<&Path>) -> Result<Self, CliError> {
        let dir = match state_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_state_dir()?,
        };
        Self::load(dir.join(STATE_FILE))
    }

    pub fn load(path: PathBuf) -> Result<Self, CliError> {
        let data = if path.exists() {
            let contents = fs::read(&path).map_err(|err| CliError::state(&path, err))?;
            if contents.is_empty() {
                SessionData::default()
            } else {
                serde_json::from_slice(&contents)
                    .map_err(|err| CliError::state(&path, format!("invalid state file: {err}")))?
            }
        } else {
            SessionData::default()
        };

        Ok(Self { path, data })
    }

    pub fn save(&self) -> Result<(), CliError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| CliError::state(parent, err))?;
        }
        let serialized = serde_json::to_string_pretty(&self.data)
            .map_err(|err| CliError::state(&self.path, err))?;
        fs::write(&self.path, serialized).map_err(|err| CliError::state(&self.path, err))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_output(&self) -> Option<&str> {
        self.data.last_output.as_deref()
    }

    pub fn set_last_output(&mut self, text: impl Into<String>) {
        self.data.last_output = Some(text.into());
    }

    pub fn drafts(&self) -> &[DraftRule] {
        &self.data.drafts
    }

    /// Appends a row and returns its id. Ids are never reused.
    pub fn add_draft(&mut self, rule: impl Into<String>) -> u64 {
        self.data.next_draft_id += 1;
        let id = self.data.next_draft_id;
        self.data.drafts.push(DraftRule {
            id,
            rule: rule.into(),
            added_at: Utc::now(),
        });
        id
    }

    pub fn remove_draft(&mut self, id: u64) -> Result<DraftRule, CliError> {
        let position = self
            .data
            .drafts
            .iter()
            .position(|draft| draft.id == id)
            .ok_or_else(|| CliError::Input(format!("draft {id} not found")))?;
        Ok(self.data.drafts.remove(position))
    }

    pub fn clear_drafts(&mut self) -> usize {
        let removed = self.data.drafts.len();
        self.data.drafts.clear();
        removed
    }

    /// Draft rule strings with blank rows dropped.
    pub fn draft_rules(&self) -> Vec<String> {
        self.data
            .drafts
            .iter()
            .map(|draft| draft.rule.clone())
            .filter(|rule| !rule.trim().is_empty())
            .collect()
    }
}

fn default_state_dir() -> Result<PathBuf, CliError> {
    let mut path = home_dir().ok_or_else(|| {
        CliError::Input("could not determine home directory; pass --state-dir".into())
    })?;
    path.push(".arbiter");
    Ok(path)
}
