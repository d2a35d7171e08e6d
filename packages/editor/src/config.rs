//! Editor configuration.
//!
//! Read from `blockpen.config.json` when present; every field has a default
//! so partial files are accepted.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::EditorError;

pub const DEFAULT_CONFIG_NAME: &str = "blockpen.config.json";

/// Tunables shared by the editor core and its hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Key prefix in the key-value store (`<prefix>-draft-<id>`, ...)
    #[serde(default = "default_storage_prefix")]
    pub storage_prefix: String,

    /// Maximum number of history entries kept for undo
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Debounce delay between the last mutation and the autosave write
    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,

    /// Upper bound on a single mirror push/delete
    #[serde(default = "default_mirror_timeout_ms")]
    pub mirror_timeout_ms: u64,

    /// Upper bound on a single AI round-trip
    #[serde(default = "default_ai_timeout_ms")]
    pub ai_timeout_ms: u64,

    /// Content language forwarded to the AI assistant
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_storage_prefix() -> String {
    "blog-editor".to_string()
}

fn default_history_capacity() -> usize {
    50
}

fn default_autosave_delay_ms() -> u64 {
    1000
}

fn default_mirror_timeout_ms() -> u64 {
    10_000
}

fn default_ai_timeout_ms() -> u64 {
    60_000
}

fn default_language() -> String {
    "en".to_string()
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults if the file is absent.
    pub fn load(dir: &Path) -> Result<Self, EditorError> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(EditorConfig::default())
        }
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    pub fn mirror_timeout(&self) -> Duration {
        Duration::from_millis(self.mirror_timeout_ms)
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_millis(self.ai_timeout_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            storage_prefix: default_storage_prefix(),
            history_capacity: default_history_capacity(),
            autosave_delay_ms: default_autosave_delay_ms(),
            mirror_timeout_ms: default_mirror_timeout_ms(),
            ai_timeout_ms: default_ai_timeout_ms(),
            language: default_language(),
        }
    }
}
