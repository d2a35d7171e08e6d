use blockpen_editor::{EditorConfig, DEFAULT_CONFIG_NAME};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Blockpen CLI configuration (`blockpen.config.json`)
///
/// Editor tunables sit at the top level next to `storeDir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding the file-backed draft store
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    #[serde(flatten)]
    pub editor: EditorConfig,
}

fn default_store_dir() -> String {
    ".blockpen".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Absolute path to the store directory
    pub fn get_store_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.store_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            editor: EditorConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "storeDir": "drafts",
            "storagePrefix": "my-blog",
            "autosaveDelayMs": 250
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.store_dir, "drafts");
        assert_eq!(config.editor.storage_prefix, "my-blog");
        assert_eq!(config.editor.autosave_delay_ms, 250);
        assert_eq!(config.editor.history_capacity, 50);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.store_dir, ".blockpen");
        assert_eq!(config.editor, EditorConfig::default());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{ "language": "de" }"#).unwrap();

        let cwd = dir.path().display().to_string();
        let config = Config::load(&cwd).unwrap();
        assert_eq!(config.editor.language, "de");
        assert_eq!(config.get_store_dir(&cwd), dir.path().join(".blockpen"));
    }
}
