pub mod delete;
pub mod export;
pub mod import;
pub mod list;
pub mod show;

pub use delete::{delete, DeleteArgs};
pub use export::{export, ExportArgs};
pub use import::{import, ImportArgs};
pub use list::{list, ListArgs};
pub use show::{show, ShowArgs};

use crate::config::Config;
use anyhow::{Context, Result};
use blockpen_editor::{DraftStore, EditorContext, FileStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Options shared by every subcommand
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub store_dir: Option<PathBuf>,
}

/// Open the draft store named by the config, or by `--store-dir`.
pub fn open_drafts(cwd: &str, options: &GlobalOptions) -> Result<DraftStore> {
    let config = Config::load(cwd)?;
    let dir = options
        .store_dir
        .clone()
        .unwrap_or_else(|| config.get_store_dir(cwd));

    let store = FileStore::open(dir.clone())
        .with_context(|| format!("Cannot open draft store at {}", dir.display()))?;
    tracing::debug!("[CLI] Using draft store at {}", dir.display());

    let ctx = EditorContext::new(config.editor, Arc::new(store));
    Ok(DraftStore::from_context(&ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockpen_editor::EditorDocument;

    #[test]
    fn test_store_dir_override_persists_across_opens() {
        let cwd = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        let options = GlobalOptions {
            store_dir: Some(store.path().to_path_buf()),
        };
        let cwd = cwd.path().display().to_string();

        let drafts = open_drafts(&cwd, &options).unwrap();
        let saved = drafts
            .save(None, Some("CLI"), &EditorDocument::new("Hello", Vec::new()))
            .unwrap();

        let reopened = open_drafts(&cwd, &options).unwrap();
        let listed = reopened.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, saved.id);
        assert_eq!(listed[0].name, "CLI");
    }
}
