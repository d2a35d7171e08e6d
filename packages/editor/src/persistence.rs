//! # Draft Persistence
//!
//! [`DraftStore`] owns the draft records, the drafts index and the current
//! draft pointer inside a [`KeyValueStore`].
//!
//! ## Rules
//!
//! - New ids are `draft-<millis>`, bumped by one until no record uses them
//! - `timestamp` is kept from the existing record; `updatedAt` strictly
//!   increases across writes of the same draft
//! - The index is updated in place for known ids; new drafts go to the front
//! - A corrupt index reads as empty (logged), so a bad write can be recovered
//!   from by the next save
//!
//! Errors are returned to the caller; the editor decides whether they are
//! fatal (they never are for the in-memory document).

use std::sync::Arc;

use tracing::{debug, warn};

use crate::block::dedupe_block_ids;
use crate::clock::{Clock, Millis};
use crate::context::EditorContext;
use crate::document::EditorDocument;
use crate::draft::{
    Draft, DraftSummary, DraftsExport, ImportOptions, ImportPayload, ImportResult,
    UNTITLED_DRAFT_NAME,
};
use crate::normalize::normalize_draft;
use crate::storage::{KeyValueStore, StorageError, StorageKeys, StorageResult};

/// Draft name used when the caller gives none: the title, else "Untitled Draft".
pub fn effective_name(name: Option<&str>, title: &str) -> String {
    let explicit = name.map(str::trim).filter(|n| !n.is_empty());
    let from_title = Some(title.trim()).filter(|t| !t.is_empty());
    explicit
        .or(from_title)
        .unwrap_or(UNTITLED_DRAFT_NAME)
        .to_string()
}

#[derive(Clone)]
pub struct DraftStore {
    store: Arc<dyn KeyValueStore>,
    keys: StorageKeys,
    clock: Arc<dyn Clock>,
}

impl DraftStore {
    pub fn new(store: Arc<dyn KeyValueStore>, keys: StorageKeys, clock: Arc<dyn Clock>) -> Self {
        Self { store, keys, clock }
    }

    pub fn from_context(ctx: &EditorContext) -> Self {
        Self::new(ctx.store.clone(), ctx.keys(), ctx.clock.clone())
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// The drafts index in stored order. Missing → empty.
    pub fn list(&self) -> StorageResult<Vec<DraftSummary>> {
        let key = self.keys.drafts_list();
        match self.store.get(&key)? {
            None => Ok(Vec::new()),
            Some(raw) => {
                serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt { key, source })
            }
        }
    }

    /// The drafts index sorted by last modification, newest first.
    pub fn recent(&self) -> StorageResult<Vec<DraftSummary>> {
        let mut drafts = self.list()?;
        drafts.sort_by_key(|d| std::cmp::Reverse(d.last_modified()));
        Ok(drafts)
    }

    pub fn get(&self, id: &str) -> StorageResult<Option<Draft>> {
        let key = self.keys.draft(id);
        match self.store.get(&key)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StorageError::Corrupt { key, source }),
        }
    }

    pub fn exists(&self, id: &str) -> StorageResult<bool> {
        Ok(self.store.get(&self.keys.draft(id))?.is_some())
    }

    /// Mint `draft-<millis>`, bumping the number until the id is free.
    pub fn mint_id(&self) -> StorageResult<String> {
        let index = self.index_or_empty();
        let mut millis = self.clock.now_millis();
        loop {
            let id = format!("draft-{}", millis);
            if !index.iter().any(|d| d.id == id) && !self.exists(&id)? {
                return Ok(id);
            }
            millis += 1;
        }
    }

    /// Write `document` as a draft and make it current.
    ///
    /// `id: None` mints a new draft. `name: None` keeps the stored name, or
    /// derives one from the title for new drafts.
    pub fn save(
        &self,
        id: Option<&str>,
        name: Option<&str>,
        document: &EditorDocument,
    ) -> StorageResult<Draft> {
        let id = match id {
            Some(id) => id.to_string(),
            None => self.mint_id()?,
        };

        let existing = self.existing(&id);
        let now = self.clock.now_millis();

        let name = match name {
            Some(name) => name.to_string(),
            None => existing
                .as_ref()
                .map(|d| d.name.clone())
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| effective_name(None, &document.title)),
        };

        let draft = Draft {
            id: id.clone(),
            name,
            title: document.title.clone(),
            blocks: document.blocks.clone(),
            timestamp: existing.as_ref().map(|d| d.timestamp).unwrap_or(now),
            updated_at: next_updated_at(now, existing.as_ref()),
        };

        self.put(&draft)?;
        self.set_current_id(&id)?;
        debug!("[Persistence] Saved draft {} ({} blocks)", id, draft.blocks.len());

        Ok(draft)
    }

    /// Write a draft record and upsert its index entry. Leaves the current pointer alone.
    pub fn put(&self, draft: &Draft) -> StorageResult<()> {
        let body = serde_json::to_string(draft)?;
        self.store.set(&self.keys.draft(&draft.id), &body)?;

        let mut index = self.index_or_empty();
        let summary = draft.summary();
        match index.iter_mut().find(|entry| entry.id == draft.id) {
            Some(entry) => {
                entry.name = summary.name;
                entry.updated_at = summary.updated_at;
                entry.timestamp = summary.timestamp;
            }
            None => index.insert(0, summary),
        }
        self.write_index(&index)
    }

    /// Remove a draft record and its index entry; clears the current pointer if it
    /// named this draft. Returns false if the draft was unknown.
    pub fn delete(&self, id: &str) -> StorageResult<bool> {
        let had_record = self.exists(id)?;

        let mut index = self.index_or_empty();
        let before = index.len();
        index.retain(|entry| entry.id != id);
        let had_entry = index.len() != before;

        self.store.remove(&self.keys.draft(id))?;
        if had_entry {
            self.write_index(&index)?;
        }
        if self.current_id()?.as_deref() == Some(id) {
            self.clear_current_id()?;
        }

        Ok(had_record || had_entry)
    }

    /// Remove every draft record and the index. Returns how many records were removed.
    pub fn clear_all(&self) -> StorageResult<usize> {
        let mut removed = 0;
        for key in self.store.keys()? {
            if self.keys.draft_id_from_key(&key).is_some() {
                self.store.remove(&key)?;
                removed += 1;
            }
        }
        self.store.remove(&self.keys.drafts_list())?;
        debug!("[Persistence] Cleared {} drafts", removed);
        Ok(removed)
    }

    pub fn current_id(&self) -> StorageResult<Option<String>> {
        Ok(self
            .store
            .get(&self.keys.current_draft_id())?
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty()))
    }

    pub fn set_current_id(&self, id: &str) -> StorageResult<()> {
        self.store.set(&self.keys.current_draft_id(), id)
    }

    pub fn clear_current_id(&self) -> StorageResult<()> {
        self.store.remove(&self.keys.current_draft_id())
    }

    /// Every indexed draft, in index order. Unreadable records are skipped.
    pub fn export_all(&self) -> StorageResult<DraftsExport> {
        let mut drafts = Vec::new();
        for summary in self.list()? {
            match self.get(&summary.id) {
                Ok(Some(draft)) => drafts.push(draft),
                Ok(None) => warn!("[Persistence] Indexed draft {} has no record", summary.id),
                Err(e) => warn!("[Persistence] Skipping draft {} on export: {}", summary.id, e),
            }
        }

        Ok(DraftsExport {
            drafts,
            exported_at: self.clock.now_millis(),
        })
    }

    /// Store drafts from an import file.
    ///
    /// Drafts are normalized and given ids (draft and block) where missing.
    /// With `replace`, all existing drafts are removed once before importing.
    pub fn import(
        &self,
        payload: &ImportPayload,
        options: ImportOptions,
    ) -> StorageResult<ImportResult> {
        if options.replace {
            self.clear_all()?;
        }

        let mut result = ImportResult::default();
        for raw in &payload.drafts {
            let normalized = normalize_draft(raw);
            let mut document = normalized.document;
            dedupe_block_ids(&mut document.blocks, self.clock.as_ref());

            let id = match normalized.id {
                Some(id) => id,
                None => self.mint_id()?,
            };

            let exists = self.exists(&id)?;
            if exists && !options.overwrite {
                debug!("[Persistence] Import skipped existing draft {}", id);
                result.skipped += 1;
                continue;
            }

            let now = self.clock.now_millis();
            let draft = Draft {
                name: effective_name(normalized.name.as_deref(), &document.title),
                id,
                title: document.title,
                blocks: document.blocks,
                timestamp: normalized.timestamp.unwrap_or(now),
                updated_at: normalized.updated_at.unwrap_or(now),
            };
            self.put(&draft)?;

            if exists {
                result.updated += 1;
            } else {
                result.imported += 1;
            }
        }

        Ok(result)
    }

    /// Store a draft pulled from a mirror if it is unknown locally or newer.
    pub fn merge_remote(&self, remote: &Draft) -> StorageResult<bool> {
        let newer = match self.existing(&remote.id) {
            None => true,
            Some(local) => remote.updated_at > local.updated_at,
        };
        if newer {
            self.put(remote)?;
        }
        Ok(newer)
    }

    /// Index, with read failures logged and treated as empty.
    fn index_or_empty(&self) -> Vec<DraftSummary> {
        self.list().unwrap_or_else(|e| {
            warn!("[Persistence] Drafts index unreadable, starting fresh: {}", e);
            Vec::new()
        })
    }

    /// Stored record, with read failures logged and treated as absent.
    fn existing(&self, id: &str) -> Option<Draft> {
        self.get(id).unwrap_or_else(|e| {
            warn!("[Persistence] Draft {} unreadable: {}", id, e);
            None
        })
    }

    fn write_index(&self, index: &[DraftSummary]) -> StorageResult<()> {
        let body = serde_json::to_string(index)?;
        self.store.set(&self.keys.drafts_list(), &body)
    }
}

impl std::fmt::Debug for DraftStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftStore")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

fn next_updated_at(now: Millis, previous: Option<&Draft>) -> Millis {
    match previous {
        Some(prev) => now.max(prev.updated_at + 1),
        None => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn setup() -> (DraftStore, MemoryStore, Arc<ManualClock>) {
        let memory = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(1_000));
        let store = DraftStore::new(
            Arc::new(memory.clone()),
            StorageKeys::new("test"),
            clock.clone(),
        );
        (store, memory, clock)
    }

    fn doc(title: &str) -> EditorDocument {
        EditorDocument::new(title, vec![Block::paragraph("body").with_id("b1")])
    }

    #[test]
    fn test_effective_name() {
        assert_eq!(effective_name(Some("Mine"), "Title"), "Mine");
        assert_eq!(effective_name(Some("  "), "Title"), "Title");
        assert_eq!(effective_name(None, ""), UNTITLED_DRAFT_NAME);
    }

    #[test]
    fn test_save_twice_keeps_one_record() {
        let (drafts, _, _) = setup();

        let first = drafts.save(None, Some("A"), &doc("T")).unwrap();
        // Same clock reading: updatedAt must still move forward
        let second = drafts.save(Some(&first.id), Some("A"), &doc("T2")).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.timestamp, first.timestamp);
        assert!(second.updated_at > first.updated_at);

        let index = drafts.list().unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].updated_at, Some(second.updated_at));
        assert_eq!(drafts.get(&first.id).unwrap().unwrap().title, "T2");
        assert_eq!(drafts.current_id().unwrap(), Some(first.id));
    }

    #[test]
    fn test_mint_id_bumps_until_free() {
        let (drafts, _, _) = setup();
        let a = drafts.save(None, None, &doc("a")).unwrap();
        let b = drafts.save(None, None, &doc("b")).unwrap();

        assert_eq!(a.id, "draft-1000");
        assert_eq!(b.id, "draft-1001");

        // Newest first in the index
        let ids: Vec<_> = drafts.list().unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["draft-1001", "draft-1000"]);
    }

    #[test]
    fn test_save_without_name_keeps_stored_name() {
        let (drafts, _, _) = setup();
        let first = drafts.save(None, Some("Launch"), &doc("T")).unwrap();
        let second = drafts.save(Some(&first.id), None, &doc("Other")).unwrap();
        assert_eq!(second.name, "Launch");

        let fresh = drafts.save(None, None, &doc("")).unwrap();
        assert_eq!(fresh.name, UNTITLED_DRAFT_NAME);
    }

    #[test]
    fn test_recent_sorts_newest_first() {
        let (drafts, _, clock) = setup();
        let old = drafts.save(None, None, &doc("old")).unwrap();
        clock.advance(10);
        let new = drafts.save(None, None, &doc("new")).unwrap();
        clock.advance(10);
        drafts.save(Some(&old.id), None, &doc("old again")).unwrap();

        let ids: Vec<_> = drafts.recent().unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![old.id.clone(), new.id.clone()]);

        // Stored order is untouched by the update
        let stored: Vec<_> = drafts.list().unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(stored, vec![new.id, old.id]);
    }

    #[test]
    fn test_corrupt_index_is_an_error_but_save_recovers() {
        let (drafts, memory, _) = setup();
        memory.set("test-drafts-list", "{not json").unwrap();

        assert!(matches!(drafts.list(), Err(StorageError::Corrupt { .. })));

        let saved = drafts.save(None, None, &doc("T")).unwrap();
        assert_eq!(drafts.list().unwrap().len(), 1);
        assert_eq!(drafts.list().unwrap()[0].id, saved.id);
    }

    #[test]
    fn test_delete_clears_current_pointer() {
        let (drafts, _, _) = setup();
        let saved = drafts.save(None, None, &doc("T")).unwrap();

        assert!(drafts.delete(&saved.id).unwrap());
        assert!(drafts.get(&saved.id).unwrap().is_none());
        assert!(drafts.list().unwrap().is_empty());
        assert_eq!(drafts.current_id().unwrap(), None);

        assert!(!drafts.delete(&saved.id).unwrap());
    }

    #[test]
    fn test_import_skip_update_and_insert() {
        let (drafts, _, _) = setup();
        let existing = drafts.save(None, Some("Keep"), &doc("Original")).unwrap();

        let payload = ImportPayload::from_value(json!({
            "drafts": [
                { "id": existing.id.clone(), "title": "Replaced", "blocks": [] },
                { "title": "Fresh", "blocks": ["hello"] }
            ]
        }))
        .unwrap();

        let result = drafts.import(&payload, ImportOptions::default()).unwrap();
        assert_eq!(result, ImportResult { imported: 1, updated: 0, skipped: 1 });
        assert_eq!(drafts.get(&existing.id).unwrap().unwrap(), existing);

        let result = drafts
            .import(&payload, ImportOptions { overwrite: true, replace: false })
            .unwrap();
        assert_eq!(result.updated, 1);
        assert_eq!(drafts.get(&existing.id).unwrap().unwrap().title, "Replaced");
    }

    #[test]
    fn test_import_assigns_block_ids() {
        let (drafts, _, _) = setup();
        let payload = ImportPayload::from_value(json!({
            "id": "draft-x",
            "title": "T",
            "blocks": [{ "type": "paragraph", "content": "a" }, { "type": "header", "text": "b" }]
        }))
        .unwrap();

        drafts.import(&payload, ImportOptions::default()).unwrap();
        let stored = drafts.get("draft-x").unwrap().unwrap();
        assert!(stored.blocks.iter().all(|b| !b.id().is_empty()));
        assert_ne!(stored.blocks[0].id(), stored.blocks[1].id());
        assert_eq!(stored.name, "T");
    }

    #[test]
    fn test_import_replace_clears_first() {
        let (drafts, _, _) = setup();
        drafts.save(None, None, &doc("one")).unwrap();
        drafts.save(None, None, &doc("two")).unwrap();

        let payload = ImportPayload::from_value(json!([{ "id": "only", "title": "Only" }])).unwrap();
        let result = drafts
            .import(&payload, ImportOptions { overwrite: false, replace: true })
            .unwrap();

        assert_eq!(result.imported, 1);
        let ids: Vec<_> = drafts.list().unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["only"]);
    }

    #[test]
    fn test_export_all_in_index_order() {
        let (drafts, _, clock) = setup();
        drafts.save(None, None, &doc("one")).unwrap();
        drafts.save(None, None, &doc("two")).unwrap();
        clock.set(9_000);

        let export = drafts.export_all().unwrap();
        assert_eq!(export.exported_at, 9_000);
        let titles: Vec<_> = export.drafts.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["two", "one"]);
    }

    #[test]
    fn test_merge_remote_only_when_newer() {
        let (drafts, _, _) = setup();
        let local = drafts.save(None, None, &doc("local")).unwrap();

        let mut stale = local.clone();
        stale.title = "stale".to_string();
        assert!(!drafts.merge_remote(&stale).unwrap());

        let mut newer = local.clone();
        newer.title = "remote".to_string();
        newer.updated_at += 100;
        assert!(drafts.merge_remote(&newer).unwrap());
        assert_eq!(drafts.get(&local.id).unwrap().unwrap().title, "remote");

        let unknown = Draft { id: "remote-only".to_string(), ..local };
        assert!(drafts.merge_remote(&unknown).unwrap());
        assert_eq!(drafts.list().unwrap().len(), 2);
    }

    #[test]
    fn test_import_into_file_store_keeps_lookalike_ids_apart() {
        let dir = tempfile::tempdir().unwrap();
        let drafts = DraftStore::new(
            Arc::new(crate::storage::FileStore::open(dir.path()).unwrap()),
            StorageKeys::new("test"),
            Arc::new(ManualClock::new(1_000)),
        );

        let payload = ImportPayload::from_value(json!([
            { "id": "post 1", "title": "A" },
            { "id": "post_1", "title": "B" }
        ]))
        .unwrap();

        let result = drafts.import(&payload, ImportOptions::default()).unwrap();
        assert_eq!(result, ImportResult { imported: 2, updated: 0, skipped: 0 });
        assert_eq!(drafts.get("post 1").unwrap().unwrap().title, "A");
        assert_eq!(drafts.get("post_1").unwrap().unwrap().title, "B");
    }
}
