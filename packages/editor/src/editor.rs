//! # Editor
//!
//! The block-authoring state machine. Owns the live document, selection,
//! history, event bus, autosave slot and current draft pointer.
//!
//! Every content mutation follows the same path:
//!
//! ```text
//! apply change ─► History::commit ─► emit Changed ─► autosave()
//! ```
//!
//! Storage failures never unwind a mutation: they are logged and the
//! in-memory document stays the source of truth.

use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::ai::AiRequest;
use crate::autosave::AutoSave;
use crate::block::{dedupe_block_ids, ensure_block_ids, generate_id, Block, BlockId};
use crate::clock::Millis;
use crate::context::EditorContext;
use crate::document::EditorDocument;
use crate::draft::{Draft, DraftSummary, DraftsExport, ImportOptions, ImportPayload, ImportResult};
use crate::events::{EditorEvent, EventBus, ListenerId};
use crate::history::History;
use crate::merge::{merge_external, MergeOutcome, MergeScope, SelectionContext};
use crate::mutations::{Mutation, MutationError};
use crate::normalize::normalize_document;
use crate::persistence::{effective_name, DraftStore};
use crate::sync::MirrorOp;
use crate::EditorError;

#[derive(Debug)]
pub struct Editor {
    ctx: EditorContext,
    drafts: DraftStore,
    document: EditorDocument,
    selected: Option<BlockId>,
    history: History,
    events: EventBus,
    autosave: AutoSave,
    current_draft_id: Option<String>,
    /// `Some` once a mirror is attached; saves and deletes queue ops here
    outbox: Option<Vec<MirrorOp>>,
}

impl Editor {
    /// Empty, unsaved document. Call [`Editor::load`] with `None` to resume
    /// the persisted current draft.
    pub fn new(ctx: EditorContext) -> Self {
        let document = EditorDocument::default();
        let mut history = History::new(ctx.config.history_capacity);
        history.reset(&document);

        Self {
            drafts: DraftStore::from_context(&ctx),
            autosave: AutoSave::new(ctx.config.autosave_delay_ms),
            ctx,
            document,
            selected: None,
            history,
            events: EventBus::new(),
            current_draft_id: None,
            outbox: None,
        }
    }

    pub fn context(&self) -> &EditorContext {
        &self.ctx
    }

    pub fn document(&self) -> &EditorDocument {
        &self.document
    }

    pub fn title(&self) -> &str {
        &self.document.title
    }

    pub fn blocks(&self) -> &[Block] {
        &self.document.blocks
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.document.find(id)
    }

    pub fn selected_block_id(&self) -> Option<&BlockId> {
        self.selected.as_ref()
    }

    pub fn current_draft_id(&self) -> Option<&str> {
        self.current_draft_id.as_deref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn drafts(&self) -> &DraftStore {
        &self.drafts
    }

    // ---------------------------------------------------------------
    // Events
    // ---------------------------------------------------------------

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&EditorEvent) + Send + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    // ---------------------------------------------------------------
    // Mutation API
    // ---------------------------------------------------------------

    /// Insert a block with a freshly minted id; `None` or an index past the
    /// end appends. Returns the block as inserted.
    pub fn add_block(&mut self, mut block: Block, position: Option<usize>) -> Block {
        block.set_id(generate_id(self.ctx.clock.as_ref()));

        let len = self.document.blocks.len();
        let index = position.filter(|p| *p <= len).unwrap_or(len);
        self.document.blocks.insert(index, block.clone());

        debug!("[Editor] addBlock {} at {}", block.id(), index);
        self.commit();
        block
    }

    /// Insert a run of blocks in one commit, e.g. pasted or generated content.
    /// Missing ids are minted and ids already in the document are re-keyed.
    /// Returns the blocks as inserted.
    pub fn insert_blocks(&mut self, mut blocks: Vec<Block>, position: Option<usize>) -> Vec<Block> {
        if blocks.is_empty() {
            return blocks;
        }

        let clock = self.ctx.clock.as_ref();
        ensure_block_ids(&mut blocks, clock);
        let mut taken: HashSet<BlockId> = self
            .document
            .blocks
            .iter()
            .map(|b| b.id().clone())
            .collect();
        for block in blocks.iter_mut() {
            while taken.contains(block.id()) {
                block.set_id(generate_id(clock));
            }
            taken.insert(block.id().clone());
        }

        let len = self.document.blocks.len();
        let index = position.filter(|p| *p <= len).unwrap_or(len);
        self.document
            .blocks
            .splice(index..index, blocks.iter().cloned());

        debug!("[Editor] insertBlocks {} at {}", blocks.len(), index);
        self.commit();
        blocks
    }

    /// Merge `changes` into the block. `Ok(false)` if the id is unknown.
    pub fn update_block(&mut self, id: &str, changes: &Value) -> Result<bool, MutationError> {
        self.apply_change(Mutation::UpdateBlock {
            id: BlockId::from(id),
            changes: changes.clone(),
        })
    }

    pub fn delete_block(&mut self, id: &str) -> bool {
        matches!(
            self.apply_change(Mutation::DeleteBlock { id: BlockId::from(id) }),
            Ok(true)
        )
    }

    /// Move a block to `new_index`, counted after its removal.
    pub fn move_block(&mut self, id: &str, new_index: usize) -> bool {
        matches!(
            self.apply_change(Mutation::MoveBlock {
                id: BlockId::from(id),
                new_index,
            }),
            Ok(true)
        )
    }

    /// Selection is UI state: no history entry, no autosave.
    pub fn select_block(&mut self, id: Option<&str>) {
        self.selected = id.map(BlockId::from);
        self.events.emit(EditorEvent::Selected {
            id: self.selected.clone(),
        });
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        if let Err(e) = self.apply_change(Mutation::SetTitle { title: title.into() }) {
            warn!("[Editor] setTitle rejected: {}", e);
        }
    }

    /// Replace title and blocks in one commit. Missing or duplicate block ids
    /// are re-minted first.
    pub fn replace_document(&mut self, mut document: EditorDocument) {
        dedupe_block_ids(&mut document.blocks, self.ctx.clock.as_ref());
        if let Err(e) = self.apply_change(Mutation::ReplaceDocument { document }) {
            warn!("[Editor] replaceDocument rejected: {}", e);
        }
    }

    /// Apply a serialized mutation. `Ok(false)` when it targets an unknown block.
    pub fn apply(&mut self, mutation: Mutation) -> Result<bool, MutationError> {
        match mutation {
            Mutation::AddBlock { block, position } => {
                self.add_block(block, position);
                Ok(true)
            }
            Mutation::ReplaceDocument { document } => {
                self.replace_document(document);
                Ok(true)
            }
            other => self.apply_change(other),
        }
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(previous);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(next);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn apply_change(&mut self, mutation: Mutation) -> Result<bool, MutationError> {
        match mutation.apply(&mut self.document) {
            Ok(()) => {
                debug!("[Editor] {} applied", mutation.name());
                self.commit();
                Ok(true)
            }
            Err(MutationError::BlockNotFound(id)) => {
                debug!("[Editor] {} ignored, no block {}", mutation.name(), id);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn commit(&mut self) {
        let selection_cleared = self.clear_stale_selection();
        self.history.commit(&self.document);
        self.events.emit(EditorEvent::Changed);
        if selection_cleared {
            self.events.emit(EditorEvent::Selected { id: None });
        }
        self.autosave();
    }

    fn restore(&mut self, document: EditorDocument) {
        self.document = document;
        let selection_cleared = self.clear_stale_selection();
        self.events.emit(EditorEvent::Changed);
        if selection_cleared {
            self.events.emit(EditorEvent::Selected { id: None });
        }
        self.autosave();
    }

    /// Drop the selection if its block is gone. Returns true if it was dropped.
    fn clear_stale_selection(&mut self) -> bool {
        match &self.selected {
            Some(id) if !self.document.contains(id.as_str()) => {
                self.selected = None;
                true
            }
            _ => false,
        }
    }

    // ---------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------

    /// Save under the current draft id (or a new one). Name defaults to the
    /// title, then "Untitled Draft". `None` if the write failed.
    pub fn save(&mut self, name: Option<&str>) -> Option<String> {
        self.save_with(name, false)
    }

    /// Save under a new draft id and announce it.
    pub fn save_as(&mut self, name: &str) -> Option<String> {
        let id = self.save_with(Some(name), true)?;
        self.events.emit(EditorEvent::SaveCompleted {
            draft_id: id.clone(),
        });
        Some(id)
    }

    fn save_with(&mut self, name: Option<&str>, force_new: bool) -> Option<String> {
        let id = if force_new {
            None
        } else {
            self.current_draft_id.clone()
        };
        let name = effective_name(name, &self.document.title);

        match self.drafts.save(id.as_deref(), Some(&name), &self.document) {
            Ok(draft) => {
                info!("[Persistence] Saved draft {} as '{}'", draft.id, draft.name);
                self.autosave.cancel();
                Some(self.after_save(draft))
            }
            Err(e) => {
                warn!("[Persistence] Save failed: {}", e);
                None
            }
        }
    }

    fn after_save(&mut self, draft: Draft) -> String {
        let id = draft.id.clone();
        self.current_draft_id = Some(id.clone());
        self.queue_mirror(MirrorOp::Put(draft));
        id
    }

    /// Schedule a debounced save, replacing any pending one.
    pub fn autosave(&mut self) {
        self.events.emit(EditorEvent::SavingStarted);
        self.autosave.schedule(self.ctx.now_millis());
    }

    /// Fire the pending autosave if its delay has elapsed on the context clock.
    pub fn poll_autosave(&mut self) -> bool {
        if self.autosave.take_due(self.ctx.now_millis()) {
            self.write_autosave();
            true
        } else {
            false
        }
    }

    /// Fire the pending autosave now.
    pub fn flush_autosave(&mut self) -> bool {
        if self.autosave.take() {
            self.write_autosave();
            true
        } else {
            false
        }
    }

    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    /// Context-clock time at which the pending autosave is due.
    pub fn autosave_deadline(&self) -> Option<Millis> {
        self.autosave.deadline()
    }

    /// Changes whenever the pending autosave is replaced, cancelled or fired.
    pub fn autosave_generation(&self) -> u64 {
        self.autosave.generation()
    }

    fn write_autosave(&mut self) {
        // Updates the current draft in place (keeping its name), or creates one
        let result = self
            .drafts
            .save(self.current_draft_id.as_deref(), None, &self.document);

        match result {
            Ok(draft) => {
                debug!("[Persistence] Autosaved draft {}", draft.id);
                let id = self.after_save(draft);
                self.events.emit(EditorEvent::SaveCompleted { draft_id: id });
            }
            Err(e) => warn!("[Persistence] Autosave failed: {}", e),
        }
    }

    /// Open a draft (the persisted current one when `id` is `None`).
    ///
    /// Returns false and leaves the document untouched if it can't be read.
    pub fn load(&mut self, id: Option<&str>) -> bool {
        self.flush_autosave();

        let id = match id {
            Some(id) => id.to_string(),
            None => match self.drafts.current_id() {
                Ok(Some(id)) => id,
                Ok(None) => return false,
                Err(e) => {
                    warn!("[Persistence] Current draft pointer unreadable: {}", e);
                    return false;
                }
            },
        };

        let draft = match self.drafts.get(&id) {
            Ok(Some(draft)) => draft,
            Ok(None) => {
                debug!("[Persistence] No draft {}", id);
                return false;
            }
            Err(e) => {
                warn!("[Persistence] Failed to load draft {}: {}", id, e);
                return false;
            }
        };

        let mut document = draft.document();
        dedupe_block_ids(&mut document.blocks, self.ctx.clock.as_ref());

        if let Err(e) = self.drafts.set_current_id(&id) {
            warn!("[Persistence] Failed to persist current draft pointer: {}", e);
        }

        info!("[Persistence] Loaded draft {}", id);
        self.history.reset(&document);
        self.document = document;
        self.selected = None;
        self.current_draft_id = Some(id);
        self.events.emit(EditorEvent::Changed);
        true
    }

    /// Start a blank document. Persisted drafts are left alone.
    pub fn new_draft(&mut self) {
        self.flush_autosave();

        self.document = EditorDocument::default();
        self.selected = None;
        self.history.reset(&self.document);
        self.current_draft_id = None;

        if let Err(e) = self.drafts.clear_current_id() {
            warn!("[Persistence] Failed to clear current draft pointer: {}", e);
        }
        self.events.emit(EditorEvent::Changed);
    }

    pub fn delete_draft(&mut self, id: &str) -> bool {
        match self.drafts.delete(id) {
            Ok(deleted) => {
                if self.current_draft_id.as_deref() == Some(id) {
                    self.current_draft_id = None;
                }
                if deleted {
                    info!("[Persistence] Deleted draft {}", id);
                    self.queue_mirror(MirrorOp::Delete(id.to_string()));
                }
                deleted
            }
            Err(e) => {
                warn!("[Persistence] Failed to delete draft {}: {}", id, e);
                false
            }
        }
    }

    /// The drafts index as stored. Unreadable → empty.
    pub fn drafts_list(&self) -> Vec<DraftSummary> {
        self.drafts.list().unwrap_or_else(|e| {
            warn!("[Persistence] Drafts index unreadable: {}", e);
            Vec::new()
        })
    }

    /// The drafts index, newest first.
    pub fn recent_drafts(&self) -> Vec<DraftSummary> {
        self.drafts.recent().unwrap_or_else(|e| {
            warn!("[Persistence] Drafts index unreadable: {}", e);
            Vec::new()
        })
    }

    pub fn export_drafts(&self) -> DraftsExport {
        self.drafts.export_all().unwrap_or_else(|e| {
            warn!("[Persistence] Export failed: {}", e);
            DraftsExport {
                drafts: Vec::new(),
                exported_at: self.ctx.now_millis(),
            }
        })
    }

    /// The live document as a draft record, without writing it.
    pub fn export_current_draft(&self) -> Draft {
        let now = self.ctx.now_millis();
        let stored = self
            .current_draft_id
            .as_deref()
            .and_then(|id| self.drafts.get(id).ok().flatten());

        let id = match &self.current_draft_id {
            Some(id) => id.clone(),
            None => self.drafts.mint_id().unwrap_or_else(|e| {
                warn!("[Persistence] Could not check draft ids: {}", e);
                format!("draft-{}", now)
            }),
        };

        Draft {
            id,
            name: stored
                .as_ref()
                .map(|d| d.name.clone())
                .unwrap_or_else(|| effective_name(None, &self.document.title)),
            title: self.document.title.clone(),
            blocks: self.document.blocks.clone(),
            timestamp: stored.as_ref().map(|d| d.timestamp).unwrap_or(now),
            updated_at: now,
        }
    }

    /// Store drafts from an import file. The open document is untouched.
    pub fn import_drafts(
        &mut self,
        payload: &ImportPayload,
        options: ImportOptions,
    ) -> Result<ImportResult, EditorError> {
        let result = self.drafts.import(payload, options)?;
        info!(
            "[Persistence] Imported {} new, {} updated, {} skipped",
            result.imported, result.updated, result.skipped
        );
        Ok(result)
    }

    /// Store a draft pulled from the mirror if it is new or newer than ours.
    pub fn merge_remote_draft(&mut self, draft: &Draft) -> bool {
        self.drafts.merge_remote(draft).unwrap_or_else(|e| {
            warn!("[Persistence] Failed to store remote draft {}: {}", draft.id, e);
            false
        })
    }

    // ---------------------------------------------------------------
    // External edits
    // ---------------------------------------------------------------

    /// Build a suggestion request for the live document.
    pub fn ai_request(&self, prompt: impl Into<String>, selection: Option<SelectionContext>) -> AiRequest {
        AiRequest {
            prompt: prompt.into(),
            draft: self.document.sanitized(),
            language: self.ctx.config.language.clone(),
            selection,
        }
    }

    /// Normalize and merge an externally produced draft.
    ///
    /// Returns true if the document changed (one commit); false when the
    /// draft missed the selection or matches the live document.
    pub fn apply_ai_edits(&mut self, raw_draft: &Value, selection: Option<&SelectionContext>) -> bool {
        let incoming = normalize_document(raw_draft);
        let scope = MergeScope::from_selection(selection);

        match merge_external(&self.document, &incoming, &scope, self.ctx.clock.as_ref()) {
            MergeOutcome::Merged(document) => {
                info!("[Merge] Applying external edits ({:?})", scope);
                self.replace_document(document);
                true
            }
            MergeOutcome::NoEdits(reason) => {
                info!("[Merge] No edits: {}", reason);
                false
            }
        }
    }

    // ---------------------------------------------------------------
    // Mirror outbox
    // ---------------------------------------------------------------

    /// Start queueing mirror ops for saves and deletes.
    pub fn enable_mirror_outbox(&mut self) {
        self.outbox.get_or_insert_with(Vec::new);
    }

    pub fn take_mirror_ops(&mut self) -> Vec<MirrorOp> {
        self.outbox.as_mut().map(std::mem::take).unwrap_or_default()
    }

    fn queue_mirror(&mut self, op: MirrorOp) {
        if let Some(outbox) = self.outbox.as_mut() {
            outbox.push(op);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn editor() -> (Editor, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let ctx = EditorContext::in_memory().with_clock(clock.clone());
        (Editor::new(ctx), clock)
    }

    fn record(editor: &mut Editor) -> Arc<Mutex<Vec<EditorEvent>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        editor.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
        log
    }

    #[test]
    fn test_add_block_assigns_fresh_id() {
        let (mut editor, _) = editor();
        let added = editor.add_block(Block::paragraph("x").with_id("caller-id"), None);

        assert_ne!(added.id(), "caller-id");
        assert!(added.id().as_str().starts_with("block-1000-"));
        assert_eq!(editor.blocks(), &[added]);
    }

    #[test]
    fn test_insert_blocks_keys_and_places_the_run() {
        let (mut editor, _) = editor();
        let first = editor.add_block(Block::paragraph("first"), None);
        let last = editor.add_block(Block::paragraph("last"), None);

        let inserted = editor.insert_blocks(
            vec![
                Block::header(2, "a"),
                Block::paragraph("b").with_id(first.id().as_str()),
                Block::paragraph("c").with_id("kept"),
            ],
            Some(1),
        );

        assert_eq!(inserted.len(), 3);
        assert!(!inserted[0].id().is_empty());
        assert_ne!(inserted[1].id(), first.id());
        assert_eq!(inserted[2].id(), "kept");

        let ids: Vec<_> = editor.blocks().iter().map(|b| b.id().clone()).collect();
        assert_eq!(
            ids,
            vec![
                first.id().clone(),
                inserted[0].id().clone(),
                inserted[1].id().clone(),
                inserted[2].id().clone(),
                last.id().clone(),
            ]
        );
        assert_eq!(editor.history().undo_depth(), 3);
    }

    #[test]
    fn test_insert_nothing_is_a_no_op() {
        let (mut editor, _) = editor();
        let log = record(&mut editor);

        assert!(editor.insert_blocks(Vec::new(), None).is_empty());
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(editor.history().undo_depth(), 0);
    }

    #[test]
    fn test_mutation_emits_changed_then_saving() {
        let (mut editor, _) = editor();
        let log = record(&mut editor);

        editor.set_title("T");

        assert_eq!(
            *log.lock().unwrap(),
            vec![EditorEvent::Changed, EditorEvent::SavingStarted]
        );
    }

    #[test]
    fn test_unknown_id_is_silent() {
        let (mut editor, _) = editor();
        let log = record(&mut editor);

        assert_eq!(editor.update_block("nope", &json!({ "content": "x" })), Ok(false));
        assert!(!editor.delete_block("nope"));
        assert!(!editor.move_block("nope", 0));

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(editor.history().undo_depth(), 0);
        assert!(!editor.autosave_pending());
    }

    #[test]
    fn test_invalid_patch_is_rejected_without_commit() {
        let (mut editor, _) = editor();
        let block = editor.add_block(Block::header(2, "H"), None);

        let result = editor.update_block(block.id().as_str(), &json!({ "level": 9 }));
        assert!(matches!(result, Err(MutationError::InvalidPatch(_))));
        assert_eq!(editor.history().undo_depth(), 1);
        assert_eq!(editor.block(block.id().as_str()).unwrap().header_level(), Some(2));
    }

    #[test]
    fn test_select_does_not_commit() {
        let (mut editor, _) = editor();
        let block = editor.add_block(Block::paragraph("p"), None);
        let log = record(&mut editor);

        editor.select_block(Some(block.id().as_str()));

        assert_eq!(editor.selected_block_id(), Some(block.id()));
        assert_eq!(editor.history().undo_depth(), 1);
        assert_eq!(
            *log.lock().unwrap(),
            vec![EditorEvent::Selected { id: Some(block.id().clone()) }]
        );
    }

    #[test]
    fn test_undo_clears_selection_of_vanished_block() {
        let (mut editor, _) = editor();
        let block = editor.add_block(Block::paragraph("p"), None);
        editor.select_block(Some(block.id().as_str()));

        assert!(editor.undo());
        assert!(editor.blocks().is_empty());
        assert_eq!(editor.selected_block_id(), None);

        assert!(editor.redo());
        assert_eq!(editor.blocks().len(), 1);
        assert!(!editor.redo());
    }

    #[test]
    fn test_poll_autosave_waits_for_delay() {
        let (mut editor, clock) = editor();
        editor.set_title("T");

        clock.advance(999);
        assert!(!editor.poll_autosave());
        clock.advance(1);
        assert!(editor.poll_autosave());

        let id = editor.current_draft_id().unwrap().to_string();
        let stored = editor.drafts().get(&id).unwrap().unwrap();
        assert_eq!(stored.title, "T");
        assert_eq!(stored.name, "T");
    }

    #[test]
    fn test_save_as_forces_new_id() {
        let (mut editor, _) = editor();
        editor.set_title("T");
        let first = editor.save(None).unwrap();
        let log = record(&mut editor);

        let second = editor.save_as("Copy").unwrap();

        assert_ne!(first, second);
        assert_eq!(editor.current_draft_id(), Some(second.as_str()));
        assert_eq!(editor.drafts_list().len(), 2);
        assert_eq!(
            *log.lock().unwrap(),
            vec![EditorEvent::SaveCompleted { draft_id: second }]
        );
    }

    #[test]
    fn test_explicit_save_cancels_pending_autosave() {
        let (mut editor, clock) = editor();
        editor.set_title("T");
        assert!(editor.autosave_pending());

        let id = editor.save(Some("Manual")).unwrap();
        assert!(!editor.autosave_pending());

        let log = record(&mut editor);
        clock.advance(5_000);
        assert!(!editor.poll_autosave());
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(editor.drafts().get(&id).unwrap().unwrap().name, "Manual");
    }

    #[test]
    fn test_load_missing_draft_leaves_document() {
        let (mut editor, _) = editor();
        assert!(!editor.load(None));

        editor.set_title("Keep me");
        assert!(!editor.load(Some("draft-404")));
        assert_eq!(editor.title(), "Keep me");
        assert_eq!(editor.history().undo_depth(), 1);
    }

    #[test]
    fn test_new_draft_resets_everything_but_storage() {
        let (mut editor, _) = editor();
        editor.set_title("T");
        editor.save(Some("Saved")).unwrap();

        editor.new_draft();

        assert!(editor.document().is_empty());
        assert_eq!(editor.current_draft_id(), None);
        assert!(!editor.can_undo());
        assert_eq!(editor.drafts_list().len(), 1);
        assert_eq!(editor.drafts().current_id().unwrap(), None);
    }

    #[test]
    fn test_delete_current_draft_clears_pointer() {
        let (mut editor, _) = editor();
        editor.set_title("T");
        let id = editor.save(None).unwrap();

        assert!(editor.delete_draft(&id));
        assert_eq!(editor.current_draft_id(), None);
        assert!(editor.drafts_list().is_empty());
        assert!(!editor.delete_draft(&id));
    }

    #[test]
    fn test_export_current_draft_does_not_write() {
        let store = MemoryStore::new();
        let ctx = EditorContext::new(Default::default(), Arc::new(store.clone()))
            .with_clock(Arc::new(ManualClock::new(5)));
        let mut editor = Editor::new(ctx);
        editor.set_title("Unsaved");

        let draft = editor.export_current_draft();
        assert_eq!(draft.id, "draft-5");
        assert_eq!(draft.name, "Unsaved");
        assert!(store.is_empty());
    }

    #[test]
    fn test_ai_request_drops_empty_lists() {
        let (mut editor, _) = editor();
        editor.add_block(Block::paragraph("keep"), None);
        editor.add_block(Block::list(crate::block::ListType::Ul, Vec::new()), None);

        let request = editor.ai_request("shorter", None);
        assert_eq!(request.draft.blocks.len(), 1);
        assert_eq!(request.language, "en");
    }

    #[test]
    fn test_apply_ai_edits_commits_once() {
        let (mut editor, _) = editor();
        editor.set_title("Old");

        let changed = editor.apply_ai_edits(
            &json!({ "title": "New", "blocks": [{ "type": "heading", "text": "Hi", "level": "h1" }] }),
            None,
        );

        assert!(changed);
        assert_eq!(editor.title(), "New");
        assert_eq!(editor.blocks()[0].header_level(), Some(1));
        assert_eq!(editor.history().undo_depth(), 2);

        assert!(editor.undo());
        assert_eq!(editor.title(), "Old");
    }

    #[test]
    fn test_mirror_outbox_collects_saves_and_deletes() {
        let (mut editor, _) = editor();
        editor.set_title("T");
        editor.save(None);
        assert!(editor.take_mirror_ops().is_empty());

        editor.enable_mirror_outbox();
        let id = editor.save(None).unwrap();
        editor.delete_draft(&id);

        let ops = editor.take_mirror_ops();
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], MirrorOp::Put(d) if d.id == id));
        assert_eq!(ops[1], MirrorOp::Delete(id));
        assert!(editor.take_mirror_ops().is_empty());
    }
}
