//! # Blockpen Editor
//!
//! State engine for a block-based blog editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ host: UI, CLI, tokio session                │
//! └─────────────────────────────────────────────┘
//!                     ↓ Mutation API
//! ┌─────────────────────────────────────────────┐
//! │ editor: document + selection lifecycle      │
//! │  - Apply mutations (all-or-nothing)         │
//! │  - Snapshot history for undo/redo           │
//! │  - Emit typed events                        │
//! │  - Debounce autosave                        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ persistence: drafts in a key-value store    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! External drafts (import files, AI edits) enter through `normalize` and
//! `merge` and are applied as a single document replacement.
//!
//! ## Core Principles
//!
//! 1. **In-memory document is the source of truth**: storage failures are logged, never fatal
//! 2. **One mutation, one history entry**: rapid edits coalesce only at the storage layer
//! 3. **Explicit context**: config, store and clock are injected, never global
//! 4. **External drafts are untrusted**: normalized, scoped, and stripped of image URLs
//!
//! ## Usage
//!
//! ### Single editor
//!
//! ```rust,ignore
//! use blockpen_editor::{Block, Editor, EditorContext};
//!
//! let mut editor = Editor::new(EditorContext::in_memory());
//! editor.subscribe(|event| println!("{:?}", event));
//!
//! let block = editor.add_block(Block::paragraph("Hello"), None);
//! editor.set_title("First post");
//! editor.undo();
//!
//! let draft_id = editor.save(Some("Launch"));
//! ```
//!
//! ### Async host
//!
//! ```rust,ignore
//! use blockpen_editor::{Editor, EditorContext, EditorSession};
//!
//! let (session, mut events) = EditorSession::new(Editor::new(ctx)).spawn();
//! session.with_editor(|ed| ed.set_title("Draft")).await?;
//! // autosave fires after the configured delay
//! ```

mod ai;
mod autosave;
mod block;
mod clock;
mod config;
mod context;
mod document;
mod draft;
mod editor;
mod errors;
mod events;
mod history;
mod merge;
mod mutations;
mod normalize;
mod persistence;
mod session;
mod storage;
mod sync;

pub use ai::{AiAssistant, AiRequest, AiResponse};
pub use autosave::AutoSave;
pub use block::{
    dedupe_block_ids, ensure_block_ids, generate_id, Block, BlockId, BlockKind, CardBlock,
    CardItem, CardSubtype, HeaderBlock, HeaderLevel, HeaderPreset, ListBlock, ListItem, ListType,
    ParagraphBlock, ParagraphVariant,
};
pub use clock::{Clock, ManualClock, Millis, SystemClock};
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use context::EditorContext;
pub use document::EditorDocument;
pub use draft::{
    Draft, DraftSummary, DraftsExport, ImportOptions, ImportPayload, ImportResult,
    UNTITLED_DRAFT_NAME,
};
pub use editor::Editor;
pub use errors::{AiError, EditorError, MutationError, SessionError, StorageError, SyncError};
pub use events::{EditorEvent, EventBus, ListenerId};
pub use history::History;
pub use merge::{
    merge_external, preserve_card_images, InsertSide, MergeOutcome, MergeScope, NoEditsReason,
    SelectionContext, SelectionScope,
};
pub use mutations::Mutation;
pub use normalize::{
    classify_lines, normalize_block, normalize_blocks, normalize_document, normalize_draft,
    NormalizedDraft,
};
pub use persistence::{effective_name, DraftStore};
pub use session::{EditorSession, SessionEvent, SessionHandle};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageKeys, StorageResult};
pub use sync::{DraftMirror, MemoryMirror, MirrorOp};
