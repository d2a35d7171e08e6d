//! # Undo/Redo History
//!
//! Linear history over full document snapshots.
//!
//! ## Design
//!
//! - Every committed mutation appends a deep copy of the resulting document
//! - `index` always points at the entry matching the live document
//! - Committing after an undo drops the redo tail
//! - The first entry is the baseline (empty, or the loaded draft); undo
//!   never goes past it
//! - At most `capacity` entries are kept; the oldest is evicted first
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = History::new(50);
//! history.reset(&doc);
//!
//! doc.title = "Draft".into();
//! history.commit(&doc);
//!
//! if let Some(previous) = history.undo() {
//!     doc = previous.clone();
//! }
//! ```

use crate::document::EditorDocument;

/// Snapshot history with a cursor.
#[derive(Debug, Clone)]
pub struct History {
    /// Snapshots, oldest first
    entries: Vec<EditorDocument>,

    /// Entry representing the live document
    index: usize,

    /// Maximum number of entries kept
    capacity: usize,
}

impl History {
    /// Create an empty history. Capacity is at least 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: 0,
            capacity: capacity.max(1),
        }
    }

    /// Drop everything and make `document` the sole entry.
    pub fn reset(&mut self, document: &EditorDocument) {
        self.entries.clear();
        self.entries.push(document.clone());
        self.index = 0;
    }

    /// Record the document state produced by a mutation.
    pub fn commit(&mut self, document: &EditorDocument) {
        if self.entries.is_empty() {
            self.entries.push(document.clone());
            self.index = 0;
            return;
        }

        // New action invalidates the redo tail
        self.entries.truncate(self.index + 1);
        self.entries.push(document.clone());

        if self.entries.len() > self.capacity {
            // Truncation left `index` on the old last entry; after evicting
            // the front it lands on the entry just pushed.
            self.entries.remove(0);
        } else {
            self.index += 1;
        }
    }

    /// Step back one entry, returning the document to restore.
    pub fn undo(&mut self) -> Option<&EditorDocument> {
        if self.index == 0 || self.entries.is_empty() {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    /// Step forward one entry, returning the document to restore.
    pub fn redo(&mut self) -> Option<&EditorDocument> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// Number of undo steps available.
    pub fn undo_depth(&self) -> usize {
        self.index
    }

    /// Number of redo steps available.
    pub fn redo_depth(&self) -> usize {
        self.entries.len().saturating_sub(self.index + 1)
    }

    /// Number of stored entries, baseline included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entry matching the live document.
    pub fn current(&self) -> Option<&EditorDocument> {
        self.entries.get(self.index)
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(50)
    }
}
