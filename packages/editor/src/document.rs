//! # Editor Document
//!
//! The unit that history snapshots and drafts persist: a title plus an
//! ordered list of blocks. Block order is rendering and export order.
//!
//! ## Header subtrees
//!
//! A header "owns" every following block up to (not including) the next
//! header whose level is equal or shallower:
//!
//! ```text
//! h2 Intro        ┐
//! paragraph       │ subtree of "Intro"
//! h3 Detail       │
//! list            ┘
//! h2 Next         ← stops here
//! ```

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::block::{Block, BlockId};

/// Title and blocks of the document being edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl EditorDocument {
    pub fn new(title: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            title: title.into(),
            blocks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.blocks.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.id() == id)
    }

    pub fn find(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id() == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn block_ids(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|b| b.id().clone()).collect()
    }

    /// Index range covered by the block `id` and, for headers, its subtree.
    ///
    /// Non-header blocks cover only themselves.
    pub fn subtree_range(&self, id: &str) -> Option<Range<usize>> {
        let start = self.position(id)?;
        let Some(level) = self.blocks[start].header_level() else {
            return Some(start..start + 1);
        };

        let end = self.blocks[start + 1..]
            .iter()
            .position(|b| b.header_level().is_some_and(|l| l <= level))
            .map(|offset| start + 1 + offset)
            .unwrap_or(self.blocks.len());

        Some(start..end)
    }

    /// Copy with empty list blocks removed, as sent to the AI assistant.
    pub fn sanitized(&self) -> EditorDocument {
        EditorDocument {
            title: self.title.clone(),
            blocks: self
                .blocks
                .iter()
                .filter(|b| !b.is_empty_list())
                .cloned()
                .collect(),
        }
    }

    /// JSON used for equivalence checks: `{title, blocks}` with block ids removed.
    pub fn comparison_key(&self) -> serde_json::Value {
        let blocks: Vec<serde_json::Value> = self
            .blocks
            .iter()
            .map(|block| {
                let mut value = serde_json::to_value(block).unwrap_or(serde_json::Value::Null);
                if let Some(map) = value.as_object_mut() {
                    map.remove("id");
                }
                value
            })
            .collect();

        serde_json::json!({ "title": self.title, "blocks": blocks })
    }

    /// Same title and blocks, ignoring block ids.
    pub fn is_equivalent(&self, other: &EditorDocument) -> bool {
        self.comparison_key() == other.comparison_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{ListItem, ListType};

    fn outline() -> EditorDocument {
        EditorDocument::new(
            "Post",
            vec![
                Block::header(2, "Intro").with_id("h-intro"),
                Block::paragraph("body").with_id("p1"),
                Block::header(3, "Detail").with_id("h-detail"),
                Block::paragraph("more").with_id("p2"),
                Block::header(2, "Next").with_id("h-next"),
                Block::paragraph("tail").with_id("p3"),
            ],
        )
    }

    #[test]
    fn test_subtree_stops_at_equal_level_header() {
        let doc = outline();
        assert_eq!(doc.subtree_range("h-intro"), Some(0..4));
        assert_eq!(doc.subtree_range("h-detail"), Some(2..4));
    }

    #[test]
    fn test_subtree_runs_to_end() {
        let doc = outline();
        assert_eq!(doc.subtree_range("h-next"), Some(4..6));
    }

    #[test]
    fn test_subtree_of_plain_block_is_itself() {
        let doc = outline();
        assert_eq!(doc.subtree_range("p2"), Some(3..4));
        assert_eq!(doc.subtree_range("missing"), None);
    }

    #[test]
    fn test_sanitized_drops_empty_lists() {
        let mut doc = outline();
        doc.blocks.push(Block::list(ListType::Ul, vec![]).with_id("empty"));
        doc.blocks.push(Block::list(ListType::Ul, vec![ListItem::plain("x")]).with_id("full"));

        let sanitized = doc.sanitized();
        assert!(!sanitized.contains("empty"));
        assert!(sanitized.contains("full"));
        assert_eq!(doc.blocks.len(), 8);
    }

    #[test]
    fn test_equivalence_ignores_ids() {
        let a = EditorDocument::new("T", vec![Block::paragraph("x").with_id("one")]);
        let b = EditorDocument::new("T", vec![Block::paragraph("x").with_id("two")]);
        let c = EditorDocument::new("T", vec![Block::paragraph("y").with_id("one")]);

        assert!(a.is_equivalent(&b));
        assert!(!a.is_equivalent(&c));
    }
}
