//! # External Draft Merge
//!
//! Reconciles a document produced outside the editor (AI edits, pasted
//! drafts) with the live one.
//!
//! ```text
//! incoming JSON ─normalize─► EditorDocument ─merge_external(scope)─► MergeOutcome
//!                                                                     │
//!                    Merged(doc) → Editor::replace_document ◄─────────┘
//!                    NoEdits(reason) → notice, no mutation
//! ```
//!
//! ## Scopes
//!
//! - **Document**: incoming title and blocks replace the live ones
//! - **Subtree**: the header's range (until the next header of equal or
//!   shallower level) is derived in both documents; the live range is
//!   replaced by the incoming one
//! - **Block**: the block is replaced by id; with an insert side, incoming
//!   blocks adjacent to it that the live document does not know are
//!   inserted next to it
//!
//! Card images are never taken from the incoming side: they are copied from
//! the live block with the same id (by card index) or blanked.

use serde::{Deserialize, Serialize};

use crate::block::{dedupe_block_ids, Block, BlockId};
use crate::clock::Clock;
use crate::document::EditorDocument;

/// Which side of the selected block new blocks go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertSide {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionScope {
    #[default]
    Block,
    Subtree,
}

/// The part of the document a request targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionContext {
    pub id: BlockId,
    #[serde(default)]
    pub scope: SelectionScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert: Option<InsertSide>,
}

impl SelectionContext {
    pub fn block(id: impl Into<BlockId>) -> Self {
        Self {
            id: id.into(),
            scope: SelectionScope::Block,
            insert: None,
        }
    }

    pub fn subtree(id: impl Into<BlockId>) -> Self {
        Self {
            id: id.into(),
            scope: SelectionScope::Subtree,
            insert: None,
        }
    }

    pub fn with_insert(mut self, side: InsertSide) -> Self {
        self.insert = Some(side);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeScope {
    Document,
    Block {
        id: BlockId,
        insert: Option<InsertSide>,
    },
    Subtree {
        id: BlockId,
    },
}

impl MergeScope {
    pub fn from_selection(selection: Option<&SelectionContext>) -> Self {
        match selection {
            None => MergeScope::Document,
            Some(sel) => match sel.scope {
                SelectionScope::Block => MergeScope::Block {
                    id: sel.id.clone(),
                    insert: sel.insert,
                },
                SelectionScope::Subtree => MergeScope::Subtree { id: sel.id.clone() },
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoEditsReason {
    /// The targeted block is missing from one of the documents
    TargetMissing,
    /// The merge result is equivalent to the live document
    Unchanged,
}

impl std::fmt::Display for NoEditsReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoEditsReason::TargetMissing => write!(f, "the selected block was not returned"),
            NoEditsReason::Unchanged => write!(f, "the returned draft has no changes"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    Merged(EditorDocument),
    NoEdits(NoEditsReason),
}

/// Merge `incoming` into `current` within `scope`.
///
/// The result has unique, non-empty block ids; ids are minted from `clock`.
pub fn merge_external(
    current: &EditorDocument,
    incoming: &EditorDocument,
    scope: &MergeScope,
    clock: &dyn Clock,
) -> MergeOutcome {
    let merged = match scope {
        MergeScope::Document => Some(incoming.clone()),
        MergeScope::Subtree { id } => merge_subtree(current, incoming, id.as_str()),
        MergeScope::Block { id, insert } => merge_block(current, incoming, id.as_str(), *insert),
    };

    let Some(mut merged) = merged else {
        return MergeOutcome::NoEdits(NoEditsReason::TargetMissing);
    };

    preserve_card_images(current, &mut merged);
    dedupe_block_ids(&mut merged.blocks, clock);

    if merged.is_equivalent(current) {
        MergeOutcome::NoEdits(NoEditsReason::Unchanged)
    } else {
        MergeOutcome::Merged(merged)
    }
}

fn merge_subtree(current: &EditorDocument, incoming: &EditorDocument, id: &str) -> Option<EditorDocument> {
    let live = current.subtree_range(id)?;
    let replacement = incoming.subtree_range(id)?;

    let mut blocks = current.blocks.clone();
    blocks.splice(live, incoming.blocks[replacement].iter().cloned());

    Some(EditorDocument::new(current.title.clone(), blocks))
}

fn merge_block(
    current: &EditorDocument,
    incoming: &EditorDocument,
    id: &str,
    insert: Option<InsertSide>,
) -> Option<EditorDocument> {
    let live = current.position(id)?;
    let target = incoming.position(id)?;

    let is_new = |block: &&Block| block.id().is_empty() || !current.contains(block.id().as_str());

    let (before, after): (Vec<Block>, Vec<Block>) = match insert {
        None => (Vec::new(), Vec::new()),
        Some(InsertSide::Before) => {
            let mut extras: Vec<Block> = incoming.blocks[..target]
                .iter()
                .rev()
                .take_while(is_new)
                .cloned()
                .collect();
            extras.reverse();
            (extras, Vec::new())
        }
        Some(InsertSide::After) => {
            let extras = incoming.blocks[target + 1..]
                .iter()
                .take_while(is_new)
                .cloned()
                .collect();
            (Vec::new(), extras)
        }
    };

    let replacement = before
        .into_iter()
        .chain(std::iter::once(incoming.blocks[target].clone()))
        .chain(after);

    let mut blocks = current.blocks.clone();
    blocks.splice(live..live + 1, replacement);

    Some(EditorDocument::new(current.title.clone(), blocks))
}

/// Overwrite card images in `merged` with the live document's, by block id and card index.
pub fn preserve_card_images(current: &EditorDocument, merged: &mut EditorDocument) {
    for block in merged.blocks.iter_mut() {
        let Block::Card(card) = block else {
            continue;
        };

        let live_cards = match current.find(card.id.as_str()) {
            Some(Block::Card(live)) if !card.id.is_empty() => Some(&live.cards),
            _ => None,
        };

        for (index, item) in card.cards.iter_mut().enumerate() {
            let live = live_cards.and_then(|cards| cards.get(index));
            item.image = live.map(|c| c.image.clone()).unwrap_or_default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{CardItem, CardSubtype};
    use crate::clock::ManualClock;

    fn ids(doc: &EditorDocument) -> Vec<String> {
        doc.blocks.iter().map(|b| b.id().to_string()).collect()
    }

    fn outline() -> EditorDocument {
        EditorDocument::new(
            "Post",
            vec![
                Block::header(2, "Intro").with_id("h1"),
                Block::paragraph("intro body").with_id("p1"),
                Block::header(3, "Detail").with_id("h2"),
                Block::paragraph("detail body").with_id("p2"),
                Block::header(2, "Outro").with_id("h3"),
                Block::paragraph("outro body").with_id("p3"),
            ],
        )
    }

    fn merged(outcome: MergeOutcome) -> EditorDocument {
        match outcome {
            MergeOutcome::Merged(doc) => doc,
            other => panic!("Expected merge, got {:?}", other),
        }
    }

    #[test]
    fn test_document_scope_replaces_everything() {
        let clock = ManualClock::new(0);
        let incoming = EditorDocument::new("New", vec![Block::paragraph("only")]);

        let doc = merged(merge_external(&outline(), &incoming, &MergeScope::Document, &clock));

        assert_eq!(doc.title, "New");
        assert_eq!(doc.blocks.len(), 1);
        assert!(!doc.blocks[0].id().is_empty());
    }

    #[test]
    fn test_identical_document_is_unchanged() {
        let clock = ManualClock::new(0);
        let current = outline();

        // Ids differ but content is the same
        let mut incoming = current.clone();
        for (i, block) in incoming.blocks.iter_mut().enumerate() {
            block.set_id(BlockId::new(format!("other-{}", i)));
        }

        assert_eq!(
            merge_external(&current, &incoming, &MergeScope::Document, &clock),
            MergeOutcome::NoEdits(NoEditsReason::Unchanged)
        );
    }

    #[test]
    fn test_subtree_scope_replaces_header_range() {
        let clock = ManualClock::new(0);
        let current = outline();
        let incoming = EditorDocument::new(
            "Ignored",
            vec![
                Block::header(2, "Intro v2").with_id("h1"),
                Block::paragraph("new body").with_id("n1"),
                Block::header(2, "Stray").with_id("x"),
            ],
        );

        let scope = MergeScope::Subtree { id: BlockId::from("h1") };
        let doc = merged(merge_external(&current, &incoming, &scope, &clock));

        assert_eq!(doc.title, "Post");
        assert_eq!(ids(&doc), vec!["h1", "n1", "h3", "p3"]);
        assert_eq!(doc.blocks[0].content(), Some("Intro v2"));
    }

    #[test]
    fn test_block_scope_replaces_single_block() {
        let clock = ManualClock::new(0);
        let current = outline();
        let incoming = EditorDocument::new(
            "",
            vec![
                Block::paragraph("new").with_id("n0"),
                Block::paragraph("rewritten").with_id("p2"),
                Block::paragraph("new after").with_id("n1"),
            ],
        );

        let scope = MergeScope::Block { id: BlockId::from("p2"), insert: None };
        let doc = merged(merge_external(&current, &incoming, &scope, &clock));
        assert_eq!(ids(&doc), vec!["h1", "p1", "h2", "p2", "h3", "p3"]);
        assert_eq!(doc.find("p2").unwrap().content(), Some("rewritten"));
    }

    #[test]
    fn test_block_scope_inserts_adjacent_new_blocks() {
        let clock = ManualClock::new(0);
        let current = outline();
        let incoming = EditorDocument::new(
            "",
            vec![
                Block::paragraph("known").with_id("p1"),
                Block::paragraph("new before").with_id("n0"),
                Block::paragraph("rewritten").with_id("p2"),
                Block::paragraph("new after").with_id("n1"),
                Block::paragraph("also new"),
                Block::paragraph("known again").with_id("p3"),
                Block::paragraph("too far").with_id("n2"),
            ],
        );

        let after = MergeScope::Block { id: BlockId::from("p2"), insert: Some(InsertSide::After) };
        let doc = merged(merge_external(&current, &incoming, &after, &clock));
        assert_eq!(doc.blocks.len(), 8);
        assert_eq!(ids(&doc)[3..5], ["p2".to_string(), "n1".to_string()]);
        assert_eq!(doc.blocks[5].content(), Some("also new"));
        assert!(!doc.blocks[5].id().is_empty());

        let before = MergeScope::Block { id: BlockId::from("p2"), insert: Some(InsertSide::Before) };
        let doc = merged(merge_external(&current, &incoming, &before, &clock));
        assert_eq!(ids(&doc), vec!["h1", "p1", "h2", "n0", "p2", "h3", "p3"]);
    }

    #[test]
    fn test_missing_target_is_no_edits() {
        let clock = ManualClock::new(0);
        let incoming = EditorDocument::new("", vec![Block::paragraph("x").with_id("zzz")]);

        for scope in [
            MergeScope::Block { id: BlockId::from("p1"), insert: None },
            MergeScope::Subtree { id: BlockId::from("h1") },
        ] {
            assert_eq!(
                merge_external(&outline(), &incoming, &scope, &clock),
                MergeOutcome::NoEdits(NoEditsReason::TargetMissing)
            );
        }
    }

    #[test]
    fn test_card_images_come_from_live_document() {
        let clock = ManualClock::new(0);
        let card = |image: &str| CardItem {
            title: "t".into(),
            content: "c".into(),
            image: image.into(),
            alt: String::new(),
        };

        let current = EditorDocument::new(
            "",
            vec![Block::card(CardSubtype::TwoCol, vec![card("live.png")]).with_id("c1")],
        );
        let incoming = EditorDocument::new(
            "changed",
            vec![
                Block::card(CardSubtype::TwoCol, vec![card("evil.png"), card("evil2.png")]).with_id("c1"),
                Block::card(CardSubtype::ThreeCol, vec![card("unknown.png")]).with_id("c2"),
            ],
        );

        let doc = merged(merge_external(&current, &incoming, &MergeScope::Document, &clock));
        let images: Vec<String> = doc
            .blocks
            .iter()
            .flat_map(|b| match b {
                Block::Card(c) => c.cards.iter().map(|i| i.image.clone()).collect(),
                _ => Vec::new(),
            })
            .collect();

        assert_eq!(images, vec!["live.png", "", ""]);
    }

    #[test]
    fn test_scope_from_selection() {
        assert_eq!(MergeScope::from_selection(None), MergeScope::Document);

        let selection = SelectionContext::block("b1").with_insert(InsertSide::After);
        assert_eq!(
            MergeScope::from_selection(Some(&selection)),
            MergeScope::Block { id: BlockId::from("b1"), insert: Some(InsertSide::After) }
        );

        let json = serde_json::to_value(SelectionContext::subtree("h1")).unwrap();
        assert_eq!(json, serde_json::json!({ "id": "h1", "scope": "subtree" }));
    }
}
