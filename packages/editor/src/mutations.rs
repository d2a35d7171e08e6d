//! # Document Mutations
//!
//! Serializable block operations on an [`EditorDocument`].
//!
//! ## Design Principles
//!
//! 1. **All-or-nothing**: a mutation either fully applies or leaves the document untouched
//! 2. **Identity-preserving**: block ids never change through update or move
//! 3. **Data, not calls**: hosts can forward UI intents as JSON
//!
//! ## Mutation Semantics
//!
//! ### AddBlock
//! - Inserts at `position`, or appends when it is `None` or past the end
//! - The block must already carry an id (the editor mints one)
//!
//! ### UpdateBlock
//! - Shallow field merge over the block's JSON form
//! - `id` inside `changes` is ignored
//! - Changing `type` is allowed as long as the result is a valid block
//!
//! ### MoveBlock
//! - `new_index` is interpreted after removal and clamped to the end
//!
//! ### Missing ids
//! - Update/delete/move on an unknown id fail with `BlockNotFound`, which
//!   the editor turns into a silent no-op

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::block::{Block, BlockId};
use crate::document::EditorDocument;

/// Document operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Mutation {
    /// Insert a block
    AddBlock {
        block: Block,
        #[serde(default)]
        position: Option<usize>,
    },

    /// Merge fields into an existing block
    UpdateBlock { id: BlockId, changes: Value },

    /// Remove a block
    DeleteBlock { id: BlockId },

    /// Relocate a block within the document
    MoveBlock {
        id: BlockId,
        #[serde(rename = "newIndex")]
        new_index: usize,
    },

    /// Replace the document title
    SetTitle { title: String },

    /// Replace title and blocks at once (merge results)
    ReplaceDocument { document: EditorDocument },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Block not found: {0}")]
    BlockNotFound(String),

    #[error("Invalid patch: {0}")]
    InvalidPatch(String),

    #[error("Block has no id")]
    MissingId,
}

impl Mutation {
    /// Apply mutation to the document with validation
    pub fn apply(&self, doc: &mut EditorDocument) -> Result<(), MutationError> {
        self.validate(doc)?;

        match self {
            Mutation::AddBlock { block, position } => {
                let index = position
                    .filter(|p| *p <= doc.blocks.len())
                    .unwrap_or(doc.blocks.len());
                doc.blocks.insert(index, block.clone());
                Ok(())
            }

            Mutation::UpdateBlock { id, changes } => {
                let index = Self::index_of(doc, id)?;
                let merged = Self::merge_patch(&doc.blocks[index], changes)?;
                doc.blocks[index] = merged;
                Ok(())
            }

            Mutation::DeleteBlock { id } => {
                let index = Self::index_of(doc, id)?;
                doc.blocks.remove(index);
                Ok(())
            }

            Mutation::MoveBlock { id, new_index } => {
                let index = Self::index_of(doc, id)?;
                let block = doc.blocks.remove(index);
                let target = (*new_index).min(doc.blocks.len());
                doc.blocks.insert(target, block);
                Ok(())
            }

            Mutation::SetTitle { title } => {
                doc.title = title.clone();
                Ok(())
            }

            Mutation::ReplaceDocument { document } => {
                *doc = document.clone();
                Ok(())
            }
        }
    }

    /// Validate without applying
    pub fn validate(&self, doc: &EditorDocument) -> Result<(), MutationError> {
        match self {
            Mutation::AddBlock { block, .. } => {
                if block.id().is_empty() {
                    return Err(MutationError::MissingId);
                }
                Ok(())
            }

            Mutation::UpdateBlock { id, changes } => {
                Self::index_of(doc, id)?;
                if !changes.is_object() {
                    return Err(MutationError::InvalidPatch(
                        "changes must be a JSON object".to_string(),
                    ));
                }
                Ok(())
            }

            Mutation::DeleteBlock { id } | Mutation::MoveBlock { id, .. } => {
                Self::index_of(doc, id)?;
                Ok(())
            }

            Mutation::ReplaceDocument { document } => {
                if document.blocks.iter().any(|b| b.id().is_empty()) {
                    return Err(MutationError::MissingId);
                }
                Ok(())
            }

            Mutation::SetTitle { .. } => Ok(()),
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::AddBlock { .. } => "addBlock",
            Mutation::UpdateBlock { .. } => "updateBlock",
            Mutation::DeleteBlock { .. } => "deleteBlock",
            Mutation::MoveBlock { .. } => "moveBlock",
            Mutation::SetTitle { .. } => "setTitle",
            Mutation::ReplaceDocument { .. } => "replaceDocument",
        }
    }

    fn index_of(doc: &EditorDocument, id: &BlockId) -> Result<usize, MutationError> {
        doc.position(id.as_str())
            .ok_or_else(|| MutationError::BlockNotFound(id.to_string()))
    }

    /// Merge `changes` over `block`'s JSON form, keeping its id.
    fn merge_patch(block: &Block, changes: &Value) -> Result<Block, MutationError> {
        let Some(changes) = changes.as_object() else {
            return Err(MutationError::InvalidPatch(
                "changes must be a JSON object".to_string(),
            ));
        };

        let mut base = serde_json::to_value(block)
            .map_err(|e| MutationError::InvalidPatch(e.to_string()))?;
        let Some(fields) = base.as_object_mut() else {
            return Err(MutationError::InvalidPatch("block is not an object".to_string()));
        };

        for (key, value) in changes {
            if key == "id" {
                continue;
            }
            fields.insert(key.clone(), value.clone());
        }

        let mut merged: Block = serde_json::from_value(base)
            .map_err(|e| MutationError::InvalidPatch(e.to_string()))?;

        if let Block::List(list) = &mut merged {
            list.conform_items();
        }
        merged.set_id(block.id().clone());

        Ok(merged)
    }
}
