//! Persisted draft records and the import/export file shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::block::Block;
use crate::clock::Millis;
use crate::document::EditorDocument;
use crate::EditorError;

pub const UNTITLED_DRAFT_NAME: &str = "Untitled Draft";

/// A named, persisted snapshot of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
    /// Creation time; stable across saves
    #[serde(default)]
    pub timestamp: Millis,
    /// Last write time
    #[serde(default)]
    pub updated_at: Millis,
}

impl Draft {
    pub fn document(&self) -> EditorDocument {
        EditorDocument::new(self.title.clone(), self.blocks.clone())
    }

    pub fn summary(&self) -> DraftSummary {
        DraftSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            updated_at: Some(self.updated_at),
            timestamp: Some(self.timestamp),
        }
    }
}

/// One entry of the drafts index, enough to render a list without loading bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Millis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Millis>,
}

impl DraftSummary {
    /// `updatedAt`, falling back to `timestamp`, then 0.
    pub fn last_modified(&self) -> Millis {
        self.updated_at.or(self.timestamp).unwrap_or(0)
    }
}

/// File shape produced by "export all drafts".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftsExport {
    pub drafts: Vec<Draft>,
    #[serde(default)]
    pub exported_at: Millis,
}

/// Raw drafts handed to `import_drafts`, not yet normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportPayload {
    pub drafts: Vec<Value>,
}

impl ImportPayload {
    /// Accepts `{ "drafts": [...] }`, a bare array, or a single draft object.
    pub fn from_value(value: Value) -> Result<Self, EditorError> {
        match value {
            Value::Object(mut map) if map.contains_key("drafts") => match map.remove("drafts") {
                Some(Value::Array(drafts)) => Ok(Self { drafts }),
                _ => Err(EditorError::InvalidImport("'drafts' must be an array".to_string())),
            },
            Value::Object(map) => Ok(Self {
                drafts: vec![Value::Object(map)],
            }),
            Value::Array(drafts) => Ok(Self { drafts }),
            other => Err(EditorError::InvalidImport(format!(
                "expected a draft object or a drafts collection, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    pub fn single(draft: &Draft) -> Result<Self, EditorError> {
        Ok(Self {
            drafts: vec![serde_json::to_value(draft)?],
        })
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Replace drafts whose id already exists
    pub overwrite: bool,
    /// Delete every persisted draft before importing
    pub replace: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    pub imported: usize,
    pub updated: usize,
    pub skipped: usize,
}
