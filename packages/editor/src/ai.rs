//! AI suggestion collaborator contract.
//!
//! The editor only builds requests and merges returned drafts; transport is
//! up to the implementor.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::document::EditorDocument;
use crate::merge::SelectionContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiRequest {
    pub prompt: String,
    /// Live document with empty lists removed
    pub draft: EditorDocument,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionContext>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Proposed document, loosely shaped; normalized before merging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<Value>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AiError {
    #[error("AI request aborted")]
    Aborted,

    #[error("AI request failed: {0}")]
    Failed(String),

    #[error("AI request timed out")]
    Timeout,
}

pub trait AiAssistant: Send + Sync {
    fn suggest(&self, request: AiRequest) -> BoxFuture<'static, Result<AiResponse, AiError>>;
}
