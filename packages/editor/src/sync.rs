//! # Draft Mirror
//!
//! Remote copy of the drafts (a CRUD draft server in production). The
//! editor never waits on it: saves queue [`MirrorOp`]s in an outbox that the
//! session drains into background pushes, and failures are only reported.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use futures::future::BoxFuture;
use futures::FutureExt;
use thiserror::Error;

use crate::draft::{Draft, DraftSummary};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("Mirror request failed: {0}")]
    Failed(String),

    #[error("Mirror request timed out")]
    Timeout,

    #[error("Draft not found on mirror: {0}")]
    NotFound(String),
}

/// Remote draft store, mirroring the REST contract.
pub trait DraftMirror: Send + Sync {
    fn list(&self) -> BoxFuture<'static, Result<Vec<DraftSummary>, SyncError>>;

    fn get(&self, id: String) -> BoxFuture<'static, Result<Draft, SyncError>>;

    fn put(&self, draft: Draft) -> BoxFuture<'static, Result<(), SyncError>>;

    fn delete(&self, id: String) -> BoxFuture<'static, Result<(), SyncError>>;
}

/// Pending remote write produced by a local save or delete.
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorOp {
    Put(Draft),
    Delete(String),
}

impl MirrorOp {
    pub fn draft_id(&self) -> &str {
        match self {
            MirrorOp::Put(draft) => &draft.id,
            MirrorOp::Delete(id) => id,
        }
    }

    /// Run this op against `mirror`.
    pub fn send(self, mirror: &dyn DraftMirror) -> BoxFuture<'static, Result<(), SyncError>> {
        match self {
            MirrorOp::Put(draft) => mirror.put(draft),
            MirrorOp::Delete(id) => mirror.delete(id),
        }
    }
}

/// In-process mirror. Clones share the same drafts.
#[derive(Debug, Default, Clone)]
pub struct MemoryMirror {
    drafts: Arc<RwLock<BTreeMap<String, Draft>>>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<Draft> {
        self.drafts
            .read()
            .map(|drafts| drafts.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.drafts
            .read()
            .map(|drafts| drafts.contains_key(id))
            .unwrap_or(false)
    }

    fn poisoned() -> SyncError {
        SyncError::Failed("memory mirror lock poisoned".to_string())
    }
}

impl DraftMirror for MemoryMirror {
    fn list(&self) -> BoxFuture<'static, Result<Vec<DraftSummary>, SyncError>> {
        let result = self
            .drafts
            .read()
            .map(|drafts| drafts.values().map(Draft::summary).collect())
            .map_err(|_| Self::poisoned());
        async move { result }.boxed()
    }

    fn get(&self, id: String) -> BoxFuture<'static, Result<Draft, SyncError>> {
        let result = match self.drafts.read() {
            Ok(drafts) => drafts.get(&id).cloned().ok_or(SyncError::NotFound(id)),
            Err(_) => Err(Self::poisoned()),
        };
        async move { result }.boxed()
    }

    fn put(&self, draft: Draft) -> BoxFuture<'static, Result<(), SyncError>> {
        let result = match self.drafts.write() {
            Ok(mut drafts) => {
                drafts.insert(draft.id.clone(), draft);
                Ok(())
            }
            Err(_) => Err(Self::poisoned()),
        };
        async move { result }.boxed()
    }

    fn delete(&self, id: String) -> BoxFuture<'static, Result<(), SyncError>> {
        let result = match self.drafts.write() {
            Ok(mut drafts) => {
                drafts.remove(&id);
                Ok(())
            }
            Err(_) => Err(Self::poisoned()),
        };
        async move { result }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(id: &str) -> Draft {
        Draft {
            id: id.to_string(),
            name: "n".to_string(),
            title: "t".to_string(),
            blocks: Vec::new(),
            timestamp: 1,
            updated_at: 2,
        }
    }

    #[tokio::test]
    async fn test_memory_mirror_crud() {
        let mirror = MemoryMirror::new();

        mirror.put(draft("a")).await.unwrap();
        mirror.put(draft("b")).await.unwrap();
        assert_eq!(mirror.list().await.unwrap().len(), 2);
        assert_eq!(mirror.get("a".to_string()).await.unwrap().id, "a");

        mirror.delete("a".to_string()).await.unwrap();
        assert_eq!(
            mirror.get("a".to_string()).await,
            Err(SyncError::NotFound("a".to_string()))
        );
        assert!(mirror.contains("b"));
    }

    #[tokio::test]
    async fn test_mirror_op_send() {
        let mirror = MemoryMirror::new();

        MirrorOp::Put(draft("x")).send(&mirror).await.unwrap();
        assert!(mirror.contains("x"));

        let op = MirrorOp::Delete("x".to_string());
        assert_eq!(op.draft_id(), "x");
        op.send(&mirror).await.unwrap();
        assert!(mirror.snapshot().is_empty());
    }
}
