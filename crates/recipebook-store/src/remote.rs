//! Contract of the remote document database that persists user recipes.
//!
//! The store only talks to the database through [`DocumentStore`], so any
//! backend (hosted document service, the in-process
//! [`MemoryDocumentStore`](crate::memory::MemoryDocumentStore), a test
//! double) can be plugged in at construction time.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::mpsc;

/// A flat document as stored remotely.
pub type Document = Map<String, Value>;

/// Stream of change batches for one subscription. Dropping the receiver
/// ends the subscription on the remote side.
pub type ChangeFeed = mpsc::Receiver<Result<ChangeBatch, RemoteError>>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Equality filter on a single top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub equals: Value,
}

impl FieldFilter {
    pub fn matches(&self, document: &Document) -> bool {
        document.get(&self.field) == Some(&self.equals)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

/// Which documents a subscription delivers and in what order.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionQuery {
    pub filter: Option<FieldFilter>,
    pub order_by: Option<OrderBy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    /// Every matching document. Anything not listed is gone.
    Snapshot,
    /// Incremental changes since the previous batch.
    Diff,
}

/// One notification delivered on a [`ChangeFeed`].
#[derive(Debug, Clone)]
pub struct ChangeBatch {
    pub kind: BatchKind,
    /// `(document id, document)` pairs, in query order.
    pub added_or_modified: Vec<(String, Document)>,
    pub removed: Vec<String>,
}

impl ChangeBatch {
    pub fn snapshot(documents: Vec<(String, Document)>) -> Self {
        Self {
            kind: BatchKind::Snapshot,
            added_or_modified: documents,
            removed: Vec::new(),
        }
    }

    pub fn diff(added_or_modified: Vec<(String, Document)>, removed: Vec<String>) -> Self {
        Self {
            kind: BatchKind::Diff,
            added_or_modified,
            removed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind == BatchKind::Diff && self.added_or_modified.is_empty() && self.removed.is_empty()
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Allocate an id for a document about to be created.
    fn new_document_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Open a standing subscription. The feed yields a full snapshot first,
    /// then diffs.
    async fn subscribe(&self, query: &SubscriptionQuery) -> Result<ChangeFeed, RemoteError>;

    /// Create or fully replace the document under `id`.
    async fn put(&self, id: &str, document: Document) -> Result<(), RemoteError>;

    /// Merge `partial` into the document under `id`, creating it if needed.
    /// Fields missing from `partial` are preserved.
    async fn patch(&self, id: &str, partial: Document) -> Result<(), RemoteError>;

    async fn delete(&self, id: &str) -> Result<(), RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_filter() {
        let filter = FieldFilter {
            field: "isUserRecipe".to_string(),
            equals: Value::Bool(true),
        };
        let yes = json!({ "isUserRecipe": true }).as_object().cloned().unwrap();
        let no = json!({ "isUserRecipe": false }).as_object().cloned().unwrap();
        let missing = Document::new();

        assert!(filter.matches(&yes));
        assert!(!filter.matches(&no));
        assert!(!filter.matches(&missing));
    }

    #[test]
    fn test_empty_batch() {
        assert!(ChangeBatch::diff(Vec::new(), Vec::new()).is_empty());
        assert!(!ChangeBatch::snapshot(Vec::new()).is_empty());
    }
}
