//! In-process [`DocumentStore`] implementation.
//!
//! Keeps every document in a `BTreeMap`, evaluates subscription filters and
//! ordering locally and fans snapshot/diff batches out to subscribers. Used
//! by the application shell when no hosted backend is configured and as
//! the remote in tests, which is why it can be switched offline and counts
//! the calls it receives.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::debug;

use crate::remote::{
    ChangeBatch, ChangeFeed, Document, DocumentStore, RemoteError, SubscriptionQuery,
};

const DEFAULT_FEED_CAPACITY: usize = 256;

struct Subscriber {
    query: SubscriptionQuery,
    tx: mpsc::Sender<Result<ChangeBatch, RemoteError>>,
}

/// Number of requests received per operation, including rejected ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub subscribe: u64,
    pub put: u64,
    pub patch: u64,
    pub delete: u64,
}

impl CallCounts {
    pub fn total(&self) -> u64 {
        self.subscribe + self.put + self.patch + self.delete
    }
}

pub struct MemoryDocumentStore {
    documents: RwLock<BTreeMap<String, Document>>,
    subscribers: Mutex<Vec<Subscriber>>,
    available: AtomicBool,
    latency_ms: AtomicU64,
    feed_capacity: usize,
    subscribe_calls: AtomicU64,
    put_calls: AtomicU64,
    patch_calls: AtomicU64,
    delete_calls: AtomicU64,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::with_feed_capacity(DEFAULT_FEED_CAPACITY)
    }

    pub fn with_feed_capacity(feed_capacity: usize) -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            subscribers: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
            latency_ms: AtomicU64::new(0),
            feed_capacity: feed_capacity.max(1),
            subscribe_calls: AtomicU64::new(0),
            put_calls: AtomicU64::new(0),
            patch_calls: AtomicU64::new(0),
            delete_calls: AtomicU64::new(0),
        }
    }

    /// While unavailable every request fails with
    /// [`RemoteError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Artificial delay applied before each request is served.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn call_counts(&self) -> CallCounts {
        CallCounts {
            subscribe: self.subscribe_calls.load(Ordering::SeqCst),
            put: self.put_calls.load(Ordering::SeqCst),
            patch: self.patch_calls.load(Ordering::SeqCst),
            delete: self.delete_calls.load(Ordering::SeqCst),
        }
    }

    pub async fn document(&self, id: &str) -> Option<Document> {
        self.documents.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    pub async fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock().await;
        subscribers.retain(|s| !s.tx.is_closed());
        subscribers.len()
    }

    /// Deliver `error` on every open feed, as a hosted backend does when a
    /// listener hits a transient failure.
    pub async fn broadcast_error(&self, error: RemoteError) {
        let subscribers = self.subscribers.lock().await;
        for subscriber in subscribers.iter() {
            let _ = subscriber.tx.send(Err(error.clone())).await;
        }
    }

    async fn begin(&self, counter: &AtomicU64) -> Result<(), RemoteError> {
        counter.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if !self.available.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable(
                "memory store is offline".to_string(),
            ));
        }
        Ok(())
    }

    /// Notify subscribers about a single document transition. Must be called
    /// with the documents lock held so batches follow write order.
    async fn notify(&self, id: &str, before: Option<&Document>, after: Option<&Document>) {
        let mut subscribers = self.subscribers.lock().await;
        subscribers.retain(|s| !s.tx.is_closed());

        for subscriber in subscribers.iter() {
            let matches = |doc: &Document| {
                subscriber
                    .query
                    .filter
                    .as_ref()
                    .map_or(true, |filter| filter.matches(doc))
            };

            let batch = match (before.map(matches), after.filter(|doc| matches(*doc))) {
                (_, Some(doc)) => ChangeBatch::diff(vec![(id.to_string(), doc.clone())], Vec::new()),
                (Some(true), None) => ChangeBatch::diff(Vec::new(), vec![id.to_string()]),
                _ => continue,
            };

            if subscriber.tx.send(Ok(batch)).await.is_err() {
                debug!(id, "Subscriber went away during notify");
            }
        }
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn subscribe(&self, query: &SubscriptionQuery) -> Result<ChangeFeed, RemoteError> {
        self.begin(&self.subscribe_calls).await?;

        // Hold the documents lock until the subscriber is registered so no
        // write can slip between the snapshot and the first diff.
        let documents = self.documents.read().await;

        let mut matching: Vec<(String, Document)> = documents
            .iter()
            .filter(|(_, doc)| query.filter.as_ref().map_or(true, |f| f.matches(doc)))
            .map(|(id, doc)| (id.clone(), doc.clone()))
            .collect();

        if let Some(order) = &query.order_by {
            matching.sort_by(|(id_a, a), (id_b, b)| {
                let ord = compare_values(a.get(&order.field), b.get(&order.field));
                let ord = if order.descending { ord.reverse() } else { ord };
                ord.then_with(|| id_a.cmp(id_b))
            });
        }

        let (tx, rx) = mpsc::channel(self.feed_capacity);
        tx.try_send(Ok(ChangeBatch::snapshot(matching)))
            .map_err(|e| RemoteError::Rejected(format!("failed to queue snapshot: {e}")))?;

        self.subscribers.lock().await.push(Subscriber {
            query: query.clone(),
            tx,
        });
        drop(documents);

        debug!("Memory store subscription opened");
        Ok(rx)
    }

    async fn put(&self, id: &str, document: Document) -> Result<(), RemoteError> {
        self.begin(&self.put_calls).await?;

        let mut documents = self.documents.write().await;
        let before = documents.insert(id.to_string(), document);
        let after = documents.get(id).cloned();
        self.notify(id, before.as_ref(), after.as_ref()).await;
        Ok(())
    }

    async fn patch(&self, id: &str, partial: Document) -> Result<(), RemoteError> {
        self.begin(&self.patch_calls).await?;

        let mut documents = self.documents.write().await;
        let before = documents.get(id).cloned();
        let merged = documents.entry(id.to_string()).or_default();
        for (key, value) in partial {
            merged.insert(key, value);
        }
        let after = merged.clone();
        self.notify(id, before.as_ref(), Some(&after)).await;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.begin(&self.delete_calls).await?;

        let mut documents = self.documents.write().await;
        let before = documents.remove(id);
        if before.is_some() {
            self.notify(id, before.as_ref(), None).await;
        }
        Ok(())
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => {
            match (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b)) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.cmp(b),
            }
        }
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(CmpOrdering::Equal)
        }
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (None, Some(_)) => CmpOrdering::Less,
        (Some(_), None) => CmpOrdering::Greater,
        _ => CmpOrdering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{BatchKind, FieldFilter, OrderBy};
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn user_query() -> SubscriptionQuery {
        SubscriptionQuery {
            filter: Some(FieldFilter {
                field: "isUserRecipe".to_string(),
                equals: Value::Bool(true),
            }),
            order_by: Some(OrderBy {
                field: "createdAt".to_string(),
                descending: true,
            }),
        }
    }

    #[tokio::test]
    async fn test_snapshot_is_filtered_and_ordered() {
        let store = MemoryDocumentStore::new();
        store
            .put("a", doc(json!({ "isUserRecipe": true, "createdAt": "2024-01-01T00:00:00Z" })))
            .await
            .unwrap();
        store
            .put("b", doc(json!({ "isUserRecipe": true, "createdAt": "2024-03-01T00:00:00Z" })))
            .await
            .unwrap();
        store
            .put("c", doc(json!({ "isUserRecipe": false, "createdAt": "2024-05-01T00:00:00Z" })))
            .await
            .unwrap();

        let mut feed = store.subscribe(&user_query()).await.unwrap();
        let batch = feed.recv().await.unwrap().unwrap();

        assert_eq!(batch.kind, BatchKind::Snapshot);
        let ids: Vec<_> = batch.added_or_modified.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_diffs_follow_writes() {
        let store = MemoryDocumentStore::new();
        let mut feed = store.subscribe(&user_query()).await.unwrap();
        let _snapshot = feed.recv().await.unwrap().unwrap();

        store.put("x", doc(json!({ "isUserRecipe": true }))).await.unwrap();
        let added = feed.recv().await.unwrap().unwrap();
        assert_eq!(added.kind, BatchKind::Diff);
        assert_eq!(added.added_or_modified[0].0, "x");

        // Leaving the filter reads as a removal.
        store.patch("x", doc(json!({ "isUserRecipe": false }))).await.unwrap();
        let left = feed.recv().await.unwrap().unwrap();
        assert_eq!(left.removed, vec!["x".to_string()]);

        // Writes outside the filter are invisible.
        store.delete("x").await.unwrap();
        store.put("y", doc(json!({ "isUserRecipe": true }))).await.unwrap();
        let next = feed.recv().await.unwrap().unwrap();
        assert_eq!(next.added_or_modified[0].0, "y");
    }

    #[tokio::test]
    async fn test_patch_preserves_missing_fields() {
        let store = MemoryDocumentStore::new();
        store
            .put("p", doc(json!({ "title": "Old", "imageBase64": "AAAA" })))
            .await
            .unwrap();
        store.patch("p", doc(json!({ "title": "New" }))).await.unwrap();

        let stored = store.document("p").await.unwrap();
        assert_eq!(stored["title"], "New");
        assert_eq!(stored["imageBase64"], "AAAA");
    }

    #[tokio::test]
    async fn test_offline_rejects_and_counts() {
        let store = MemoryDocumentStore::new();
        store.set_available(false);

        let err = store.put("a", Document::new()).await.unwrap_err();
        assert!(matches!(err, RemoteError::Unavailable(_)));
        assert!(store.is_empty().await);
        assert_eq!(store.call_counts().put, 1);
        assert_eq!(store.call_counts().total(), 1);
    }

    #[tokio::test]
    async fn test_dropped_feed_unregisters() {
        let store = MemoryDocumentStore::new();
        let feed = store.subscribe(&user_query()).await.unwrap();
        assert_eq!(store.subscriber_count().await, 1);

        drop(feed);
        assert_eq!(store.subscriber_count().await, 0);
    }
}
