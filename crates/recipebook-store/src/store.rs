//! The recipe store: authoritative in-memory mirror of the remote
//! user-recipe collection plus the static seed catalog.
//!
//! All state sits behind one `RwLock`. Subscription batches and
//! acknowledged writes each take the write guard once, so mutations are
//! serialized and readers never observe half of a batch. Remote calls are
//! made without holding the lock and the cache is only touched after the
//! remote side acknowledged, so a failed call leaves the cache untouched.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use recipebook_shared::codec::to_document;
use recipebook_shared::constants::{FIELD_CREATED_AT, FIELD_IS_USER_RECIPE};
use recipebook_shared::{Recipe, RecipeDraft, RecipeKey};

use crate::cache::{AckOutcome, StoreState};
use crate::config::StoreConfig;
use crate::error::{IdentityError, NetworkError, Result};
use crate::events::{StoreEvent, StoreSnapshot};
use crate::remote::{
    ChangeFeed, DocumentStore, FieldFilter, OrderBy, RemoteError, SubscriptionQuery,
};
use crate::seed::seed_catalog;

/// Handle to the recipe store. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct RecipeStore {
    inner: Arc<Inner>,
}

struct Inner {
    remote: Arc<dyn DocumentStore>,
    config: StoreConfig,
    state: Arc<RwLock<StoreState>>,
    events: broadcast::Sender<StoreEvent>,
    subscription: Mutex<Option<SubscriptionTask>>,
}

/// The task draining a change feed. Aborted when dropped.
struct SubscriptionTask {
    handle: JoinHandle<()>,
}

impl SubscriptionTask {
    /// Abort the task and wait until it has stopped applying batches.
    async fn stop(mut self) {
        self.handle.abort();
        let _ = (&mut self.handle).await;
    }
}

impl Drop for SubscriptionTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Query used for the user-recipe subscription: user-authored documents,
/// newest first.
pub fn user_recipes_query() -> SubscriptionQuery {
    SubscriptionQuery {
        filter: Some(FieldFilter {
            field: FIELD_IS_USER_RECIPE.to_string(),
            equals: Value::Bool(true),
        }),
        order_by: Some(OrderBy {
            field: FIELD_CREATED_AT.to_string(),
            descending: true,
        }),
    }
}

impl RecipeStore {
    /// Create a store with the built-in seed catalog. No subscription is
    /// opened until [`subscribe`](Self::subscribe) is called.
    pub fn new(remote: Arc<dyn DocumentStore>, config: StoreConfig) -> Self {
        Self::with_seed_recipes(remote, config, seed_catalog(Utc::now()))
    }

    pub fn with_seed_recipes(
        remote: Arc<dyn DocumentStore>,
        config: StoreConfig,
        seed_recipes: Vec<Recipe>,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        info!(seed_recipes = seed_recipes.len(), "Recipe store created");

        Self {
            inner: Arc::new(Inner {
                remote,
                config,
                state: Arc::new(RwLock::new(StoreState::new(seed_recipes))),
                events,
                subscription: Mutex::new(None),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Subscription
    // -----------------------------------------------------------------------

    /// Open the standing subscription to user recipes, replacing any
    /// previous one.
    ///
    /// The new feed is opened first; only once it is established is the
    /// old task stopped, and batches from the new feed are applied after
    /// that. If opening fails the previous subscription stays active.
    pub async fn subscribe(&self) -> Result<()> {
        let mut slot = self.inner.subscription.lock().await;

        let query = user_recipes_query();
        let feed = self
            .remote_call("subscribe", self.inner.remote.subscribe(&query))
            .await?;

        if let Some(previous) = slot.take() {
            debug!("Replacing existing recipe subscription");
            previous.stop().await;
        }

        let state = Arc::clone(&self.inner.state);
        let events = self.inner.events.clone();
        let handle = tokio::spawn(run_feed(feed, state, events));
        *slot = Some(SubscriptionTask { handle });

        info!("Subscribed to user recipes");
        Ok(())
    }

    /// Stop delivery from the current subscription, if any.
    pub async fn unsubscribe(&self) {
        if let Some(task) = self.inner.subscription.lock().await.take() {
            task.stop().await;
            info!("Unsubscribed from user recipes");
        }
    }

    pub async fn is_subscribed(&self) -> bool {
        self.inner
            .subscription
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Validate `draft` and persist it as a new user recipe.
    ///
    /// The recipe only enters the cache after the remote store acknowledged
    /// the write. Returns the recipe as stored.
    pub async fn add(&self, draft: RecipeDraft) -> Result<Recipe> {
        let mut recipe = draft.validate()?;

        let id = self.inner.remote.new_document_id();
        recipe.remote_id = Some(id.clone());
        recipe.is_user_authored = true;
        recipe.created_at = Utc::now();

        let document = to_document(&recipe)?;
        self.remote_call("add", self.inner.remote.put(&id, document))
            .await?;

        self.apply_ack(recipe.clone(), |state, recipe| {
            state.insert_acknowledged(recipe)
        })
        .await;

        info!(id = %id, title = %recipe.title, "Recipe added");
        Ok(recipe)
    }

    /// Persist changes to an existing user recipe (merge by remote id).
    pub async fn update(&self, recipe: Recipe) -> Result<Recipe> {
        let Some(id) = recipe.remote_id.clone() else {
            return Err(IdentityError::MissingRemoteId {
                operation: "update",
            }
            .into());
        };
        recipe.validate_shape()?;

        let mut recipe = recipe;
        recipe.is_user_authored = true;

        let document = to_document(&recipe)?;
        self.remote_call("update", self.inner.remote.patch(&id, document))
            .await?;

        self.apply_ack(recipe.clone(), |state, recipe| {
            state.replace_acknowledged(recipe)
        })
        .await;

        info!(id = %id, "Recipe updated");
        Ok(recipe)
    }

    /// Delete a user recipe. The cached entry is removed only after the
    /// remote delete succeeded.
    pub async fn delete(&self, recipe: &Recipe) -> Result<()> {
        let Some(id) = recipe.remote_id.as_deref() else {
            return Err(IdentityError::MissingRemoteId {
                operation: "delete",
            }
            .into());
        };

        self.remote_call("delete", self.inner.remote.delete(id))
            .await?;

        let mut state = self.inner.state.write().await;
        if state.remove_acknowledged(id) {
            let _ = self.inner.events.send(StoreEvent::Removed {
                revision: state.revision(),
                remote_id: id.to_string(),
            });
        }
        drop(state);

        info!(id = %id, "Recipe deleted");
        Ok(())
    }

    /// Remember that the recipe was opened this session. Returns `true`
    /// the first time.
    pub async fn mark_viewed(&self, recipe: &Recipe) -> bool {
        let key = recipe.key();
        let mut state = self.inner.state.write().await;
        let inserted = state.mark_viewed(key.clone());
        if inserted {
            let _ = self.inner.events.send(StoreEvent::Viewed { key });
        }
        inserted
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn user_recipes(&self) -> Arc<Vec<Recipe>> {
        self.inner.state.read().await.user_recipes()
    }

    pub async fn seed_recipes(&self) -> Arc<Vec<Recipe>> {
        self.inner.state.read().await.seed_recipes()
    }

    /// User recipes followed by the seed recipes they do not shadow.
    pub async fn all_recipes(&self) -> Vec<Recipe> {
        self.inner.state.read().await.all_recipes()
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let state = self.inner.state.read().await;
        StoreSnapshot {
            revision: state.revision(),
            user_recipes: state.user_recipes(),
            seed_recipes: state.seed_recipes(),
        }
    }

    pub async fn revision(&self) -> u64 {
        self.inner.state.read().await.revision()
    }

    pub async fn recipe_by_remote_id(&self, remote_id: &str) -> Option<Recipe> {
        self.inner.state.read().await.find_by_remote_id(remote_id)
    }

    pub async fn is_viewed(&self, recipe: &Recipe) -> bool {
        self.inner.state.read().await.is_viewed(&recipe.key())
    }

    pub async fn viewed_recipes(&self) -> Vec<RecipeKey> {
        self.inner.state.read().await.viewed()
    }

    /// Listen for store changes. Slow listeners may observe
    /// `RecvError::Lagged` and should re-read a [`snapshot`](Self::snapshot).
    pub fn events(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn apply_ack(
        &self,
        recipe: Recipe,
        apply: impl FnOnce(&mut StoreState, Recipe) -> AckOutcome,
    ) {
        let mut state = self.inner.state.write().await;
        let outcome = apply(&mut state, recipe.clone());
        let revision = state.revision();

        let event = match outcome {
            AckOutcome::Inserted => Some(StoreEvent::Inserted { revision, recipe }),
            AckOutcome::Replaced => Some(StoreEvent::Updated { revision, recipe }),
            AckOutcome::Unchanged => None,
        };
        if let Some(event) = event {
            let _ = self.inner.events.send(event);
        }
    }

    /// Run one remote call under the configured timeout.
    async fn remote_call<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = std::result::Result<T, RemoteError>>,
    ) -> Result<T> {
        let after = self.inner.config.remote_timeout;
        match tokio::time::timeout(after, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(operation, error = %e, "Remote call failed");
                Err(NetworkError::Remote(e).into())
            }
            Err(_) => {
                warn!(operation, ?after, "Remote call timed out");
                Err(NetworkError::Timeout { operation, after }.into())
            }
        }
    }
}

/// Drain a change feed into the cache, one batch per write guard.
async fn run_feed(
    mut feed: ChangeFeed,
    state: Arc<RwLock<StoreState>>,
    events: broadcast::Sender<StoreEvent>,
) {
    while let Some(item) = feed.recv().await {
        match item {
            Ok(batch) => {
                let mut state = state.write().await;
                let outcome = state.apply_batch(batch);
                if outcome.changed {
                    let _ = events.send(StoreEvent::Synced {
                        revision: state.revision(),
                        outcome,
                    });
                }
            }
            Err(e) => {
                warn!(error = %e, "Recipe subscription reported an error");
            }
        }
    }

    info!("Recipe subscription feed closed");
}
