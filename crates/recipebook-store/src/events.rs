use std::sync::Arc;

use recipebook_shared::{Recipe, RecipeKey};

use crate::cache::BatchOutcome;

/// Change notifications published by [`RecipeStore`](crate::RecipeStore).
///
/// Every event that changes the user-recipe cache carries the revision the
/// cache reached, so listeners can tell whether a snapshot they hold is
/// stale.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// A subscription batch changed the cache.
    Synced { revision: u64, outcome: BatchOutcome },
    /// An acknowledged `add` (or an `update` of an uncached recipe).
    Inserted { revision: u64, recipe: Recipe },
    /// An acknowledged write replaced a cached recipe.
    Updated { revision: u64, recipe: Recipe },
    /// An acknowledged delete removed a cached recipe.
    Removed { revision: u64, remote_id: String },
    Viewed { key: RecipeKey },
}

impl StoreEvent {
    pub fn revision(&self) -> Option<u64> {
        match self {
            Self::Synced { revision, .. }
            | Self::Inserted { revision, .. }
            | Self::Updated { revision, .. }
            | Self::Removed { revision, .. } => Some(*revision),
            Self::Viewed { .. } => None,
        }
    }
}

/// One consistent read of the store.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub revision: u64,
    pub user_recipes: Arc<Vec<Recipe>>,
    pub seed_recipes: Arc<Vec<Recipe>>,
}
