//! Local mirror of the remote user-recipe collection.
//!
//! [`StoreState`] is only ever touched through the store's write lock, so
//! every method here runs as one atomic step from a reader's point of view.
//! Readers get `Arc` snapshots of the recipe list; writers copy on write.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use recipebook_shared::codec::from_document;
use recipebook_shared::{DecodeError, Recipe, RecipeKey};
use tracing::{debug, warn};

use crate::remote::{BatchKind, ChangeBatch, Document};

/// What applying one change batch did to the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub changed: bool,
    pub upserted: usize,
    pub removed: usize,
    pub skipped: usize,
}

/// How an acknowledged write landed in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    Inserted,
    Replaced,
    Unchanged,
}

pub(crate) struct StoreState {
    user_recipes: Arc<Vec<Recipe>>,
    seed_recipes: Arc<Vec<Recipe>>,
    viewed: HashSet<RecipeKey>,
    revision: u64,
}

impl StoreState {
    pub(crate) fn new(seed_recipes: Vec<Recipe>) -> Self {
        Self {
            user_recipes: Arc::new(Vec::new()),
            seed_recipes: Arc::new(seed_recipes),
            viewed: HashSet::new(),
            revision: 0,
        }
    }

    pub(crate) fn user_recipes(&self) -> Arc<Vec<Recipe>> {
        Arc::clone(&self.user_recipes)
    }

    pub(crate) fn seed_recipes(&self) -> Arc<Vec<Recipe>> {
        Arc::clone(&self.seed_recipes)
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    /// User recipes followed by every seed recipe not shadowed by a user
    /// recipe with the same remote id.
    pub(crate) fn all_recipes(&self) -> Vec<Recipe> {
        let user_ids: HashSet<&str> = self
            .user_recipes
            .iter()
            .filter_map(|r| r.remote_id.as_deref())
            .collect();

        let mut all = Vec::with_capacity(self.user_recipes.len() + self.seed_recipes.len());
        all.extend(self.user_recipes.iter().cloned());
        all.extend(
            self.seed_recipes
                .iter()
                .filter(|seed| {
                    seed.remote_id
                        .as_deref()
                        .map_or(true, |id| !user_ids.contains(id))
                })
                .cloned(),
        );
        all
    }

    pub(crate) fn find_by_remote_id(&self, remote_id: &str) -> Option<Recipe> {
        self.user_recipes
            .iter()
            .find(|r| r.remote_id.as_deref() == Some(remote_id))
            .cloned()
    }

    // -----------------------------------------------------------------------
    // Subscription batches
    // -----------------------------------------------------------------------

    pub(crate) fn apply_batch(&mut self, batch: ChangeBatch) -> BatchOutcome {
        if batch.is_empty() {
            debug!("Ignoring empty diff");
            return BatchOutcome::default();
        }

        let outcome = match batch.kind {
            BatchKind::Snapshot => self.apply_snapshot(batch),
            BatchKind::Diff => self.apply_diff(batch),
        };
        if outcome.changed {
            self.revision += 1;
        }
        outcome
    }

    fn apply_snapshot(&mut self, batch: ChangeBatch) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let cached: HashMap<&str, &Recipe> = self
            .user_recipes
            .iter()
            .filter_map(|r| r.remote_id.as_deref().map(|id| (id, r)))
            .collect();
        let removed: HashSet<&str> = batch.removed.iter().map(String::as_str).collect();

        let mut seen = HashSet::new();
        let mut next = Vec::with_capacity(batch.added_or_modified.len());
        for (id, document) in &batch.added_or_modified {
            if removed.contains(id.as_str()) || !seen.insert(id.as_str()) {
                continue;
            }
            let previous = cached.get(id.as_str()).copied();
            match decode(id, document, previous) {
                Ok(recipe) => {
                    outcome.upserted += 1;
                    next.push(recipe);
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "Skipping malformed recipe document");
                    outcome.skipped += 1;
                    if let Some(previous) = previous {
                        next.push(previous.clone());
                    }
                }
            }
        }

        outcome.removed = cached
            .keys()
            .filter(|id| !next.iter().any(|r| r.remote_id.as_deref() == Some(**id)))
            .count();
        outcome.changed = !same_list(&self.user_recipes, &next);
        if outcome.changed {
            self.user_recipes = Arc::new(next);
        }

        debug!(
            upserted = outcome.upserted,
            removed = outcome.removed,
            skipped = outcome.skipped,
            changed = outcome.changed,
            "Applied snapshot"
        );
        outcome
    }

    fn apply_diff(&mut self, batch: ChangeBatch) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let mut list: Vec<Recipe> = self.user_recipes.as_ref().clone();

        // Removals first. Unknown ids are a no-op.
        for id in &batch.removed {
            if let Some(pos) = position(&list, id) {
                list.remove(pos);
                outcome.removed += 1;
            }
        }

        let mut fresh: Vec<Recipe> = Vec::new();
        for (id, document) in &batch.added_or_modified {
            let existing = position(&list, id);
            let previous = existing
                .map(|pos| &list[pos])
                .or_else(|| fresh.iter().find(|r| r.remote_id.as_deref() == Some(id.as_str())));

            let recipe = match decode(id, document, previous) {
                Ok(recipe) => recipe,
                Err(e) => {
                    warn!(id = %id, error = %e, "Skipping malformed recipe document");
                    outcome.skipped += 1;
                    continue;
                }
            };

            outcome.upserted += 1;
            match existing {
                Some(pos) => list[pos] = recipe,
                None => match position(&fresh, id) {
                    Some(pos) => fresh[pos] = recipe,
                    None => fresh.push(recipe),
                },
            }
        }

        // New recipes go to the front, keeping their batch order.
        list.splice(0..0, fresh);

        outcome.changed = !same_list(&self.user_recipes, &list);
        if outcome.changed {
            self.user_recipes = Arc::new(list);
        }

        debug!(
            upserted = outcome.upserted,
            removed = outcome.removed,
            skipped = outcome.skipped,
            changed = outcome.changed,
            "Applied diff"
        );
        outcome
    }

    // -----------------------------------------------------------------------
    // Acknowledged writes
    // -----------------------------------------------------------------------

    /// Record a created recipe: at the front, or in place if a notification
    /// already delivered it.
    pub(crate) fn insert_acknowledged(&mut self, recipe: Recipe) -> AckOutcome {
        self.upsert_acknowledged(recipe, true)
    }

    /// Record an updated recipe: in place, or appended if not cached.
    pub(crate) fn replace_acknowledged(&mut self, recipe: Recipe) -> AckOutcome {
        self.upsert_acknowledged(recipe, false)
    }

    fn upsert_acknowledged(&mut self, recipe: Recipe, front: bool) -> AckOutcome {
        let Some(id) = recipe.remote_id.clone() else {
            return AckOutcome::Unchanged;
        };

        let outcome = match position(&self.user_recipes, &id) {
            Some(pos) if self.user_recipes[pos].same_contents(&recipe) => AckOutcome::Unchanged,
            Some(pos) => {
                Arc::make_mut(&mut self.user_recipes)[pos] = recipe;
                AckOutcome::Replaced
            }
            None => {
                let list = Arc::make_mut(&mut self.user_recipes);
                if front {
                    list.insert(0, recipe);
                } else {
                    list.push(recipe);
                }
                AckOutcome::Inserted
            }
        };

        if outcome != AckOutcome::Unchanged {
            self.revision += 1;
        }
        outcome
    }

    /// Drop the entry with `remote_id`. Returns whether one was cached.
    pub(crate) fn remove_acknowledged(&mut self, remote_id: &str) -> bool {
        match position(&self.user_recipes, remote_id) {
            Some(pos) => {
                Arc::make_mut(&mut self.user_recipes).remove(pos);
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Viewed
    // -----------------------------------------------------------------------

    pub(crate) fn mark_viewed(&mut self, key: RecipeKey) -> bool {
        self.viewed.insert(key)
    }

    pub(crate) fn is_viewed(&self, key: &RecipeKey) -> bool {
        self.viewed.contains(key)
    }

    pub(crate) fn viewed(&self) -> Vec<RecipeKey> {
        self.viewed.iter().cloned().collect()
    }
}

fn position(list: &[Recipe], remote_id: &str) -> Option<usize> {
    list.iter()
        .position(|r| r.remote_id.as_deref() == Some(remote_id))
}

fn same_list(a: &[Recipe], b: &[Recipe]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_contents(y))
}

/// Decode one document. When the document carries no local id, the cached
/// recipe's local id is kept so re-delivery does not change identity.
fn decode(id: &str, document: &Document, cached: Option<&Recipe>) -> Result<Recipe, DecodeError> {
    let decoded = from_document(id, document)?;
    let mut recipe = decoded.recipe;
    if decoded.local_id_generated {
        if let Some(cached) = cached {
            recipe.local_id = cached.local_id;
        }
    }
    Ok(recipe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipebook_shared::codec::to_document;
    use recipebook_shared::Ingredient;
    use serde_json::Value;

    fn user_recipe(id: &str, title: &str) -> Recipe {
        Recipe::new(
            title,
            vec![Ingredient::new("Salt", "1 tsp")],
            vec!["Mix".to_string()],
            10,
        )
        .with_remote_id(id)
        .user_authored()
    }

    fn entry(recipe: &Recipe) -> (String, Document) {
        (
            recipe.remote_id.clone().unwrap(),
            to_document(recipe).unwrap(),
        )
    }

    fn titles(state: &StoreState) -> Vec<String> {
        state.user_recipes().iter().map(|r| r.title.clone()).collect()
    }

    #[test]
    fn test_snapshot_replaces_contents_in_order() {
        let mut state = StoreState::new(Vec::new());
        let a = user_recipe("a", "A");
        let b = user_recipe("b", "B");

        let outcome = state.apply_batch(ChangeBatch::snapshot(vec![entry(&b), entry(&a)]));
        assert!(outcome.changed);
        assert_eq!(titles(&state), vec!["B", "A"]);

        // A later snapshot without `a` drops it.
        let outcome = state.apply_batch(ChangeBatch::snapshot(vec![entry(&b)]));
        assert_eq!(outcome.removed, 1);
        assert_eq!(titles(&state), vec!["B"]);
    }

    #[test]
    fn test_redelivery_is_idempotent() {
        let mut state = StoreState::new(Vec::new());
        let batch = ChangeBatch::snapshot(vec![
            entry(&user_recipe("a", "A")),
            entry(&user_recipe("b", "B")),
        ]);

        state.apply_batch(batch.clone());
        let revision = state.revision();
        let before = state.user_recipes();

        let outcome = state.apply_batch(batch);
        assert!(!outcome.changed);
        assert_eq!(state.revision(), revision);
        assert!(Arc::ptr_eq(&before, &state.user_recipes()));
    }

    #[test]
    fn test_redelivery_without_local_id_keeps_identity() {
        let mut state = StoreState::new(Vec::new());
        let (id, mut doc) = entry(&user_recipe("a", "A"));
        doc.remove("localId");

        state.apply_batch(ChangeBatch::diff(vec![(id.clone(), doc.clone())], Vec::new()));
        let first = state.user_recipes()[0].local_id;
        let revision = state.revision();

        let outcome = state.apply_batch(ChangeBatch::diff(vec![(id, doc)], Vec::new()));
        assert!(!outcome.changed);
        assert_eq!(state.user_recipes()[0].local_id, first);
        assert_eq!(state.revision(), revision);
    }

    #[test]
    fn test_diff_removals_then_upserts() {
        let mut state = StoreState::new(Vec::new());
        let a = user_recipe("a", "A");
        let b = user_recipe("b", "B");
        state.apply_batch(ChangeBatch::snapshot(vec![entry(&a), entry(&b)]));

        let mut b2 = b.clone();
        b2.title = "B2".to_string();
        let c = user_recipe("c", "C");
        let d = user_recipe("d", "D");

        let outcome = state.apply_batch(ChangeBatch::diff(
            vec![entry(&c), entry(&b2), entry(&d)],
            vec!["a".to_string()],
        ));

        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.upserted, 3);
        assert_eq!(titles(&state), vec!["C", "D", "B2"]);
    }

    #[test]
    fn test_empty_diff_changes_nothing() {
        let mut state = StoreState::new(Vec::new());
        state.apply_batch(ChangeBatch::snapshot(vec![entry(&user_recipe("a", "A"))]));
        let revision = state.revision();

        let outcome = state.apply_batch(ChangeBatch::diff(Vec::new(), Vec::new()));
        assert_eq!(outcome, BatchOutcome::default());
        assert_eq!(state.revision(), revision);
        assert_eq!(titles(&state), vec!["A"]);
    }

    #[test]
    fn test_removal_of_unknown_id_is_noop() {
        let mut state = StoreState::new(Vec::new());
        state.apply_batch(ChangeBatch::snapshot(vec![entry(&user_recipe("a", "A"))]));
        let revision = state.revision();

        let outcome = state.apply_batch(ChangeBatch::diff(Vec::new(), vec!["abc".to_string()]));
        assert_eq!(outcome, BatchOutcome::default());
        assert_eq!(state.revision(), revision);
        assert_eq!(titles(&state), vec!["A"]);
    }

    #[test]
    fn test_malformed_document_is_skipped() {
        let mut state = StoreState::new(Vec::new());
        let good = user_recipe("good", "Good");
        let mut bad = Document::new();
        bad.insert("title".to_string(), Value::from(42));

        let outcome = state.apply_batch(ChangeBatch::snapshot(vec![
            ("bad".to_string(), bad.clone()),
            entry(&good),
        ]));
        assert_eq!(outcome.skipped, 1);
        assert_eq!(titles(&state), vec!["Good"]);

        // A malformed update leaves the cached version untouched.
        let outcome = state.apply_batch(ChangeBatch::diff(vec![("good".to_string(), bad)], Vec::new()));
        assert!(!outcome.changed);
        assert_eq!(titles(&state), vec!["Good"]);

        // In a snapshot the cached copy survives a malformed re-delivery.
        let mut broken = to_document(&good).unwrap();
        broken.remove("steps");
        state.apply_batch(ChangeBatch::snapshot(vec![("good".to_string(), broken)]));
        assert_eq!(titles(&state), vec!["Good"]);
    }

    #[test]
    fn test_acknowledged_insert_and_replace() {
        let mut state = StoreState::new(Vec::new());
        let a = user_recipe("a", "A");
        let b = user_recipe("b", "B");

        assert_eq!(state.insert_acknowledged(a.clone()), AckOutcome::Inserted);
        assert_eq!(state.insert_acknowledged(b.clone()), AckOutcome::Inserted);
        assert_eq!(titles(&state), vec!["B", "A"]);

        // Same id delivered already: replace in place, no duplicate.
        assert_eq!(state.insert_acknowledged(b.clone()), AckOutcome::Unchanged);
        let mut a2 = a.clone();
        a2.title = "A2".to_string();
        assert_eq!(state.replace_acknowledged(a2), AckOutcome::Replaced);
        assert_eq!(titles(&state), vec!["B", "A2"]);

        assert_eq!(
            state.replace_acknowledged(user_recipe("c", "C")),
            AckOutcome::Inserted
        );
        assert_eq!(titles(&state), vec!["B", "A2", "C"]);
    }

    #[test]
    fn test_remove_acknowledged_removes_exactly_one() {
        let mut state = StoreState::new(Vec::new());
        state.insert_acknowledged(user_recipe("a", "A"));
        state.insert_acknowledged(user_recipe("b", "B"));

        assert!(state.remove_acknowledged("a"));
        assert!(!state.remove_acknowledged("a"));
        assert_eq!(titles(&state), vec!["B"]);
    }

    #[test]
    fn test_all_recipes_shadows_seed_by_remote_id() {
        let seed = user_recipe("shared", "Seed").with_seed_id("popular_1");
        let plain_seed = Recipe::new("Plain", vec![], vec![], 5).with_seed_id("popular_2");
        let mut state = StoreState::new(vec![seed, plain_seed]);
        state.insert_acknowledged(user_recipe("shared", "User"));

        let all: Vec<String> = state.all_recipes().into_iter().map(|r| r.title).collect();
        assert_eq!(all, vec!["User", "Plain"]);
    }
}
