//! # recipebook
//!
//! Command-line shell around the recipe store.
//!
//! Runs the store against the in-process document store, opens the user
//! recipe subscription, saves a sample recipe and prints the home feed
//! followed by the result of the configured filter query.

mod config;

use std::sync::Arc;

use recipebook_shared::photo::{JpegPhotoEncoder, PhotoEncoder};
use recipebook_shared::{Ingredient, RecipeDraft};
use recipebook_store::query::home_feed;
use recipebook_store::{MemoryDocumentStore, RecipeStore, StoreEvent};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,recipebook_store=debug")),
        )
        .init();

    info!("Starting Recipebook v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = AppConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Build the store and subscribe
    // -----------------------------------------------------------------------
    let remote = Arc::new(MemoryDocumentStore::with_feed_capacity(
        config.feed_capacity,
    ));
    let store = RecipeStore::new(remote, config.store.clone());

    let mut events = store.events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let StoreEvent::Synced { revision, outcome } = event {
                info!(
                    revision,
                    upserted = outcome.upserted,
                    removed = outcome.removed,
                    skipped = outcome.skipped,
                    "Recipes synced"
                );
            }
        }
    });

    store.subscribe().await?;

    // -----------------------------------------------------------------------
    // 4. Save a sample recipe
    // -----------------------------------------------------------------------
    let photo = match &config.photo_path {
        Some(path) => {
            let raw = tokio::fs::read(path).await?;
            let encoded = JpegPhotoEncoder::default().encode(&raw);
            if encoded.is_none() {
                warn!(path = %path.display(), "Photo is not a readable image, skipping");
            }
            encoded
        }
        None => None,
    };

    let draft = RecipeDraft {
        title: "Weeknight fried rice".to_string(),
        ingredients: vec![
            Ingredient::new("Cooked rice", "300 g"),
            Ingredient::new("Eggs", "2 pcs"),
            Ingredient::new("Spring onion", "2 stalks"),
            Ingredient::new("Soy sauce", "2 tbsp"),
        ],
        steps: vec![
            "Scramble the eggs in a hot wok and set aside.".to_string(),
            "Fry the rice until it starts to crisp.".to_string(),
            "Return the eggs, add soy sauce and spring onion.".to_string(),
        ],
        cooking_time: "15 min".to_string(),
        category: None,
        photo,
    };

    let saved = store.add(draft).await?;
    store.mark_viewed(&saved).await;

    // -----------------------------------------------------------------------
    // 5. Print the home feed and the query result
    // -----------------------------------------------------------------------
    let snapshot = store.snapshot().await;
    let feed = home_feed(&snapshot.user_recipes, &snapshot.seed_recipes);

    for recipe in &feed.user_recipes {
        info!(
            title = %recipe.title,
            minutes = recipe.cooking_time_minutes,
            has_photo = recipe.photo.is_some(),
            "My recipe"
        );
    }
    for (category, recipes) in &feed.sections {
        let titles: Vec<&str> = recipes.iter().map(|r| r.title.as_str()).collect();
        info!(%category, ?titles, "Section");
    }

    let results = config.query().apply(store.all_recipes().await);
    info!(count = results.len(), "Query results");
    for recipe in &results {
        info!(
            title = %recipe.title,
            views = recipe.view_count,
            minutes = recipe.cooking_time_minutes,
            "Match"
        );
    }

    store.unsubscribe().await;
    Ok(())
}
