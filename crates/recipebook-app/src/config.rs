//! Application configuration loaded from environment variables.
//!
//! Every setting is optional; an empty environment shows the full catalog
//! sorted by popularity.

use std::path::PathBuf;

use recipebook_store::config::parse_positive;
use recipebook_store::{CategoryFilter, RecipeQuery, StoreConfig};

const DEFAULT_FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Remote timeout and event capacity.
    pub store: StoreConfig,

    /// Buffered change batches per subscription on the in-process
    /// document store.
    /// Env: `RECIPEBOOK_FEED_CAPACITY`
    /// Default: `256`
    pub feed_capacity: usize,

    /// Category to list: `all`, `mine` or a category label.
    /// Env: `RECIPEBOOK_CATEGORY`
    /// Default: `all`
    pub category: CategoryFilter,

    /// Text searched in titles and ingredient names.
    /// Env: `RECIPEBOOK_SEARCH`
    pub search_text: String,

    /// Maximum cooking time in minutes, free text.
    /// Env: `RECIPEBOOK_MAX_TIME`
    pub max_cooking_time: String,

    /// Image attached to the sample recipe after JPEG compression.
    /// Env: `RECIPEBOOK_PHOTO`
    pub photo_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            feed_capacity: DEFAULT_FEED_CAPACITY,
            category: CategoryFilter::default(),
            search_text: String::new(),
            max_cooking_time: String::new(),
            photo_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self {
            store: StoreConfig::from_lookup(&lookup),
            ..Self::default()
        };

        if let Some(val) = lookup("RECIPEBOOK_FEED_CAPACITY") {
            match parse_positive(&val) {
                Some(n) => config.feed_capacity = n,
                None => tracing::warn!(
                    value = %val,
                    "Invalid RECIPEBOOK_FEED_CAPACITY, using default"
                ),
            }
        }

        if let Some(val) = lookup("RECIPEBOOK_CATEGORY") {
            if val.trim().is_empty() {
                tracing::warn!("Empty RECIPEBOOK_CATEGORY, showing all recipes");
            } else {
                config.category = CategoryFilter::parse(val.trim());
            }
        }

        if let Some(val) = lookup("RECIPEBOOK_SEARCH") {
            config.search_text = val;
        }

        if let Some(val) = lookup("RECIPEBOOK_MAX_TIME") {
            config.max_cooking_time = val;
        }

        if let Some(path) = lookup("RECIPEBOOK_PHOTO") {
            if !path.is_empty() {
                config.photo_path = Some(PathBuf::from(path));
            }
        }

        config
    }

    pub fn query(&self) -> RecipeQuery {
        RecipeQuery {
            category: self.category.clone(),
            search_text: self.search_text.clone(),
            max_cooking_time: self.max_cooking_time.clone(),
        }
    }
}
