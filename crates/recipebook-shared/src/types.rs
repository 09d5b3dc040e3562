use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::COOKING_TIME_UNITS;
use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Process-local identity assigned when a recipe value is constructed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct LocalId(pub Uuid);

impl LocalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LocalId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LocalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Full identity of a recipe: remote id (if persisted) plus local id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecipeKey {
    pub remote_id: Option<String>,
    pub local_id: LocalId,
}

// ---------------------------------------------------------------------------
// Ingredient
// ---------------------------------------------------------------------------

/// One line of a recipe's ingredient list. Owned by its recipe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ingredient {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    /// Free text, e.g. "200 g" or "to taste".
    pub quantity: String,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            quantity: quantity.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Recipe
// ---------------------------------------------------------------------------

/// A recipe, either from the seed catalog or authored by the user.
///
/// Equality and hashing consider only the identity pair
/// (`remote_id`, `local_id`). Use [`Recipe::same_contents`] to compare the
/// full value.
///
/// The serde representation is the remote document shape: camelCase keys,
/// the remote id under `id`, and the photo as a base64 string under
/// `imageBase64` that is left out entirely when there is no photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Document id assigned by the remote store. `None` for seed recipes
    /// and unacknowledged drafts.
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    #[serde(default)]
    pub local_id: LocalId,
    /// `{prefix}_{n}` for seed recipes, used only for catalog ordering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_id: Option<String>,
    pub title: String,
    pub ingredients: Vec<Ingredient>,
    /// Preparation steps, in order.
    pub steps: Vec<String>,
    #[serde(rename = "cookingTime")]
    pub cooking_time_minutes: u32,
    #[serde(rename = "views")]
    pub view_count: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "isUserRecipe")]
    pub is_user_authored: bool,
    #[serde(
        rename = "imageBase64",
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::codec::photo_base64"
    )]
    pub photo: Option<Bytes>,
}

impl Recipe {
    /// Create a recipe with a fresh local id, no remote id, zero views and
    /// `created_at = now`.
    pub fn new(
        title: impl Into<String>,
        ingredients: Vec<Ingredient>,
        steps: Vec<String>,
        cooking_time_minutes: u32,
    ) -> Self {
        Self {
            remote_id: None,
            local_id: LocalId::new(),
            seed_id: None,
            title: title.into(),
            ingredients,
            steps,
            cooking_time_minutes,
            view_count: 0,
            created_at: Utc::now(),
            category: None,
            is_user_authored: false,
            photo: None,
        }
    }

    pub fn with_views(mut self, view_count: u32) -> Self {
        self.view_count = view_count;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_seed_id(mut self, seed_id: impl Into<String>) -> Self {
        self.seed_id = Some(seed_id.into());
        self
    }

    pub fn with_remote_id(mut self, remote_id: impl Into<String>) -> Self {
        self.remote_id = Some(remote_id.into());
        self
    }

    pub fn with_photo(mut self, photo: Bytes) -> Self {
        self.photo = Some(photo);
        self
    }

    pub fn user_authored(mut self) -> Self {
        self.is_user_authored = true;
        self
    }

    pub fn key(&self) -> RecipeKey {
        RecipeKey {
            remote_id: self.remote_id.clone(),
            local_id: self.local_id,
        }
    }

    /// Field-by-field comparison, identity included.
    pub fn same_contents(&self, other: &Recipe) -> bool {
        self.remote_id == other.remote_id
            && self.local_id == other.local_id
            && self.seed_id == other.seed_id
            && self.title == other.title
            && self.ingredients == other.ingredients
            && self.steps == other.steps
            && self.cooking_time_minutes == other.cooking_time_minutes
            && self.view_count == other.view_count
            && self.created_at == other.created_at
            && self.category == other.category
            && self.is_user_authored == other.is_user_authored
            && self.photo == other.photo
    }

    /// Shape checks shared by the authoring and editing forms.
    pub fn validate_shape(&self) -> Result<(), ValidationError> {
        check_shape(&self.title, &self.ingredients, &self.steps)
    }
}

impl PartialEq for Recipe {
    fn eq(&self, other: &Self) -> bool {
        self.remote_id == other.remote_id && self.local_id == other.local_id
    }
}

impl Eq for Recipe {}

impl std::hash::Hash for Recipe {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.remote_id.hash(state);
        self.local_id.hash(state);
    }
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// User input for a new recipe, as collected by the authoring form.
#[derive(Debug, Clone, Default)]
pub struct RecipeDraft {
    pub title: String,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<String>,
    /// Free text, e.g. "25", "25 min".
    pub cooking_time: String,
    pub category: Option<String>,
    pub photo: Option<Bytes>,
}

impl RecipeDraft {
    /// Check the draft and build an unsaved, user-authored recipe from it.
    pub fn validate(&self) -> Result<Recipe, ValidationError> {
        check_shape(&self.title, &self.ingredients, &self.steps)?;
        let minutes = parse_cooking_time(&self.cooking_time)?;

        let mut recipe = Recipe::new(
            self.title.clone(),
            self.ingredients.clone(),
            self.steps.clone(),
            minutes,
        )
        .user_authored();
        recipe.category = self.category.clone();
        recipe.photo = self.photo.clone();
        Ok(recipe)
    }
}

/// Parse a free-text cooking time in minutes.
///
/// Surrounding whitespace, a unit suffix and inner spaces are ignored, so
/// `" 1 20 мин "` parses as 120.
pub fn parse_cooking_time(input: &str) -> Result<u32, ValidationError> {
    let mut cleaned = input.trim().to_string();
    for unit in COOKING_TIME_UNITS {
        cleaned = cleaned.replace(unit, "");
    }
    cleaned.retain(|c| !c.is_whitespace());

    cleaned
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidCookingTime(input.to_string()))
}

fn check_shape(
    title: &str,
    ingredients: &[Ingredient],
    steps: &[String],
) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if ingredients.is_empty() {
        return Err(ValidationError::NoIngredients);
    }
    if steps.is_empty() {
        return Err(ValidationError::NoSteps);
    }
    Ok(())
}
