//! # recipebook-shared
//!
//! Types shared by every Recipebook crate: the recipe model and its wire
//! codec, draft validation, error types, constants and the photo-capture
//! collaborator.

pub mod codec;
pub mod constants;
pub mod error;
pub mod photo;
pub mod types;

pub use error::{DecodeError, PhotoError, ValidationError};
pub use types::{Ingredient, LocalId, Recipe, RecipeDraft, RecipeKey};
