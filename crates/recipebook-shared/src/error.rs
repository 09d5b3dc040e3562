use thiserror::Error;

/// A draft or edited recipe failed basic shape checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Recipe title must not be empty")]
    EmptyTitle,

    #[error("Recipe must have at least one ingredient")]
    NoIngredients,

    #[error("Recipe must have at least one step")]
    NoSteps,

    #[error("Invalid cooking time: {0:?}")]
    InvalidCookingTime(String),
}

/// A single remote document could not be turned into a recipe.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Encoded recipe is not a JSON object")]
    NotAnObject,
}

#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Empty image data")]
    Empty,
}
