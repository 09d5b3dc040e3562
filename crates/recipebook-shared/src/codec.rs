//! Conversion between [`Recipe`] values and remote documents.
//!
//! A document is a flat JSON object whose keys follow the serde
//! representation of [`Recipe`]. The document key supplied by the remote
//! store is authoritative for the remote id.

use serde_json::{Map, Value};

use crate::constants::{FIELD_ID, FIELD_LOCAL_ID};
use crate::error::DecodeError;
use crate::types::Recipe;

/// A recipe decoded from a remote document.
#[derive(Debug, Clone)]
pub struct DecodedRecipe {
    pub recipe: Recipe,
    /// `true` when the document carried no `localId` and a fresh one was
    /// generated during decoding.
    pub local_id_generated: bool,
}

/// Encode a recipe into its document form.
pub fn to_document(recipe: &Recipe) -> Result<Map<String, Value>, DecodeError> {
    match serde_json::to_value(recipe)? {
        Value::Object(map) => Ok(map),
        _ => Err(DecodeError::NotAnObject),
    }
}

/// Decode the document stored under `id`.
pub fn from_document(id: &str, document: &Map<String, Value>) -> Result<DecodedRecipe, DecodeError> {
    let local_id_generated = !document.contains_key(FIELD_LOCAL_ID);

    // The body id is ignored, whatever its type.
    let mut body = document.clone();
    body.remove(FIELD_ID);
    let mut recipe: Recipe = serde_json::from_value(Value::Object(body))?;
    recipe.remote_id = Some(id.to_string());

    Ok(DecodedRecipe {
        recipe,
        local_id_generated,
    })
}

/// Serde adapter carrying an optional photo as a standard base64 string.
pub mod photo_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(photo: &Option<Bytes>, serializer: S) -> Result<S::Ok, S::Error> {
        match photo {
            Some(data) => serializer.serialize_str(&STANDARD.encode(data)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Bytes>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        match encoded {
            Some(s) => STANDARD
                .decode(s.trim())
                .map(|data| Some(Bytes::from(data)))
                .map_err(|e| serde::de::Error::custom(format!("invalid imageBase64: {e}"))),
            None => Ok(None),
        }
    }
}
