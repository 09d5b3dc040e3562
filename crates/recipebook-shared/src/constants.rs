/// Wire field: remote document id
pub const FIELD_ID: &str = "id";

/// Wire field: process-local identity
pub const FIELD_LOCAL_ID: &str = "localId";

/// Wire field used to filter user-authored recipes remotely
pub const FIELD_IS_USER_RECIPE: &str = "isUserRecipe";

/// Wire field used to order the remote subscription
pub const FIELD_CREATED_AT: &str = "createdAt";

/// Wire field carrying the base64-encoded photo
pub const FIELD_IMAGE_BASE64: &str = "imageBase64";

/// Category filter label matching every recipe
pub const CATEGORY_ALL: &str = "all";

/// Category filter label matching user-authored recipes
pub const CATEGORY_MINE: &str = "mine";

/// JPEG quality used when compressing captured photos (0-100)
pub const PHOTO_JPEG_QUALITY: u8 = 40;

/// Unit suffixes stripped from a free-text cooking time before parsing
pub const COOKING_TIME_UNITS: [&str; 2] = ["мин", "min"];
