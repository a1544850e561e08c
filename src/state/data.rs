/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the store layer and the UI layer. The serialized field names
/// are camelCase so the local shelf file stays human-readable
/// and matches the record layout the app has always used.

use serde::{Deserialize, Serialize};

/// A persisted cocktail recipe
///
/// Records are append/delete only. The id and creation timestamp are
/// assigned by the store when a draft is saved; everything else comes
/// from user input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Store-issued identifier, unique within one store
    pub id: String,
    /// Client-side correlation id, kept for debugging only
    #[serde(default)]
    pub local_id: String,
    /// Owner identity, set at creation under the shared catalog.
    /// The local shelf leaves it empty and ignores it.
    #[serde(default)]
    pub owner_uid: Option<String>,
    /// Display name of the owner, optional
    #[serde(default)]
    pub owner_name: Option<String>,
    /// Recipe name (required, non-empty after trimming)
    pub name: String,
    /// Base spirit, may be empty (e.g. "Rum", "Gin")
    #[serde(default)]
    pub base: String,
    /// Ingredients as free text
    #[serde(default)]
    pub ingredients: String,
    /// Preparation steps as free text
    #[serde(default)]
    pub steps: String,
    /// Inline-encoded image (data URL) or empty string
    #[serde(default)]
    pub image_data: String,
    /// Creation timestamp, RFC 3339 UTC with milliseconds.
    /// The fixed format makes lexicographic order equal time order.
    pub created_at: String,
}

/// User-submitted recipe data before the store assigns an id
/// and a creation timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeDraft {
    pub name: String,
    pub base: String,
    pub ingredients: String,
    pub steps: String,
    /// Encoded image picked for this draft, if any
    pub image: Option<InlineImage>,
}

/// An image encoded as an inline data URL
///
/// `source_len` is the byte length of the original file. Size ceilings
/// are enforced against the original bytes, never the encoded string.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub data_url: String,
    pub source_len: usize,
}

/// A signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Stable user id, generated once per machine profile
    pub uid: String,
    /// Name shown in the header and stored on owned recipes
    pub display_name: String,
}
