/// The recipe store contract shared by both backends
///
/// The local shelf and the shared catalog implement the same small
/// capability set (list / add / remove) so the rest of the app talks
/// to `dyn RecipeStore` and never cares which backend is active.

use chrono::{SecondsFormat, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

use super::data::{Identity, Recipe, RecipeDraft};

/// Everything that can go wrong inside a store operation
///
/// The variants are `Clone` so results can travel inside UI messages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The draft name was empty after trimming
    #[error("recipe name must not be empty")]
    EmptyName,
    /// The image's original file size exceeds the backend ceiling
    #[error("image is too large ({size} bytes, limit is {limit})")]
    ImageTooLarge { size: usize, limit: usize },
    /// A write needed a signed-in identity, or the actor does not
    /// own the record it tried to delete
    #[error("you are not allowed to do that (sign in or check ownership)")]
    Unauthorized,
    /// No record with this id exists in the store
    #[error("no recipe with id {0}")]
    NotFound(String),
    /// The backing medium could not be read or written
    #[error("recipe store unavailable: {0}")]
    Unavailable(String),
}

/// Common contract for the two persistence backends.
///
/// All methods are synchronous and blocking; callers on the UI thread
/// run them through `tokio::task::spawn_blocking`.
pub trait RecipeStore: Send + Sync {
    /// Short human-readable backend name for status lines
    fn label(&self) -> &'static str;

    /// Image size ceiling in bytes, measured on the original file
    fn image_limit(&self) -> usize;

    /// Whether writes require a signed-in identity
    fn requires_identity(&self) -> bool;

    /// Return the full snapshot, newest first.
    ///
    /// An empty or absent backing medium is an empty store, not an
    /// error; a corrupt or unreadable one is `Unavailable`.
    fn list_all(&self) -> Result<Vec<Recipe>, StoreError>;

    /// Validate and persist a draft, returning the stored record with
    /// its assigned id and creation timestamp. The caller is expected
    /// to prepend the returned record to its in-memory mirror.
    fn add(&self, draft: RecipeDraft, actor: Option<&Identity>) -> Result<Recipe, StoreError>;

    /// Permanently delete a record by id. No soft-delete, no undo.
    fn remove(&self, id: &str, actor: Option<&Identity>) -> Result<(), StoreError>;

    /// UX shortcut: whether the delete button should be shown at all.
    ///
    /// The real authority is the ownership check inside `remove`;
    /// identity state can be stale, so callers must still treat a
    /// store-level rejection as final.
    fn can_delete(&self, recipe: &Recipe, actor: Option<&Identity>) -> bool {
        if !self.requires_identity() {
            return true;
        }
        match (actor, recipe.owner_uid.as_deref()) {
            (Some(actor), Some(owner)) => actor.uid == owner,
            _ => false,
        }
    }
}

/// Check the draft invariants shared by both backends:
/// non-empty trimmed name, image within the backend ceiling.
pub fn validate_draft(draft: &RecipeDraft, image_limit: usize) -> Result<(), StoreError> {
    if draft.name.trim().is_empty() {
        return Err(StoreError::EmptyName);
    }
    if let Some(image) = &draft.image {
        if image.source_len > image_limit {
            return Err(StoreError::ImageTooLarge {
                size: image.source_len,
                limit: image_limit,
            });
        }
    }
    Ok(())
}

// Process-wide sequence folded into generated ids so two records created
// in the same millisecond still get distinct ids.
static ID_SEQ: AtomicU64 = AtomicU64::new(0);

/// Generate a store id: millisecond timestamp plus a unique hex suffix.
pub fn new_entry_id() -> String {
    let seq = ID_SEQ.fetch_add(1, Ordering::Relaxed);
    let now = Utc::now();
    format!(
        "{}_{:08x}{:04x}",
        now.timestamp_millis(),
        now.timestamp_subsec_nanos(),
        seq & 0xffff
    )
}

/// RFC 3339 UTC timestamp with milliseconds, e.g. "2026-08-25T10:15:30.123Z"
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Turn a validated draft into a full record.
///
/// Trims the text fields, stamps the creation time and a fresh
/// correlation id, and records the actor as owner when one is present.
/// The canonical `id` is left for the backend to issue.
pub fn materialize(draft: RecipeDraft, actor: Option<&Identity>) -> Recipe {
    Recipe {
        id: String::new(),
        local_id: new_entry_id(),
        owner_uid: actor.map(|a| a.uid.clone()),
        owner_name: actor.map(|a| a.display_name.clone()),
        name: draft.name.trim().to_string(),
        base: draft.base.trim().to_string(),
        ingredients: draft.ingredients.trim().to_string(),
        steps: draft.steps.trim().to_string(),
        image_data: draft.image.map(|i| i.data_url).unwrap_or_default(),
        created_at: now_timestamp(),
    }
}
