/// Local shelf backend
///
/// Persists the whole collection as one JSON array in a single file
/// under the user's data directory. Every mutation is a
/// read-modify-write of the entire collection; the write goes to a
/// temp file first and is renamed into place so a failed write cannot
/// corrupt the existing shelf. There is no ownership concept here:
/// anyone with access to the shelf may delete any record.

use std::fs;
use std::path::PathBuf;

use super::data::{Identity, Recipe, RecipeDraft};
use super::store::{self, RecipeStore, StoreError};

/// Image ceiling for the local shelf (original file bytes)
pub const LOCAL_IMAGE_LIMIT: usize = 1024 * 1024;

/// File-backed recipe shelf
pub struct LocalStore {
    file_path: PathBuf,
}

impl LocalStore {
    /// Shelf at the default location:
    /// - Linux: ~/.local/share/cocktail-book/recipes.json
    /// - macOS: ~/Library/Application Support/cocktail-book/recipes.json
    /// - Windows: %APPDATA%\cocktail-book\recipes.json
    pub fn new() -> Self {
        Self::at(Self::default_file_path())
    }

    /// Shelf backed by an explicit file (used by tests)
    pub fn at(file_path: PathBuf) -> Self {
        LocalStore { file_path }
    }

    fn default_file_path() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("cocktail-book");
        path.push("recipes.json");
        path
    }

    /// Read the whole shelf. A missing file is an empty shelf;
    /// an unreadable or corrupt one is `Unavailable`.
    fn load(&self) -> Result<Vec<Recipe>, StoreError> {
        if !self.file_path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.file_path)
            .map_err(|e| StoreError::Unavailable(format!("cannot read shelf file: {e}")))?;
        serde_json::from_str(&raw)
            .map_err(|e| StoreError::Unavailable(format!("shelf file is corrupt: {e}")))
    }

    /// Write the whole shelf atomically (temp file + rename)
    fn persist(&self, recipes: &[Recipe]) -> Result<(), StoreError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("cannot create data dir: {e}")))?;
        }
        let json = serde_json::to_string_pretty(recipes)
            .map_err(|e| StoreError::Unavailable(format!("cannot serialize shelf: {e}")))?;
        let tmp_path = self.file_path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .map_err(|e| StoreError::Unavailable(format!("cannot write shelf file: {e}")))?;
        fs::rename(&tmp_path, &self.file_path)
            .map_err(|e| StoreError::Unavailable(format!("cannot replace shelf file: {e}")))
    }
}

impl RecipeStore for LocalStore {
    fn label(&self) -> &'static str {
        "local shelf"
    }

    fn image_limit(&self) -> usize {
        LOCAL_IMAGE_LIMIT
    }

    fn requires_identity(&self) -> bool {
        false
    }

    fn list_all(&self) -> Result<Vec<Recipe>, StoreError> {
        let mut recipes = self.load()?;
        // The file is kept newest-first already; the stable sort only
        // matters when the shelf was edited by hand.
        recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recipes)
    }

    fn add(&self, draft: RecipeDraft, _actor: Option<&Identity>) -> Result<Recipe, StoreError> {
        store::validate_draft(&draft, self.image_limit())?;
        let mut recipes = self.load()?;
        let mut recipe = store::materialize(draft, None);
        recipe.id = store::new_entry_id();
        recipes.insert(0, recipe.clone());
        self.persist(&recipes)?;
        Ok(recipe)
    }

    fn remove(&self, id: &str, _actor: Option<&Identity>) -> Result<(), StoreError> {
        let mut recipes = self.load()?;
        let before = recipes.len();
        recipes.retain(|r| r.id != id);
        if recipes.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.persist(&recipes)
    }
}
