/// Shared catalog backend
///
/// A multi-user SQLite catalog of recipes. Records carry the identity
/// that created them, and only that identity may delete them. The
/// ownership check in `remove` is the authoritative one: the UI hides
/// delete buttons as a courtesy, but identity state can be stale, so a
/// rejection from this layer is final no matter what the UI concluded.
///
/// Every operation opens its own connection from the stored path and
/// ensures the schema idempotently, so the store can be handed to
/// background tasks freely.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;

use super::data::{Identity, Recipe, RecipeDraft};
use super::store::{self, RecipeStore, StoreError};

/// Image ceiling for the shared catalog (original file bytes).
/// Tighter than the local shelf because every reader downloads
/// the inline payload.
pub const CATALOG_IMAGE_LIMIT: usize = 700 * 1024;

/// SQLite-backed shared recipe catalog
pub struct CatalogStore {
    db_path: PathBuf,
}

impl CatalogStore {
    /// Catalog at the default location:
    /// - Linux: ~/.local/share/cocktail-book/catalog.db
    /// - macOS: ~/Library/Application Support/cocktail-book/catalog.db
    /// - Windows: %APPDATA%\cocktail-book\catalog.db
    pub fn new() -> Self {
        Self::at(Self::default_db_path())
    }

    /// Catalog backed by an explicit database file (used by tests)
    pub fn at(db_path: PathBuf) -> Self {
        CatalogStore { db_path }
    }

    fn default_db_path() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("cocktail-book");
        path.push("catalog.db");
        path
    }

    /// Open a connection and make sure the schema exists
    fn open(&self) -> Result<Connection, StoreError> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("cannot create data dir: {e}")))?;
        }
        let conn = Connection::open(&self.db_path)
            .map_err(|e| StoreError::Unavailable(format!("cannot open catalog: {e}")))?;
        Self::ensure_schema(&conn)?;
        Ok(conn)
    }

    fn ensure_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS recipes (
                id          TEXT PRIMARY KEY,
                local_id    TEXT NOT NULL DEFAULT '',
                owner_uid   TEXT NOT NULL,
                owner_name  TEXT,
                name        TEXT NOT NULL,
                base        TEXT NOT NULL DEFAULT '',
                ingredients TEXT NOT NULL DEFAULT '',
                steps       TEXT NOT NULL DEFAULT '',
                image_data  TEXT NOT NULL DEFAULT '',
                created_at  TEXT NOT NULL
            )",
            [],
        )
        .map_err(unavailable)?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_recipes_created_at
             ON recipes(created_at DESC)",
            [],
        )
        .map_err(unavailable)?;

        Ok(())
    }
}

fn unavailable(e: rusqlite::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

impl RecipeStore for CatalogStore {
    fn label(&self) -> &'static str {
        "shared catalog"
    }

    fn image_limit(&self) -> usize {
        CATALOG_IMAGE_LIMIT
    }

    fn requires_identity(&self) -> bool {
        true
    }

    fn list_all(&self) -> Result<Vec<Recipe>, StoreError> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, local_id, owner_uid, owner_name, name, base,
                        ingredients, steps, image_data, created_at
                 FROM recipes
                 ORDER BY created_at DESC, rowid DESC",
            )
            .map_err(unavailable)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(Recipe {
                    id: row.get(0)?,
                    local_id: row.get(1)?,
                    owner_uid: row.get(2)?,
                    owner_name: row.get(3)?,
                    name: row.get(4)?,
                    base: row.get(5)?,
                    ingredients: row.get(6)?,
                    steps: row.get(7)?,
                    image_data: row.get(8)?,
                    created_at: row.get(9)?,
                })
            })
            .map_err(unavailable)?;

        let mut recipes = Vec::new();
        for row in rows {
            recipes.push(row.map_err(unavailable)?);
        }
        Ok(recipes)
    }

    fn add(&self, draft: RecipeDraft, actor: Option<&Identity>) -> Result<Recipe, StoreError> {
        let actor = actor.ok_or(StoreError::Unauthorized)?;
        store::validate_draft(&draft, self.image_limit())?;

        let conn = self.open()?;
        let mut recipe = store::materialize(draft, Some(actor));
        recipe.id = store::new_entry_id();

        conn.execute(
            "INSERT INTO recipes (id, local_id, owner_uid, owner_name, name, base,
                                  ingredients, steps, image_data, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                recipe.id,
                recipe.local_id,
                recipe.owner_uid,
                recipe.owner_name,
                recipe.name,
                recipe.base,
                recipe.ingredients,
                recipe.steps,
                recipe.image_data,
                recipe.created_at,
            ],
        )
        .map_err(unavailable)?;

        Ok(recipe)
    }

    fn remove(&self, id: &str, actor: Option<&Identity>) -> Result<(), StoreError> {
        let actor = actor.ok_or(StoreError::Unauthorized)?;
        let conn = self.open()?;

        let owner: Option<String> = conn
            .query_row(
                "SELECT owner_uid FROM recipes WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(unavailable)?;

        match owner {
            None => return Err(StoreError::NotFound(id.to_string())),
            Some(owner) if owner != actor.uid => return Err(StoreError::Unauthorized),
            Some(_) => {}
        }

        let deleted = conn
            .execute("DELETE FROM recipes WHERE id = ?1", params![id])
            .map_err(unavailable)?;
        if deleted == 0 {
            // Someone else removed it between the check and the delete.
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::InlineImage;
    use tempfile::tempdir;

    fn ada() -> Identity {
        Identity {
            uid: "uid-ada".into(),
            display_name: "Ada".into(),
        }
    }

    fn bob() -> Identity {
        Identity {
            uid: "uid-bob".into(),
            display_name: "Bob".into(),
        }
    }

    fn draft(name: &str, base: &str) -> RecipeDraft {
        RecipeDraft {
            name: name.to_string(),
            base: base.to_string(),
            ingredients: "ice".to_string(),
            steps: "stir".to_string(),
            image: None,
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> CatalogStore {
        CatalogStore::at(dir.path().join("catalog.db"))
    }

    #[test]
    fn test_add_requires_a_signed_in_identity() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        assert_eq!(
            store.add(draft("Mojito", "Rum"), None),
            Err(StoreError::Unauthorized)
        );
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_add_records_the_actor_as_owner() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        let added = store.add(draft("Mojito", "Rum"), Some(&ada())).unwrap();
        assert_eq!(added.owner_uid.as_deref(), Some("uid-ada"));
        assert_eq!(added.owner_name.as_deref(), Some("Ada"));

        let listed = store.list_all().unwrap();
        assert_eq!(listed, vec![added]);
    }

    #[test]
    fn test_list_is_newest_first() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store.add(draft("Mojito", "Rum"), Some(&ada())).unwrap();
        store.add(draft("Negroni", "Gin"), Some(&bob())).unwrap();
        store.add(draft("Daiquiri", "Rum"), Some(&ada())).unwrap();

        let names: Vec<String> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, ["Daiquiri", "Negroni", "Mojito"]);
    }

    #[test]
    fn test_only_the_owner_may_remove() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        let recipe = store.add(draft("Mojito", "Rum"), Some(&ada())).unwrap();

        assert_eq!(
            store.remove(&recipe.id, Some(&bob())),
            Err(StoreError::Unauthorized)
        );
        assert_eq!(store.remove(&recipe.id, None), Err(StoreError::Unauthorized));
        assert_eq!(store.list_all().unwrap().len(), 1, "record survives");

        store.remove(&recipe.id, Some(&ada())).unwrap();
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_remove_unknown_id_is_not_found() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        assert_eq!(
            store.remove("nope", Some(&ada())),
            Err(StoreError::NotFound("nope".into()))
        );
    }

    #[test]
    fn test_remove_twice_is_not_found_second_time() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        let recipe = store.add(draft("Mojito", "Rum"), Some(&ada())).unwrap();

        store.remove(&recipe.id, Some(&ada())).unwrap();
        assert_eq!(
            store.remove(&recipe.id, Some(&ada())),
            Err(StoreError::NotFound(recipe.id.clone()))
        );
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_empty_name_is_rejected_before_touching_the_catalog() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        assert_eq!(
            store.add(draft("  ", "Rum"), Some(&ada())),
            Err(StoreError::EmptyName)
        );
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_oversized_image_persists_nothing() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        let mut d = draft("Zombie", "Rum");
        d.image = Some(InlineImage {
            data_url: "data:image/png;base64,AAAA".to_string(),
            source_len: CATALOG_IMAGE_LIMIT + 1,
        });

        let err = store.add(d, Some(&ada())).unwrap_err();
        assert_eq!(
            err,
            StoreError::ImageTooLarge {
                size: CATALOG_IMAGE_LIMIT + 1,
                limit: CATALOG_IMAGE_LIMIT
            }
        );
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_delete_button_visibility_follows_ownership() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        let recipe = store.add(draft("Mojito", "Rum"), Some(&ada())).unwrap();

        assert!(store.can_delete(&recipe, Some(&ada())));
        assert!(!store.can_delete(&recipe, Some(&bob())));
        assert!(!store.can_delete(&recipe, None));
    }

    #[test]
    fn test_corrupt_database_is_unavailable_not_a_panic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        std::fs::write(&path, "definitely not sqlite").unwrap();

        let err = CatalogStore::at(path).list_all().unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
