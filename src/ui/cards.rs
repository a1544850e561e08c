/// Render-ready view models for the recipe list
///
/// The controller hands the presentation layer a list of `RecipeCard`
/// values instead of raw records: labels already carry their
/// placeholders, the creation time is formatted, the image payload is
/// decoded, and the delete permission is precomputed. The widgets only
/// have to lay things out.

use chrono::{DateTime, Local};

use crate::codec;
use crate::state::data::{Identity, Recipe};

/// One recipe, ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeCard {
    pub id: String,
    pub name: String,
    /// "Base spirit: Rum" or the "(not provided)" placeholder
    pub base_label: String,
    /// Free text with a "(none)" placeholder when empty
    pub ingredients: String,
    /// Free text with a "(none)" placeholder when empty
    pub steps: String,
    /// "Saved: 2026-08-25 10:15" or the raw timestamp when unparseable
    pub created_label: String,
    /// Whether the delete button is shown for the current viewer
    pub can_delete: bool,
    /// Decoded image bytes for the thumbnail, if any
    pub image_bytes: Option<Vec<u8>>,
}

/// Case-insensitive substring match of the trimmed query against the
/// concatenation of name, base, ingredients and steps. An empty or
/// whitespace-only query matches everything.
pub fn matches(recipe: &Recipe, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    let haystack = format!(
        "{} {} {} {}",
        recipe.name, recipe.base, recipe.ingredients, recipe.steps
    )
    .to_lowercase();
    haystack.contains(&query)
}

/// Build the filtered card list in snapshot order (newest first).
///
/// `enforce_ownership` mirrors the active backend: the shared catalog
/// only offers delete to the record's owner, the local shelf to
/// everyone. This is the UX gate only; the store re-checks on delete.
pub fn build_cards(
    recipes: &[Recipe],
    query: &str,
    viewer: Option<&Identity>,
    enforce_ownership: bool,
) -> Vec<RecipeCard> {
    recipes
        .iter()
        .filter(|r| matches(r, query))
        .map(|r| card_for(r, viewer, enforce_ownership))
        .collect()
}

fn card_for(recipe: &Recipe, viewer: Option<&Identity>, enforce_ownership: bool) -> RecipeCard {
    let can_delete = if enforce_ownership {
        match (viewer, recipe.owner_uid.as_deref()) {
            (Some(viewer), Some(owner)) => viewer.uid == owner,
            _ => false,
        }
    } else {
        true
    };

    RecipeCard {
        id: recipe.id.clone(),
        name: recipe.name.clone(),
        base_label: if recipe.base.is_empty() {
            "Base spirit: (not provided)".to_string()
        } else {
            format!("Base spirit: {}", recipe.base)
        },
        ingredients: or_none(&recipe.ingredients),
        steps: or_none(&recipe.steps),
        created_label: format!("Saved: {}", format_created_at(&recipe.created_at)),
        can_delete,
        image_bytes: if recipe.image_data.is_empty() {
            None
        } else {
            codec::decode_data_url(&recipe.image_data)
        },
    }
}

fn or_none(text: &str) -> String {
    if text.is_empty() {
        "(none)".to_string()
    } else {
        text.to_string()
    }
}

/// Format an RFC 3339 timestamp in local time; fall back to the raw
/// string when it does not parse.
fn format_created_at(iso: &str) -> String {
    match DateTime::parse_from_rfc3339(iso) {
        Ok(dt) => dt
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        Err(_) => iso.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::store;

    fn recipe(name: &str, base: &str, owner: Option<&str>) -> Recipe {
        Recipe {
            id: store::new_entry_id(),
            local_id: String::new(),
            owner_uid: owner.map(String::from),
            owner_name: None,
            name: name.to_string(),
            base: base.to_string(),
            ingredients: format!("{name} ingredients"),
            steps: "mix".to_string(),
            image_data: String::new(),
            created_at: store::now_timestamp(),
        }
    }

    fn viewer(uid: &str) -> Identity {
        Identity {
            uid: uid.to_string(),
            display_name: "Viewer".to_string(),
        }
    }

    fn shelf() -> Vec<Recipe> {
        vec![
            recipe("Mojito", "Rum", Some("uid-ada")),
            recipe("Negroni", "Gin", Some("uid-bob")),
        ]
    }

    fn names(cards: &[RecipeCard]) -> Vec<&str> {
        cards.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_search_matches_base_spirit_case_insensitively() {
        let cards = build_cards(&shelf(), "rum", None, false);
        assert_eq!(names(&cards), ["Mojito"]);
    }

    #[test]
    fn test_empty_query_matches_everything_in_snapshot_order() {
        let cards = build_cards(&shelf(), "", None, false);
        assert_eq!(names(&cards), ["Mojito", "Negroni"]);

        let cards = build_cards(&shelf(), "   ", None, false);
        assert_eq!(names(&cards), ["Mojito", "Negroni"]);
    }

    #[test]
    fn test_unmatched_query_leaves_the_list_empty() {
        assert!(build_cards(&shelf(), "xyz", None, false).is_empty());
    }

    #[test]
    fn test_query_is_trimmed_before_matching() {
        let cards = build_cards(&shelf(), "  negroni  ", None, false);
        assert_eq!(names(&cards), ["Negroni"]);
    }

    #[test]
    fn test_search_covers_ingredients_and_steps() {
        let mut recipes = shelf();
        recipes[1].steps = "stir over a big ice cube".to_string();

        let cards = build_cards(&recipes, "ice cube", None, false);
        assert_eq!(names(&cards), ["Negroni"]);

        let cards = build_cards(&recipes, "mojito ingredients", None, false);
        assert_eq!(names(&cards), ["Mojito"]);
    }

    #[test]
    fn test_missing_fields_get_placeholders() {
        let mut r = recipe("Mystery", "", None);
        r.ingredients = String::new();
        r.steps = String::new();

        let card = &build_cards(&[r], "", None, false)[0];
        assert_eq!(card.base_label, "Base spirit: (not provided)");
        assert_eq!(card.ingredients, "(none)");
        assert_eq!(card.steps, "(none)");
    }

    #[test]
    fn test_created_label_formats_the_timestamp() {
        let mut r = recipe("Mojito", "Rum", None);
        r.created_at = "2026-08-25T10:15:30.123Z".to_string();

        let card = &build_cards(&[r], "", None, false)[0];
        // Rendered in local time, so only the month is stable here.
        assert!(card.created_label.starts_with("Saved: 2026-08-"));
    }

    #[test]
    fn test_unparseable_timestamp_falls_back_to_raw_text() {
        let mut r = recipe("Mojito", "Rum", None);
        r.created_at = "yesterday-ish".to_string();

        let card = &build_cards(&[r], "", None, false)[0];
        assert_eq!(card.created_label, "Saved: yesterday-ish");
    }

    #[test]
    fn test_ownership_gates_the_delete_button_on_the_catalog() {
        let cards = build_cards(&shelf(), "", Some(&viewer("uid-ada")), true);
        assert!(cards[0].can_delete, "Ada may delete her Mojito");
        assert!(!cards[1].can_delete, "but not Bob's Negroni");

        let cards = build_cards(&shelf(), "", None, true);
        assert!(cards.iter().all(|c| !c.can_delete));
    }

    #[test]
    fn test_local_shelf_lets_anyone_delete() {
        let cards = build_cards(&shelf(), "", None, false);
        assert!(cards.iter().all(|c| c.can_delete));
    }

    #[test]
    fn test_inline_image_is_decoded_for_the_thumbnail() {
        let mut r = recipe("Mojito", "Rum", None);
        r.image_data = "data:image/png;base64,AQIDBA==".to_string();

        let card = &build_cards(&[r], "", None, false)[0];
        assert_eq!(card.image_bytes, Some(vec![1, 2, 3, 4]));
    }
}
