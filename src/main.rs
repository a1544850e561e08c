use iced::widget::{
    button, column, container, image as iced_image, row, scrollable, text, text_input,
};
use iced::{Alignment, Element, Length, Task, Theme};
use rfd::FileDialog;
use std::collections::HashSet;
use std::sync::Arc;

// Declare the application modules
mod auth;
mod codec;
mod state;
mod ui;

use auth::{AuthError, Session};
use codec::CodecError;
use state::catalog::CatalogStore;
use state::data::{Identity, InlineImage, Recipe, RecipeDraft};
use state::local::LocalStore;
use state::store::{RecipeStore, StoreError};
use ui::cards::{self, RecipeCard};

/// Buffers for the "add recipe" form
#[derive(Default)]
struct DraftForm {
    open: bool,
    name: String,
    base: String,
    ingredients: String,
    steps: String,
    image: Option<InlineImage>,
    image_label: String,
}

impl DraftForm {
    fn to_draft(&self) -> RecipeDraft {
        RecipeDraft {
            name: self.name.clone(),
            base: self.base.clone(),
            ingredients: self.ingredients.clone(),
            steps: self.steps.clone(),
            image: self.image.clone(),
        }
    }

    fn clear_fields(&mut self) {
        self.name.clear();
        self.base.clear();
        self.ingredients.clear();
        self.steps.clear();
        self.image = None;
        self.image_label.clear();
    }
}

/// Main application state
struct CocktailBook {
    /// Active persistence backend, chosen at startup
    store: Arc<dyn RecipeStore>,
    /// Authentication session state
    session: Session,
    /// Held for the app's lifetime; logs identity transitions
    _auth_watch: auth::Subscription,
    /// In-memory mirror of the last successful store snapshot
    recipes: Vec<Recipe>,
    /// Live search query
    query: String,
    /// Current viewer, if signed in
    identity: Option<Identity>,
    /// Status message to display to the user
    status: String,
    /// The add-recipe form
    form: DraftForm,
    /// Card ids with their detail panel open
    expanded: HashSet<String>,
    /// Name buffer for the sign-in box
    sign_in_name: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// Initial (or retried) snapshot load finished
    Loaded(Result<Vec<Recipe>, StoreError>),
    SearchChanged(String),
    OpenForm,
    CloseForm,
    ResetForm,
    NameChanged(String),
    BaseChanged(String),
    IngredientsChanged(String),
    StepsChanged(String),
    /// User clicked "Attach image"
    PickImage,
    /// Background encode of the picked file finished
    ImageRead(Result<InlineImage, CodecError>),
    Submit,
    /// Background add finished
    Added(Result<Recipe, StoreError>),
    Delete(String),
    /// Background remove finished for the given id
    Deleted(String, Result<(), StoreError>),
    ToggleDetails(String),
    SignInNameChanged(String),
    SignIn,
    SignedIn(Result<Identity, AuthError>),
    SignOut,
    SignedOut(Result<(), AuthError>),
}

/// Run a blocking store call off the UI thread
async fn run_blocking<T, F>(f: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .unwrap_or_else(|e| Err(StoreError::Unavailable(format!("background task failed: {e}"))))
}

fn load_task(store: Arc<dyn RecipeStore>) -> Task<Message> {
    Task::perform(
        async move { run_blocking(move || store.list_all()).await },
        Message::Loaded,
    )
}

impl CocktailBook {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        // Backend selection happens once, here: `--local` picks the
        // single-user shelf file, everything else the shared catalog.
        let store: Arc<dyn RecipeStore> = if std::env::args().any(|arg| arg == "--local") {
            Arc::new(LocalStore::new())
        } else {
            Arc::new(CatalogStore::new())
        };

        let session = Session::open_default();
        let identity = session.current();
        // One subscription for the app's lifetime; identity updates
        // reach the UI through task messages, the listener just logs.
        let auth_watch = session.subscribe(|identity| match identity {
            Some(identity) => println!("👤 Identity: {}", identity.display_name),
            None => println!("👤 Identity: signed out"),
        });

        println!("🍸 Cocktail Book starting with the {}", store.label());
        let status = format!("Loading recipes from the {}...", store.label());
        let load = load_task(store.clone());

        (
            CocktailBook {
                store,
                session,
                _auth_watch: auth_watch,
                recipes: Vec::new(),
                query: String::new(),
                identity,
                status,
                form: DraftForm::default(),
                expanded: HashSet::new(),
                sign_in_name: String::new(),
            },
            load,
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Loaded(Ok(recipes)) => {
                println!("✅ Loaded {} recipes", recipes.len());
                self.status = format!("Ready. {} recipes on the {}.", recipes.len(), self.store.label());
                self.recipes = recipes;
                Task::none()
            }
            Message::Loaded(Err(e)) => {
                // Degrade to an empty list; the app stays usable and a
                // later add/remove will retry the medium anyway.
                eprintln!("⚠️  Could not load recipes: {e}");
                self.recipes = Vec::new();
                self.status = format!("⚠️ Could not load recipes ({e}). Showing an empty list.");
                Task::none()
            }
            Message::SearchChanged(query) => {
                self.query = query;
                Task::none()
            }
            Message::OpenForm => {
                if self.store.requires_identity() && self.identity.is_none() {
                    self.status = "Sign in to add recipes.".to_string();
                } else {
                    self.form.open = true;
                }
                Task::none()
            }
            Message::CloseForm => {
                self.form.open = false;
                Task::none()
            }
            Message::ResetForm => {
                self.form.clear_fields();
                Task::none()
            }
            Message::NameChanged(v) => {
                self.form.name = v;
                Task::none()
            }
            Message::BaseChanged(v) => {
                self.form.base = v;
                Task::none()
            }
            Message::IngredientsChanged(v) => {
                self.form.ingredients = v;
                Task::none()
            }
            Message::StepsChanged(v) => {
                self.form.steps = v;
                Task::none()
            }
            Message::PickImage => {
                // Native picker, same pattern as any other dialog use
                let file = FileDialog::new()
                    .set_title("Choose a cocktail photo")
                    .add_filter("Images", &["png", "jpg", "jpeg", "gif", "webp", "bmp"])
                    .pick_file();

                if let Some(path) = file {
                    let limit = self.store.image_limit();
                    return Task::perform(
                        async move { codec::read_as_data_url(&path, limit) },
                        Message::ImageRead,
                    );
                }
                Task::none()
            }
            Message::ImageRead(Ok(image)) => {
                self.form.image_label =
                    format!("image attached ({} KB)", image.source_len / 1024);
                self.form.image = Some(image);
                Task::none()
            }
            Message::ImageRead(Err(e)) => {
                eprintln!("⚠️  Image rejected: {e}");
                self.status = format!("⚠️ {e}");
                Task::none()
            }
            Message::Submit => {
                if self.store.requires_identity() && self.identity.is_none() {
                    self.status = "Sign in to save recipes.".to_string();
                    return Task::none();
                }
                let draft = self.form.to_draft();
                let store = self.store.clone();
                let actor = self.identity.clone();
                self.status = "Saving...".to_string();
                Task::perform(
                    async move { run_blocking(move || store.add(draft, actor.as_ref())).await },
                    Message::Added,
                )
            }
            Message::Added(Ok(recipe)) => {
                println!("✅ Saved \"{}\"", recipe.name);
                self.status = format!("Saved \"{}\".", recipe.name);
                // The store returned the persisted record; the mirror
                // gets it prepended so the list shows it immediately.
                self.recipes.insert(0, recipe);
                self.form.clear_fields();
                self.form.open = false;
                Task::none()
            }
            Message::Added(Err(e)) => {
                // The mirror was never touched, so there is nothing to
                // roll back; just report and stay interactive.
                eprintln!("⚠️  Save failed: {e}");
                self.status = format!("⚠️ Save failed: {e}");
                Task::none()
            }
            Message::Delete(id) => {
                let store = self.store.clone();
                let actor = self.identity.clone();
                let target = id.clone();
                self.status = "Deleting...".to_string();
                Task::perform(
                    async move { run_blocking(move || store.remove(&target, actor.as_ref())).await },
                    move |result| Message::Deleted(id.clone(), result),
                )
            }
            Message::Deleted(id, Ok(())) => {
                self.recipes.retain(|r| r.id != id);
                self.expanded.remove(&id);
                self.status = "Recipe deleted.".to_string();
                Task::none()
            }
            Message::Deleted(id, Err(StoreError::NotFound(_))) => {
                // Someone else deleted it first; the outcome is the
                // same, so drop it from the mirror and move on.
                self.recipes.retain(|r| r.id != id);
                self.expanded.remove(&id);
                self.status = "Recipe was already removed.".to_string();
                Task::none()
            }
            Message::Deleted(_, Err(e)) => {
                // The store is the authority; keep the record visible.
                eprintln!("⚠️  Delete failed: {e}");
                self.status = format!("⚠️ Delete failed: {e}");
                Task::none()
            }
            Message::ToggleDetails(id) => {
                if !self.expanded.remove(&id) {
                    self.expanded.insert(id);
                }
                Task::none()
            }
            Message::SignInNameChanged(v) => {
                self.sign_in_name = v;
                Task::none()
            }
            Message::SignIn => {
                let session = self.session.clone();
                let name = self.sign_in_name.clone();
                Task::perform(
                    async move { session.sign_in(&name).await },
                    Message::SignedIn,
                )
            }
            Message::SignedIn(Ok(identity)) => {
                self.status = format!("Signed in as {}.", identity.display_name);
                self.identity = Some(identity);
                self.sign_in_name.clear();
                Task::none()
            }
            Message::SignedIn(Err(e)) => {
                eprintln!("⚠️  Sign-in failed: {e}");
                self.status = format!("⚠️ {e}");
                Task::none()
            }
            Message::SignOut => {
                let session = self.session.clone();
                Task::perform(async move { session.sign_out().await }, Message::SignedOut)
            }
            Message::SignedOut(Ok(())) => {
                self.identity = None;
                self.status = "Signed out.".to_string();
                Task::none()
            }
            Message::SignedOut(Err(e)) => {
                eprintln!("⚠️  Sign-out failed: {e}");
                self.status = format!("⚠️ {e}");
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let cards = cards::build_cards(
            &self.recipes,
            &self.query,
            self.identity.as_ref(),
            self.store.requires_identity(),
        );

        let header = row![
            text("Cocktail Book").size(32),
            text(format!("{} total / {} shown", self.recipes.len(), cards.len())).size(14),
        ]
        .spacing(16)
        .align_y(Alignment::Center);

        let search = text_input("Search recipes...", &self.query)
            .on_input(Message::SearchChanged)
            .padding(8);

        let controls = row![self.auth_view(), button("Add recipe").on_press(Message::OpenForm).padding(8)]
            .spacing(12)
            .align_y(Alignment::Center);

        let mut page = column![header, controls, search, text(&self.status).size(14)]
            .spacing(12)
            .padding(24);

        if self.form.open {
            page = page.push(self.form_view());
        }

        let list: Element<Message> = if cards.is_empty() {
            container(
                column![
                    text("No recipes to show.").size(18),
                    text(if self.query.trim().is_empty() {
                        "Add the first one!"
                    } else {
                        "Nothing matches your search."
                    })
                    .size(14),
                ]
                .spacing(8)
                .align_x(Alignment::Center),
            )
            .width(Length::Fill)
            .padding(32)
            .into()
        } else {
            scrollable(
                column(cards.iter().map(|card| self.card_view(card)))
                    .spacing(12)
                    .width(Length::Fill),
            )
            .height(Length::Fill)
            .into()
        };
        page = page.push(list);

        container(page)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Sign-in box or the signed-in label, depending on session state
    fn auth_view(&self) -> Element<Message> {
        match &self.identity {
            Some(identity) => row![
                text(format!("Signed in: {}", identity.display_name)).size(14),
                button("Sign out").on_press(Message::SignOut).padding(6),
            ]
            .spacing(8)
            .align_y(Alignment::Center)
            .into(),
            None => row![
                text_input("Your name", &self.sign_in_name)
                    .on_input(Message::SignInNameChanged)
                    .padding(6)
                    .width(Length::Fixed(160.0)),
                button("Sign in").on_press(Message::SignIn).padding(6),
            ]
            .spacing(8)
            .align_y(Alignment::Center)
            .into(),
        }
    }

    /// The add-recipe form panel
    fn form_view(&self) -> Element<Message> {
        let image_label = if self.form.image_label.is_empty() {
            "no image".to_string()
        } else {
            self.form.image_label.clone()
        };

        container(
            column![
                text("New recipe").size(20),
                text_input("Name (required)", &self.form.name)
                    .on_input(Message::NameChanged)
                    .padding(6),
                text_input("Base spirit", &self.form.base)
                    .on_input(Message::BaseChanged)
                    .padding(6),
                text_input("Ingredients", &self.form.ingredients)
                    .on_input(Message::IngredientsChanged)
                    .padding(6),
                text_input("Steps", &self.form.steps)
                    .on_input(Message::StepsChanged)
                    .padding(6),
                row![
                    button("Attach image").on_press(Message::PickImage).padding(6),
                    text(image_label).size(12),
                ]
                .spacing(8)
                .align_y(Alignment::Center),
                row![
                    button("Save").on_press(Message::Submit).padding(6),
                    button("Reset").on_press(Message::ResetForm).padding(6),
                    button("Cancel").on_press(Message::CloseForm).padding(6),
                ]
                .spacing(8),
            ]
            .spacing(8),
        )
        .padding(16)
        .style(container::rounded_box)
        .into()
    }

    /// One recipe card, with an optional expanded detail panel
    fn card_view(&self, card: &RecipeCard) -> Element<Message> {
        let expanded = self.expanded.contains(&card.id);

        let mut headline = row![].spacing(12).align_y(Alignment::Center);
        if let Some(bytes) = &card.image_bytes {
            headline = headline.push(
                iced_image(iced_image::Handle::from_bytes(bytes.clone()))
                    .width(Length::Fixed(72.0)),
            );
        }
        headline = headline.push(
            column![
                text(card.name.clone()).size(20),
                text(card.base_label.clone()).size(14),
            ]
            .spacing(4)
            .width(Length::Fill),
        );
        headline = headline.push(
            button(if expanded { "Hide" } else { "Details" })
                .on_press(Message::ToggleDetails(card.id.clone()))
                .padding(6),
        );
        if card.can_delete {
            headline = headline.push(
                button("Delete")
                    .on_press(Message::Delete(card.id.clone()))
                    .padding(6),
            );
        }

        let mut body = column![headline].spacing(8);
        if expanded {
            body = body.push(
                column![
                    text("Ingredients").size(14),
                    text(card.ingredients.clone()).size(14),
                    text("Steps").size(14),
                    text(card.steps.clone()).size(14),
                    text(card.created_label.clone()).size(12),
                ]
                .spacing(4),
            );
        }

        container(body)
            .padding(12)
            .width(Length::Fill)
            .style(container::rounded_box)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    iced::application("Cocktail Book", CocktailBook::update, CocktailBook::view)
        .theme(CocktailBook::theme)
        .centered()
        .run_with(CocktailBook::new)
}
