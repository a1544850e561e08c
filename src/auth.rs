/// Identity provider
///
/// A small session module standing where a hosted auth SDK would:
/// it owns the current identity, persists the sign-in across app
/// restarts, and notifies subscribers on every change (including once
/// immediately on subscribe, with whatever the current state is).
///
/// The uid is stable per machine: the first sign-in writes a profile
/// file with a generated uid and every later sign-in reuses it, so
/// ownership of catalog records survives sign-out/sign-in cycles.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, Weak};
use thiserror::Error;

use crate::state::data::Identity;
use crate::state::store::new_entry_id;

/// Sign-in / sign-out failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    /// The user backed out (empty name is the desktop analog of a
    /// dismissed or blocked sign-in popup)
    #[error("sign-in was cancelled")]
    Cancelled,
    /// The session could not be persisted or restored
    #[error("sign-in failed: {0}")]
    Failed(String),
}

/// Machine profile holding the stable uid
#[derive(Serialize, Deserialize)]
struct Profile {
    uid: String,
}

type Listener = Box<dyn Fn(Option<&Identity>) + Send>;

struct SessionState {
    current: Option<Identity>,
    listeners: Vec<(u64, Listener)>,
    next_listener_id: u64,
}

struct SessionShared {
    profile_path: PathBuf,
    session_path: PathBuf,
    state: Mutex<SessionState>,
}

/// Authentication session state, cheap to clone into background tasks
#[derive(Clone)]
pub struct Session {
    shared: Arc<SessionShared>,
}

/// Handle for one registered listener; dropping it stops delivery
pub struct Subscription {
    id: u64,
    shared: Weak<SessionShared>,
}

impl Subscription {
    /// Explicitly stop receiving identity changes
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            if let Ok(mut state) = shared.state.lock() {
                state.listeners.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

impl Session {
    /// Open the session stored under `dir`, restoring a persisted
    /// sign-in when one exists. A missing or unreadable session file
    /// just means nobody is signed in.
    pub fn open(dir: PathBuf) -> Self {
        let session_path = dir.join("session.json");
        let profile_path = dir.join("profile.json");

        let current = std::fs::read_to_string(&session_path)
            .ok()
            .and_then(|raw| serde_json::from_str::<Identity>(&raw).ok());
        if let Some(identity) = &current {
            println!("🔑 Restored session for {}", identity.display_name);
        }

        Session {
            shared: Arc::new(SessionShared {
                profile_path,
                session_path,
                state: Mutex::new(SessionState {
                    current,
                    listeners: Vec::new(),
                    next_listener_id: 0,
                }),
            }),
        }
    }

    /// Session under the default application data directory
    pub fn open_default() -> Self {
        let mut dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        dir.push("cocktail-book");
        Self::open(dir)
    }

    /// The identity that is signed in right now, if any
    pub fn current(&self) -> Option<Identity> {
        self.shared
            .state
            .lock()
            .map(|state| state.current.clone())
            .unwrap_or(None)
    }

    /// Register a listener for identity changes.
    ///
    /// The callback fires immediately with the current state and again
    /// on every sign-in/sign-out until the returned handle is dropped.
    /// Callbacks run with the session lock held and must not call back
    /// into the session.
    pub fn subscribe(&self, listener: impl Fn(Option<&Identity>) + Send + 'static) -> Subscription {
        let mut state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        listener(state.current.as_ref());
        let id = state.next_listener_id;
        state.next_listener_id += 1;
        state.listeners.push((id, Box::new(listener)));
        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Interactive sign-in with a display name.
    ///
    /// Reuses the machine profile's uid when one exists, so the same
    /// person keeps ownership of their records across sessions.
    pub async fn sign_in(&self, display_name: &str) -> Result<Identity, AuthError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AuthError::Cancelled);
        }

        let uid = self.load_or_create_uid()?;
        let identity = Identity {
            uid,
            display_name: display_name.to_string(),
        };

        let json = serde_json::to_string_pretty(&identity)
            .map_err(|e| AuthError::Failed(e.to_string()))?;
        std::fs::write(&self.shared.session_path, json)
            .map_err(|e| AuthError::Failed(format!("cannot persist session: {e}")))?;

        println!("🔑 Signed in as {} ({})", identity.display_name, identity.uid);
        self.set_current(Some(identity.clone()));
        Ok(identity)
    }

    /// Sign out and forget the persisted session. Signing out while
    /// already signed out is fine.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        match std::fs::remove_file(&self.shared.session_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(AuthError::Failed(format!("cannot clear session: {e}"))),
        }
        println!("👋 Signed out");
        self.set_current(None);
        Ok(())
    }

    fn load_or_create_uid(&self) -> Result<String, AuthError> {
        if let Ok(raw) = std::fs::read_to_string(&self.shared.profile_path) {
            if let Ok(profile) = serde_json::from_str::<Profile>(&raw) {
                return Ok(profile.uid);
            }
        }

        let profile = Profile {
            uid: format!("user_{}", new_entry_id()),
        };
        if let Some(parent) = self.shared.profile_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AuthError::Failed(format!("cannot create data dir: {e}")))?;
        }
        let json =
            serde_json::to_string_pretty(&profile).map_err(|e| AuthError::Failed(e.to_string()))?;
        std::fs::write(&self.shared.profile_path, json)
            .map_err(|e| AuthError::Failed(format!("cannot persist profile: {e}")))?;
        Ok(profile.uid)
    }

    fn set_current(&self, identity: Option<Identity>) {
        let mut state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.current = identity;
        let current = state.current.clone();
        for (_, listener) in &state.listeners {
            listener(current.as_ref());
        }
    }
}
