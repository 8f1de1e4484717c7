//! Identity provider contract: sessions, change notifications and errors.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::{FavoritesSet, User};

pub const FIRST_NAME_KEY: &str = "firstName";
pub const LAST_NAME_KEY: &str = "lastName";
pub const FIELD_OF_WORK_KEY: &str = "fieldOfWork";
pub const FAVORITES_KEY: &str = "favorites";

/// Open-ended per-user metadata bag kept by the provider.
pub type Metadata = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub metadata: Metadata,
}

impl Session {
    fn text(&self, key: &str) -> String {
        self.metadata
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    pub fn first_name(&self) -> String {
        self.text(FIRST_NAME_KEY)
    }

    pub fn last_name(&self) -> String {
        self.text(LAST_NAME_KEY)
    }

    pub fn field_of_work(&self) -> String {
        self.text(FIELD_OF_WORK_KEY)
    }

    /// Missing or malformed lists read as empty; non-string entries are skipped.
    pub fn favorites(&self) -> FavoritesSet {
        let Some(Value::Array(items)) = self.metadata.get(FAVORITES_KEY) else {
            return FavoritesSet::new();
        };
        FavoritesSet::from_ids(items.iter().filter_map(Value::as_str))
    }

    pub fn user(&self) -> User {
        User {
            first_name: self.first_name(),
            last_name: self.last_name(),
            email: self.email.clone(),
            field_of_work: self.field_of_work(),
            is_registered: true,
        }
    }
}

/// Profile fields captured at sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub field_of_work: String,
}

impl Profile {
    pub fn to_metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert(
            FIRST_NAME_KEY.to_string(),
            Value::String(self.first_name.clone()),
        );
        metadata.insert(
            LAST_NAME_KEY.to_string(),
            Value::String(self.last_name.clone()),
        );
        metadata.insert(
            FIELD_OF_WORK_KEY.to_string(),
            Value::String(self.field_of_work.clone()),
        );
        metadata
    }
}

pub fn favorites_metadata(favorites: &FavoritesSet) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(
        FAVORITES_KEY.to_string(),
        Value::Array(favorites.iter().map(|id| Value::String(id.to_string())).collect()),
    );
    metadata
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    UserUpdated,
}

impl AuthEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthEvent::InitialSession => "INITIAL_SESSION",
            AuthEvent::SignedIn => "SIGNED_IN",
            AuthEvent::SignedOut => "SIGNED_OUT",
            AuthEvent::UserUpdated => "USER_UPDATED",
        }
    }
}

impl std::fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider failures. Messages are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("User already registered")]
    UserAlreadyRegistered,

    #[error("Password should be at least {min} characters.")]
    WeakPassword { min: usize },

    #[error("Unable to validate email address: invalid format")]
    InvalidEmail,

    #[error("Auth session missing!")]
    SessionMissing,

    #[error("Database error: {0}")]
    Backend(String),
}

pub type SessionHandler = Box<dyn Fn(AuthEvent, Option<&Session>) + Send>;

/// Operations the application consumes from the identity provider.
pub trait SessionProvider {
    fn current_session(&self) -> Result<Option<Session>, AuthError>;

    /// Registers `handler` for sign-in, sign-out and metadata updates.
    fn on_session_change(&self, handler: SessionHandler) -> Subscription;

    fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, AuthError>;

    fn sign_up(&mut self, email: &str, password: &str, profile: &Profile)
    -> Result<(), AuthError>;

    fn sign_out(&mut self) -> Result<(), AuthError>;

    /// Overwrites the named keys on the signed-in user's metadata.
    fn update_metadata(&mut self, fields: Metadata) -> Result<Session, AuthError>;
}

/// Handle returned by [`SessionProvider::on_session_change`]. Releasing it
/// (explicitly or by drop) removes the handler; release happens once.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    handlers: Vec<(u64, SessionHandler)>,
}

/// Handler registry shared by provider implementations. Handlers must not
/// subscribe or unsubscribe from inside a callback.
#[derive(Clone, Default)]
pub struct SessionListeners {
    inner: Arc<Mutex<ListenerTable>>,
}

impl SessionListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, handler: SessionHandler) -> Subscription {
        let id = {
            let mut table = lock(&self.inner);
            let id = table.next_id;
            table.next_id += 1;
            table.handlers.push((id, handler));
            id
        };

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock(&inner).handlers.retain(|(handler_id, _)| *handler_id != id);
            }
        })
    }

    pub fn emit(&self, event: AuthEvent, session: Option<&Session>) {
        let table = lock(&self.inner);
        for (_, handler) in &table.handlers {
            handler(event, session);
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for SessionListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionListeners")
            .field("handlers", &self.len())
            .finish()
    }
}

fn lock(table: &Mutex<ListenerTable>) -> MutexGuard<'_, ListenerTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}
