//! Application orchestration layer: the single owner of catalog view state,
//! the signed-in user and their favorites.

use aikesif_catalog::{Catalog, FilterCriteria, filter_tools};
use aikesif_core::{AuthError, AuthEvent, CategoryFilter, FavoritesSet, Session, Settings, Tool, User};
use tracing::{debug, info, warn};

mod account;
mod worker;

pub use account::{AccountForm, AuthMode, AuthSubmission, FormField, REQUIRED_FIELDS_MISSING};
pub use worker::{SessionReply, SessionRequest, SessionWorker, handle_request};

pub const FAVORITES_LOGIN_REQUIRED: &str = "Favorilere eklemek için lütfen giriş yapın.";
pub const SIGN_UP_SUCCEEDED: &str = "Kayıt başarılı! Giriş yapabilirsiniz.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Catalog,
    Account,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Nobody is signed in; the account panel was requested instead.
    AuthRequired,
    /// Applied locally; `favorites` must be persisted under `ticket`.
    Changed {
        ticket: u64,
        favorites: FavoritesSet,
        added: bool,
    },
}

#[derive(Debug, Clone)]
struct PendingSave {
    ticket: u64,
    favorites: FavoritesSet,
}

#[derive(Debug, Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub catalog: Catalog,
    pub user: Option<User>,
    pub favorites: FavoritesSet,
    pub category: CategoryFilter,
    pub query: String,
    pub favorites_only: bool,
    pub panel: Panel,
    pub detail: Option<String>,
    pub selected: usize,
    pub account: AccountForm,
    pub alert: Option<String>,
    pub toast: Option<String>,
    pub loading: bool,
    confirmed_favorites: FavoritesSet,
    pending_saves: Vec<PendingSave>,
    next_ticket: u64,
}

impl AppContext {
    pub fn new(settings: Settings, catalog: Catalog) -> Self {
        Self {
            settings,
            catalog,
            user: None,
            favorites: FavoritesSet::new(),
            category: CategoryFilter::All,
            query: String::new(),
            favorites_only: false,
            panel: Panel::Catalog,
            detail: None,
            selected: 0,
            account: AccountForm::default(),
            alert: None,
            toast: None,
            loading: true,
            confirmed_favorites: FavoritesSet::new(),
            pending_saves: Vec::new(),
            next_ticket: 0,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.is_registered)
    }

    pub fn visible_tools(&self) -> Vec<&Tool> {
        filter_tools(
            self.catalog.tools(),
            &FilterCriteria {
                category: self.category,
                query: &self.query,
                favorites_only: self.favorites_only,
                favorites: &self.favorites,
            },
        )
    }

    pub fn selected_tool(&self) -> Option<&Tool> {
        self.visible_tools().get(self.selected).copied()
    }

    pub fn detail_tool(&self) -> Option<&Tool> {
        self.detail.as_deref().and_then(|id| self.catalog.get(id))
    }

    pub fn clamp_selection(&mut self) {
        let len = self.visible_tools().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn select_next(&mut self, step: usize) {
        let len = self.visible_tools().len();
        if self.selected + step < len {
            self.selected += step;
        }
    }

    pub fn select_prev(&mut self, step: usize) {
        if self.selected >= step {
            self.selected -= step;
        }
    }

    /// Chip click: picks the category and leaves favorites-only mode.
    pub fn select_category(&mut self, category: CategoryFilter) {
        self.category = category;
        self.favorites_only = false;
        self.selected = 0;
    }

    pub fn set_favorites_only(&mut self, favorites_only: bool) {
        self.favorites_only = favorites_only;
        self.selected = 0;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.selected = 0;
    }

    pub fn push_query_char(&mut self, ch: char) {
        self.query.push(ch);
        self.selected = 0;
    }

    pub fn pop_query_char(&mut self) {
        self.query.pop();
        self.clamp_selection();
    }

    /// Empty-state "back to start": clears every filter input.
    pub fn reset_filters(&mut self) {
        self.query.clear();
        self.category = CategoryFilter::All;
        self.favorites_only = false;
        self.selected = 0;
    }

    pub fn go_home(&mut self) {
        debug!("panel -> catalog");
        self.panel = Panel::Catalog;
        self.favorites_only = false;
        self.category = CategoryFilter::All;
        self.clamp_selection();
    }

    pub fn open_account(&mut self) {
        debug!("panel -> account");
        self.panel = Panel::Account;
    }

    pub fn open_details(&mut self, id: &str) {
        if self.catalog.get(id).is_some() {
            self.detail = Some(id.to_string());
        }
    }

    pub fn open_selected_details(&mut self) {
        if let Some(id) = self.selected_tool().map(|tool| tool.id.clone()) {
            self.detail = Some(id);
        }
    }

    pub fn close_details(&mut self) {
        self.detail = None;
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Optimistic toggle. Persisting the returned set is the caller's job.
    pub fn toggle_favorite(&mut self, id: &str) -> ToggleOutcome {
        if !self.is_signed_in() {
            self.alert = Some(FAVORITES_LOGIN_REQUIRED.to_string());
            self.close_details();
            self.open_account();
            return ToggleOutcome::AuthRequired;
        }

        let added = self.favorites.toggle(id);
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.pending_saves.push(PendingSave {
            ticket,
            favorites: self.favorites.clone(),
        });
        self.clamp_selection();
        ToggleOutcome::Changed {
            ticket,
            favorites: self.favorites.clone(),
            added,
        }
    }

    /// Replaces user and favorites with whatever the provider reports.
    pub fn apply_session(&mut self, event: AuthEvent, session: Option<&Session>) {
        debug!(%event, signed_in = session.is_some(), "apply session");
        match session {
            Some(session) => {
                self.user = Some(session.user());
                self.favorites = session.favorites();
            }
            None => {
                self.user = None;
                self.favorites = FavoritesSet::new();
            }
        }
        self.confirmed_favorites = self.favorites.clone();
        self.clamp_selection();
    }

    /// Settles a favorites write. A failure of the most recent write rolls
    /// the set back to the last state the provider confirmed.
    pub fn favorites_saved(&mut self, ticket: u64, result: Result<(), AuthError>) {
        let Some(pos) = self.pending_saves.iter().position(|p| p.ticket == ticket) else {
            return;
        };
        let save = self.pending_saves.remove(pos);

        match result {
            Ok(()) => {
                self.confirmed_favorites = save.favorites;
            }
            Err(err) => {
                warn!(ticket, error = %err, "favorites write failed");
                if ticket + 1 == self.next_ticket {
                    self.favorites = self.confirmed_favorites.clone();
                    self.clamp_selection();
                }
                self.toast = Some(format!("Favoriler kaydedilemedi: {err}"));
            }
        }
    }

    pub fn has_pending_saves(&self) -> bool {
        !self.pending_saves.is_empty()
    }

    pub fn finish_loading(&mut self, result: Result<Option<Session>, AuthError>) {
        self.loading = false;
        match result {
            Ok(session) => self.apply_session(AuthEvent::InitialSession, session.as_ref()),
            Err(err) => {
                warn!(error = %err, "initial session check failed");
                self.toast = Some(format!("Oturum bilgisi alınamadı: {err}"));
            }
        }
    }

    pub fn signed_out(&mut self, result: Result<(), AuthError>) {
        if let Err(err) = result {
            warn!(error = %err, "sign out failed");
            self.toast = Some(err.to_string());
        }
        self.user = None;
        self.favorites = FavoritesSet::new();
        self.confirmed_favorites = FavoritesSet::new();
        self.panel = Panel::Catalog;
        self.favorites_only = false;
        self.account.reset();
        self.clamp_selection();
    }

    /// Validates the account form and turns it into a provider request.
    pub fn submit_account(&mut self) -> Option<SessionRequest> {
        let submission = self.account.submit()?;
        Some(match submission {
            AuthSubmission::SignIn { email, password } => SessionRequest::SignIn { email, password },
            AuthSubmission::SignUp {
                email,
                password,
                profile,
            } => SessionRequest::SignUp {
                email,
                password,
                profile,
            },
        })
    }

    pub fn apply_reply(&mut self, reply: SessionReply) {
        match reply {
            SessionReply::Restored(result) => self.finish_loading(result),
            SessionReply::Changed { event, session } => {
                self.apply_session(event, session.as_ref());
            }
            SessionReply::SignedIn(result) => {
                if self.account.finish(result) {
                    info!("signed in");
                }
            }
            SessionReply::SignedUp(result) => {
                if self.account.finish(result) {
                    info!("signed up");
                    self.alert = Some(SIGN_UP_SUCCEEDED.to_string());
                    self.account.mode = AuthMode::Login;
                    self.account.focus_index = 0;
                }
            }
            SessionReply::SignedOut(result) => self.signed_out(result),
            SessionReply::FavoritesSaved { ticket, result } => {
                self.favorites_saved(ticket, result);
            }
        }
    }
}
