//! Runs identity provider calls off the UI thread.
//!
//! The provider is moved onto a dedicated thread. Requests go in over one
//! channel; replies and session-change notifications come back over another,
//! in the order the provider produced them.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use aikesif_core::{
    AuthError, AuthEvent, FavoritesSet, Profile, Session, SessionProvider, Subscription,
    favorites_metadata,
};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub enum SessionRequest {
    Restore,
    SignIn {
        email: String,
        password: String,
    },
    SignUp {
        email: String,
        password: String,
        profile: Profile,
    },
    SignOut,
    SaveFavorites {
        ticket: u64,
        favorites: FavoritesSet,
    },
}

impl SessionRequest {
    fn name(&self) -> &'static str {
        match self {
            SessionRequest::Restore => "restore",
            SessionRequest::SignIn { .. } => "sign_in",
            SessionRequest::SignUp { .. } => "sign_up",
            SessionRequest::SignOut => "sign_out",
            SessionRequest::SaveFavorites { .. } => "save_favorites",
        }
    }
}

#[derive(Debug, Clone)]
pub enum SessionReply {
    Restored(Result<Option<Session>, AuthError>),
    SignedIn(Result<(), AuthError>),
    SignedUp(Result<(), AuthError>),
    SignedOut(Result<(), AuthError>),
    FavoritesSaved {
        ticket: u64,
        result: Result<(), AuthError>,
    },
    Changed {
        event: AuthEvent,
        session: Option<Session>,
    },
}

#[derive(Debug)]
pub struct SessionWorker {
    requests: Option<Sender<SessionRequest>>,
    replies: Receiver<SessionReply>,
    subscription: Option<Subscription>,
    handle: Option<JoinHandle<()>>,
}

impl SessionWorker {
    /// Subscribes to `provider`'s session changes, then moves it onto the
    /// worker thread.
    pub fn spawn<P>(provider: P) -> std::io::Result<Self>
    where
        P: SessionProvider + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel();
        let (reply_tx, reply_rx) = mpsc::channel();

        let change_tx = reply_tx.clone();
        let subscription = provider.on_session_change(Box::new(
            move |event: AuthEvent, session: Option<&Session>| {
                let _ = change_tx.send(SessionReply::Changed {
                    event,
                    session: session.cloned(),
                });
            },
        ));

        let handle = thread::Builder::new()
            .name("session-worker".to_string())
            .spawn(move || run(provider, request_rx, reply_tx))?;

        Ok(Self {
            requests: Some(request_tx),
            replies: reply_rx,
            subscription: Some(subscription),
            handle: Some(handle),
        })
    }

    /// Returns false once the worker thread has gone away.
    pub fn send(&self, request: SessionRequest) -> bool {
        debug!(request = request.name(), "queue session request");
        self.requests
            .as_ref()
            .is_some_and(|tx| tx.send(request).is_ok())
    }

    pub fn drain(&self) -> Vec<SessionReply> {
        self.replies.try_iter().collect()
    }

    /// Blocks until the next reply. Returns `None` once the worker stopped.
    pub fn recv(&self) -> Option<SessionReply> {
        self.replies.recv().ok()
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.requests = None;
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("session worker panicked");
        }
    }
}

impl Drop for SessionWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<P: SessionProvider>(
    mut provider: P,
    requests: Receiver<SessionRequest>,
    replies: Sender<SessionReply>,
) {
    for request in requests {
        let reply = handle_request(&mut provider, request);
        if replies.send(reply).is_err() {
            break;
        }
    }
    debug!("session worker stopped");
}

pub fn handle_request<P: SessionProvider + ?Sized>(
    provider: &mut P,
    request: SessionRequest,
) -> SessionReply {
    match request {
        SessionRequest::Restore => SessionReply::Restored(provider.current_session()),
        SessionRequest::SignIn { email, password } => {
            SessionReply::SignedIn(provider.sign_in(&email, &password).map(|_| ()))
        }
        SessionRequest::SignUp {
            email,
            password,
            profile,
        } => SessionReply::SignedUp(provider.sign_up(&email, &password, &profile)),
        SessionRequest::SignOut => SessionReply::SignedOut(provider.sign_out()),
        SessionRequest::SaveFavorites { ticket, favorites } => SessionReply::FavoritesSaved {
            ticket,
            result: provider
                .update_metadata(favorites_metadata(&favorites))
                .map(|_| ()),
        },
    }
}
