//! Offline identity provider backed by the local database.

use aikesif_core::{
    AuthError, AuthEvent, Metadata, Profile, Session, SessionHandler, SessionListeners,
    SessionProvider, Subscription,
};
use sha2::{Digest as _, Sha256};
use tracing::{debug, info, warn};

use crate::{Storage, UserRecord};

#[derive(Debug)]
pub struct LocalAuth {
    storage: Storage,
    listeners: SessionListeners,
    min_password_len: usize,
}

impl LocalAuth {
    pub fn new(storage: Storage, min_password_len: usize) -> Self {
        Self {
            storage,
            listeners: SessionListeners::new(),
            min_password_len,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    fn signed_in_record(&self) -> Result<Option<UserRecord>, AuthError> {
        let Some(user_id) = self.storage.auth_session_user().map_err(backend)? else {
            return Ok(None);
        };
        self.storage.find_user_by_id(&user_id).map_err(backend)
    }
}

impl SessionProvider for LocalAuth {
    fn current_session(&self) -> Result<Option<Session>, AuthError> {
        Ok(self.signed_in_record()?.map(session_of))
    }

    fn on_session_change(&self, handler: SessionHandler) -> Subscription {
        self.listeners.subscribe(handler)
    }

    fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        let Some(record) = self.storage.find_user_by_email(&email).map_err(backend)? else {
            debug!(%email, "sign in for unknown email");
            return Err(AuthError::InvalidCredentials);
        };
        if hash_password(&record.salt, password) != record.password_hash {
            debug!(%email, "sign in with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        self.storage.set_auth_session(&record.id).map_err(backend)?;
        let session = session_of(record);
        info!(user_id = %session.user_id, "signed in");
        self.listeners.emit(AuthEvent::SignedIn, Some(&session));
        Ok(session)
    }

    fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        profile: &Profile,
    ) -> Result<(), AuthError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < self.min_password_len {
            return Err(AuthError::WeakPassword {
                min: self.min_password_len,
            });
        }
        if self
            .storage
            .find_user_by_email(&email)
            .map_err(backend)?
            .is_some()
        {
            return Err(AuthError::UserAlreadyRegistered);
        }

        let salt = uuid::Uuid::new_v4().simple().to_string();
        let record = UserRecord {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            password_hash: hash_password(&salt, password),
            salt,
            metadata: profile.to_metadata(),
        };
        self.storage.insert_user(&record).map_err(backend)?;
        info!(user_id = %record.id, "account created");
        Ok(())
    }

    fn sign_out(&mut self) -> Result<(), AuthError> {
        let had_session = self.storage.auth_session_user().map_err(backend)?.is_some();
        self.storage.clear_auth_session().map_err(backend)?;
        if had_session {
            info!("signed out");
            self.listeners.emit(AuthEvent::SignedOut, None);
        }
        Ok(())
    }

    fn update_metadata(&mut self, fields: Metadata) -> Result<Session, AuthError> {
        let Some(mut record) = self.signed_in_record()? else {
            warn!("metadata update without a session");
            return Err(AuthError::SessionMissing);
        };

        record.metadata.extend(fields);
        self.storage
            .update_user_metadata(&record.id, &record.metadata)
            .map_err(backend)?;
        let session = session_of(record);
        debug!(user_id = %session.user_id, "metadata updated");
        self.listeners.emit(AuthEvent::UserUpdated, Some(&session));
        Ok(session)
    }
}

fn backend(err: anyhow::Error) -> AuthError {
    AuthError::Backend(format!("{err:#}"))
}

fn session_of(record: UserRecord) -> Session {
    Session {
        user_id: record.id,
        email: record.email,
        metadata: record.metadata,
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
