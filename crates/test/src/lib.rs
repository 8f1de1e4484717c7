//! Test helpers and fixtures.

use std::collections::HashMap;

use aikesif_core::{
    AuthError, AuthEvent, Category, MIN_PASSWORD_LEN, Metadata, Profile, Session, SessionHandler,
    SessionListeners, SessionProvider, Subscription, Tool,
};

#[cfg(test)]
mod scenarios;

pub fn make_tool(id: &str, name: &str, category: Category) -> Tool {
    Tool {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{name} açıklaması"),
        long_description: format!("{name} hakkında uzun açıklama"),
        category,
        url: format!("https://{id}.example"),
        image_url: format!("https://logo.example/{id}"),
        is_popular: false,
    }
}

/// Two tools: A ("Asistan", Metin) and B ("Pix", Görsel).
pub fn sample_tools() -> Vec<Tool> {
    vec![
        make_tool("A", "Asistan", Category::Metin),
        make_tool("B", "Pix", Category::Gorsel),
    ]
}

/// Builds a session whose metadata is the given JSON object.
pub fn session_with(metadata: serde_json::Value) -> Session {
    Session {
        user_id: "user-1".to_string(),
        email: "ada@example.com".to_string(),
        metadata: metadata.as_object().cloned().unwrap_or_default(),
    }
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    session: Session,
}

/// In-memory identity provider with switchable failure modes.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    accounts: HashMap<String, Account>,
    current: Option<String>,
    listeners: SessionListeners,
    pub fail_updates: bool,
    pub fail_restore: bool,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an account and makes it the current session.
    pub fn signed_in_as(session: Session, password: &str) -> Self {
        let mut provider = Self::new();
        let email = session.email.clone();
        provider.accounts.insert(
            email.clone(),
            Account {
                password: password.to_string(),
                session,
            },
        );
        provider.current = Some(email);
        provider
    }

    pub fn listeners(&self) -> &SessionListeners {
        &self.listeners
    }
}

impl SessionProvider for MemoryProvider {
    fn current_session(&self) -> Result<Option<Session>, AuthError> {
        if self.fail_restore {
            return Err(AuthError::Backend("connection refused".to_string()));
        }
        Ok(self
            .current
            .as_ref()
            .and_then(|email| self.accounts.get(email))
            .map(|account| account.session.clone()))
    }

    fn on_session_change(&self, handler: SessionHandler) -> Subscription {
        self.listeners.subscribe(handler)
    }

    fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim().to_lowercase();
        let session = match self.accounts.get(&email) {
            Some(account) if account.password == password => account.session.clone(),
            _ => return Err(AuthError::InvalidCredentials),
        };
        self.current = Some(email);
        self.listeners.emit(AuthEvent::SignedIn, Some(&session));
        Ok(session)
    }

    fn sign_up(&mut self, email: &str, password: &str, profile: &Profile) -> Result<(), AuthError> {
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }
        if self.accounts.contains_key(&email) {
            return Err(AuthError::UserAlreadyRegistered);
        }

        let session = Session {
            user_id: format!("user-{}", self.accounts.len() + 1),
            email: email.clone(),
            metadata: profile.to_metadata(),
        };
        self.accounts.insert(
            email,
            Account {
                password: password.to_string(),
                session,
            },
        );
        Ok(())
    }

    fn sign_out(&mut self) -> Result<(), AuthError> {
        if self.current.take().is_some() {
            self.listeners.emit(AuthEvent::SignedOut, None);
        }
        Ok(())
    }

    fn update_metadata(&mut self, fields: Metadata) -> Result<Session, AuthError> {
        if self.fail_updates {
            return Err(AuthError::Backend("write rejected".to_string()));
        }
        let email = self.current.clone().ok_or(AuthError::SessionMissing)?;
        let account = self
            .accounts
            .get_mut(&email)
            .ok_or(AuthError::SessionMissing)?;
        account.session.metadata.extend(fields);
        let session = account.session.clone();
        self.listeners.emit(AuthEvent::UserUpdated, Some(&session));
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_sample_tools() {
        let tools = sample_tools();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[1].category, Category::Gorsel);
    }

    #[test]
    fn session_fixture_reads_metadata() {
        let session = session_with(serde_json::json!({ "favorites": ["A"] }));
        assert!(session.favorites().contains("A"));
    }

    #[test]
    fn memory_provider_signs_in_after_sign_up() -> Result<(), AuthError> {
        let mut provider = MemoryProvider::new();
        provider.sign_up("ada@example.com", "secret1", &Profile::default())?;
        assert_eq!(provider.current_session()?, None);
        let session = provider.sign_in("ada@example.com", "secret1")?;
        assert_eq!(provider.current_session()?, Some(session));
        Ok(())
    }
}
