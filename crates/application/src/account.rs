//! Login / sign-up form state for the account panel.

use aikesif_core::{AuthError, Profile};

pub const REQUIRED_FIELDS_MISSING: &str = "Lütfen tüm alanları doldurun.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    SignUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    FirstName,
    LastName,
    Email,
    Password,
    FieldOfWork,
}

const LOGIN_FIELDS: [FormField; 2] = [FormField::Email, FormField::Password];
const SIGN_UP_FIELDS: [FormField; 5] = [
    FormField::FirstName,
    FormField::LastName,
    FormField::Email,
    FormField::Password,
    FormField::FieldOfWork,
];

impl FormField {
    pub fn label(&self) -> &'static str {
        match self {
            FormField::FirstName => "Ad",
            FormField::LastName => "Soyad",
            FormField::Email => "E-posta",
            FormField::Password => "Şifre",
            FormField::FieldOfWork => "Uğraşılan Alan",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            FormField::FirstName => "Ahmet",
            FormField::LastName => "Yılmaz",
            FormField::Email => "ahmet@mail.com",
            FormField::Password => "••••••••",
            FormField::FieldOfWork => "Örn: Yazılım Geliştirici",
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, FormField::Password)
    }
}

/// A validated form, ready to hand to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthSubmission {
    SignIn {
        email: String,
        password: String,
    },
    SignUp {
        email: String,
        password: String,
        profile: Profile,
    },
}

#[derive(Debug, Clone, Default)]
pub struct AccountForm {
    pub mode: AuthMode,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub field_of_work: String,
    pub focus_index: usize,
    pub submitting: bool,
    pub error: Option<String>,
}

impl AccountForm {
    pub fn fields(&self) -> &'static [FormField] {
        match self.mode {
            AuthMode::Login => &LOGIN_FIELDS,
            AuthMode::SignUp => &SIGN_UP_FIELDS,
        }
    }

    pub fn focus(&self) -> FormField {
        let fields = self.fields();
        fields[self.focus_index.min(fields.len() - 1)]
    }

    pub fn focus_next(&mut self) {
        self.focus_index = (self.focus_index + 1) % self.fields().len();
    }

    pub fn focus_prev(&mut self) {
        let len = self.fields().len();
        self.focus_index = (self.focus_index + len - 1) % len;
    }

    /// Flips between login and sign-up. Any displayed error is cleared.
    pub fn switch_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::Login,
        };
        self.error = None;
        self.focus_index = 0;
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::FirstName => &self.first_name,
            FormField::LastName => &self.last_name,
            FormField::Email => &self.email,
            FormField::Password => &self.password,
            FormField::FieldOfWork => &self.field_of_work,
        }
    }

    fn value_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::FirstName => &mut self.first_name,
            FormField::LastName => &mut self.last_name,
            FormField::Email => &mut self.email,
            FormField::Password => &mut self.password,
            FormField::FieldOfWork => &mut self.field_of_work,
        }
    }

    pub fn push_char(&mut self, ch: char) {
        let field = self.focus();
        self.value_mut(field).push(ch);
    }

    pub fn pop_char(&mut self) {
        let field = self.focus();
        self.value_mut(field).pop();
    }

    pub fn clear_focused(&mut self) {
        let field = self.focus();
        self.value_mut(field).clear();
    }

    /// Returns `None` while a request is outstanding or when a required
    /// field is empty (the error is set in that case).
    pub fn submit(&mut self) -> Option<AuthSubmission> {
        if self.submitting {
            return None;
        }

        let missing = self
            .fields()
            .iter()
            .any(|field| self.value(*field).trim().is_empty());
        if missing {
            self.error = Some(REQUIRED_FIELDS_MISSING.to_string());
            return None;
        }

        self.error = None;
        self.submitting = true;
        let email = self.email.trim().to_string();
        let password = self.password.clone();
        Some(match self.mode {
            AuthMode::Login => AuthSubmission::SignIn { email, password },
            AuthMode::SignUp => AuthSubmission::SignUp {
                email,
                password,
                profile: Profile {
                    first_name: self.first_name.trim().to_string(),
                    last_name: self.last_name.trim().to_string(),
                    field_of_work: self.field_of_work.trim().to_string(),
                },
            },
        })
    }

    /// Records the provider's answer. Returns true on success.
    pub fn finish(&mut self, result: Result<(), AuthError>) -> bool {
        self.submitting = false;
        match result {
            Ok(()) => {
                self.error = None;
                self.password.clear();
                true
            }
            Err(err) => {
                self.error = Some(err.to_string());
                false
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_sign_up() -> AccountForm {
        AccountForm {
            mode: AuthMode::SignUp,
            first_name: " Ada ".to_string(),
            last_name: "Lovelace".to_string(),
            email: " ada@example.com ".to_string(),
            password: "secret1".to_string(),
            field_of_work: "Matematik".to_string(),
            ..AccountForm::default()
        }
    }

    #[test]
    fn login_mode_shows_two_fields() {
        let form = AccountForm::default();
        assert_eq!(form.fields(), &[FormField::Email, FormField::Password]);
        assert_eq!(form.focus(), FormField::Email);
    }

    #[test]
    fn switching_mode_clears_error_and_focus() {
        let mut form = AccountForm {
            error: Some("Invalid login credentials".to_string()),
            focus_index: 1,
            ..AccountForm::default()
        };
        form.switch_mode();
        assert_eq!(form.mode, AuthMode::SignUp);
        assert!(form.error.is_none());
        assert_eq!(form.focus(), FormField::FirstName);
    }

    #[test]
    fn focus_cycles_through_visible_fields() {
        let mut form = AccountForm::default();
        form.focus_next();
        assert_eq!(form.focus(), FormField::Password);
        form.focus_next();
        assert_eq!(form.focus(), FormField::Email);
        form.focus_prev();
        assert_eq!(form.focus(), FormField::Password);
    }

    #[test]
    fn typing_edits_focused_field() {
        let mut form = AccountForm::default();
        for ch in "a@b.c".chars() {
            form.push_char(ch);
        }
        form.pop_char();
        assert_eq!(form.email, "a@b.");
        form.clear_focused();
        assert!(form.email.is_empty());
    }

    #[test]
    fn submit_requires_all_visible_fields() {
        let mut form = AccountForm {
            email: "ada@example.com".to_string(),
            ..AccountForm::default()
        };
        assert!(form.submit().is_none());
        assert_eq!(form.error.as_deref(), Some(REQUIRED_FIELDS_MISSING));
        assert!(!form.submitting);
    }

    #[test]
    fn submit_builds_sign_up_with_trimmed_profile() {
        let mut form = filled_sign_up();
        let submission = form.submit();
        assert_eq!(
            submission,
            Some(AuthSubmission::SignUp {
                email: "ada@example.com".to_string(),
                password: "secret1".to_string(),
                profile: Profile {
                    first_name: "Ada".to_string(),
                    last_name: "Lovelace".to_string(),
                    field_of_work: "Matematik".to_string(),
                },
            })
        );
        assert!(form.submitting);
    }

    #[test]
    fn submit_is_disabled_while_submitting() {
        let mut form = filled_sign_up();
        assert!(form.submit().is_some());
        assert!(form.submit().is_none());
    }

    #[test]
    fn failed_request_keeps_mode_and_shows_message() {
        let mut form = filled_sign_up();
        form.submit();
        let ok = form.finish(Err(AuthError::WeakPassword { min: 6 }));
        assert!(!ok);
        assert!(!form.submitting);
        assert_eq!(form.mode, AuthMode::SignUp);
        assert_eq!(
            form.error.as_deref(),
            Some("Password should be at least 6 characters.")
        );
    }
}
