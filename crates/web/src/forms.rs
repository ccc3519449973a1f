//! Form validation.
//!
//! A [`Form`] wraps the submitted fields and collects per-field error
//! messages. Each submission type (`NewSnippet`, `Signup`, ...) has a
//! `parse` function that either yields the validated value or hands the
//! form back, errors attached, so the page can be redisplayed with the
//! user's input intact.

use std::collections::HashMap;

use snippetbox_core::Email;

pub const BLANK: &str = "This field cannot be blank";
pub const INVALID: &str = "This field is invalid";
pub const DUPLICATE_EMAIL: &str = "Email address is already in use";
pub const BAD_CREDENTIALS: &str = "Email or Password is incorrect";
pub const WRONG_CURRENT_PASSWORD: &str = "Current password is incorrect";
pub const PASSWORDS_DIFFER: &str = "Passwords do not match";

/// Key for errors that belong to the form as a whole rather than one field.
pub const GENERIC: &str = "generic";

/// Field name to messages, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(HashMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_owned()).or_default().push(message.into());
    }

    /// First message recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(|m| m.first()).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Submitted form fields plus the errors found so far.
#[derive(Debug, Clone, Default)]
pub struct Form {
    values: HashMap<String, String>,
    pub errors: FormErrors,
}

impl Form {
    #[must_use]
    pub fn new(values: HashMap<String, String>) -> Self {
        Self {
            values,
            errors: FormErrors::default(),
        }
    }

    /// Value of `field`, or `""` when it was not submitted.
    #[must_use]
    pub fn get(&self, field: &str) -> &str {
        self.values.get(field).map_or("", String::as_str)
    }

    /// First error recorded for `field`, for templates.
    #[must_use]
    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field)
    }

    pub fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    /// Drop a field's value, e.g. so a rejected password is not echoed back.
    pub fn clear(&mut self, field: &str) {
        self.values.remove(field);
    }

    /// Each field must contain something other than whitespace.
    pub fn required(&mut self, fields: &[&str]) {
        for field in fields {
            if self.get(field).trim().is_empty() {
                self.errors.add(field, BLANK);
            }
        }
    }

    /// At most `max` characters (not bytes). Blank values are left to
    /// [`Form::required`].
    pub fn max_length(&mut self, field: &str, max: usize) {
        let value = self.get(field);
        if !value.is_empty() && value.chars().count() > max {
            self.errors.add(
                field,
                format!("This field is too long (maximum is {max} characters)"),
            );
        }
    }

    /// At least `min` characters. Blank values are left to [`Form::required`].
    pub fn min_length(&mut self, field: &str, min: usize) {
        let value = self.get(field);
        if !value.is_empty() && value.chars().count() < min {
            self.errors.add(
                field,
                format!("This field is too short (minimum is {min} characters)"),
            );
        }
    }

    /// Value must be one of `options`.
    pub fn permitted_values(&mut self, field: &str, options: &[&str]) {
        let value = self.get(field);
        if !value.is_empty() && !options.contains(&value) {
            self.errors.add(field, INVALID);
        }
    }

    /// Value must look like an email address.
    pub fn matches_email(&mut self, field: &str) {
        let value = self.get(field).trim();
        if !value.is_empty() && !Email::is_well_formed(value) {
            self.errors.add(field, INVALID);
        }
    }

    /// Whether `field` equals `other`; mismatch is recorded on `field`.
    pub fn matches_field(&mut self, field: &str, other: &str, message: &str) {
        if self.get(field) != self.get(other) {
            self.errors.add(field, message);
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A snippet ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSnippet {
    pub title: String,
    pub content: String,
    pub expires_days: u32,
}

impl NewSnippet {
    pub const EXPIRY_CHOICES: [&'static str; 3] = ["365", "7", "1"];

    /// Validate a snippet submission.
    ///
    /// # Errors
    ///
    /// Returns the form with errors attached when any field is invalid.
    pub fn parse(mut form: Form) -> Result<Self, Form> {
        form.required(&["title", "content", "expires"]);
        form.max_length("title", 100);
        form.permitted_values("expires", &Self::EXPIRY_CHOICES);
        if !form.is_valid() {
            return Err(form);
        }

        let Ok(expires_days) = form.get("expires").parse() else {
            form.add_error("expires", INVALID);
            return Err(form);
        };

        Ok(Self {
            title: form.get("title").to_owned(),
            content: form.get("content").to_owned(),
            expires_days,
        })
    }
}

/// A validated account registration.
#[derive(Debug, Clone)]
pub struct Signup {
    pub name: String,
    pub email: Email,
    pub password: String,
}

impl Signup {
    pub const MIN_PASSWORD_LENGTH: usize = 10;

    /// Validate a signup submission.
    ///
    /// # Errors
    ///
    /// Returns the form with errors attached when any field is invalid.
    pub fn parse(mut form: Form) -> Result<Self, Form> {
        form.required(&["name", "email", "password"]);
        form.max_length("name", 255);
        form.max_length("email", Email::MAX_LENGTH);
        form.matches_email("email");
        form.min_length("password", Self::MIN_PASSWORD_LENGTH);
        if !form.is_valid() {
            return Err(form);
        }

        match Email::parse(form.get("email")) {
            Ok(email) => Ok(Self {
                name: form.get("name").trim().to_owned(),
                email,
                password: form.get("password").to_owned(),
            }),
            Err(_) => {
                form.add_error("email", INVALID);
                Err(form)
            }
        }
    }
}

/// Login credentials. Only checked for presence; the password service
/// decides whether they are right.
#[derive(Debug, Clone)]
pub struct Login {
    pub email: String,
    pub password: String,
}

impl Login {
    /// # Errors
    ///
    /// Returns the form with errors attached when a field is blank.
    pub fn parse(mut form: Form) -> Result<Self, Form> {
        form.required(&["email", "password"]);
        if !form.is_valid() {
            return Err(form);
        }

        Ok(Self {
            email: form.get("email").trim().to_owned(),
            password: form.get("password").to_owned(),
        })
    }
}

/// A validated password change.
#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub current: String,
    pub new: String,
}

impl PasswordChange {
    /// # Errors
    ///
    /// Returns the form with errors attached when any field is invalid.
    pub fn parse(mut form: Form) -> Result<Self, Form> {
        form.required(&["current_password", "new_password", "confirm_password"]);
        form.min_length("new_password", Signup::MIN_PASSWORD_LENGTH);
        if form.error("confirm_password").is_none() {
            form.matches_field("confirm_password", "new_password", PASSWORDS_DIFFER);
        }
        if !form.is_valid() {
            return Err(form);
        }

        Ok(Self {
            current: form.get("current_password").to_owned(),
            new: form.get("new_password").to_owned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> Form {
        Form::new(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        )
    }

    #[test]
    fn test_required_rejects_whitespace() {
        let mut f = form(&[("title", "   "), ("content", "x")]);
        f.required(&["title", "content", "expires"]);
        assert_eq!(f.error("title"), Some(BLANK));
        assert_eq!(f.error("content"), None);
        assert_eq!(f.error("expires"), Some(BLANK));
    }

    #[test]
    fn test_max_length_counts_characters() {
        let fits = "é".repeat(100);
        let mut f = form(&[("title", fits.as_str())]);
        f.max_length("title", 100);
        assert!(f.is_valid());

        let too_long = "é".repeat(101);
        let mut f = form(&[("title", too_long.as_str())]);
        f.max_length("title", 100);
        assert_eq!(
            f.error("title"),
            Some("This field is too long (maximum is 100 characters)")
        );
    }

    #[test]
    fn test_snippet_parse() {
        let snippet = NewSnippet::parse(form(&[
            ("title", "O snail"),
            ("content", "Climb Mount Fuji"),
            ("expires", "7"),
        ]))
        .unwrap();
        assert_eq!(snippet.expires_days, 7);
        assert_eq!(snippet.title, "O snail");
    }

    #[test]
    fn test_snippet_rejects_unknown_expiry() {
        let rejected = NewSnippet::parse(form(&[
            ("title", "O snail"),
            ("content", "Climb Mount Fuji"),
            ("expires", "30"),
        ]))
        .unwrap_err();
        assert_eq!(rejected.error("expires"), Some(INVALID));
        assert_eq!(rejected.get("title"), "O snail");
    }

    #[test]
    fn test_signup_reports_every_problem() {
        let rejected = Signup::parse(form(&[
            ("name", ""),
            ("email", "bob@"),
            ("password", "short"),
        ]))
        .unwrap_err();
        assert_eq!(rejected.error("name"), Some(BLANK));
        assert_eq!(rejected.error("email"), Some(INVALID));
        assert_eq!(
            rejected.error("password"),
            Some("This field is too short (minimum is 10 characters)")
        );
    }

    #[test]
    fn test_signup_parse() {
        let signup = Signup::parse(form(&[
            ("name", " Bob "),
            ("email", "bob@example.com"),
            ("password", "validPa$$word"),
        ]))
        .unwrap();
        assert_eq!(signup.name, "Bob");
        assert_eq!(signup.email.as_str(), "bob@example.com");
    }

    #[test]
    fn test_password_change_requires_matching_confirmation() {
        let rejected = PasswordChange::parse(form(&[
            ("current_password", "old password"),
            ("new_password", "new password 1"),
            ("confirm_password", "new password 2"),
        ]))
        .unwrap_err();
        assert_eq!(rejected.error("confirm_password"), Some(PASSWORDS_DIFFER));
        assert_eq!(rejected.error("new_password"), None);
    }

    #[test]
    fn test_login_only_checks_presence() {
        assert!(Login::parse(form(&[("email", "x"), ("password", "y")])).is_ok());
        let rejected = Login::parse(form(&[("email", "x")])).unwrap_err();
        assert_eq!(rejected.error("password"), Some(BLANK));
    }
}
