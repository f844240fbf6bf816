use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

/// Column widths of the `users` table.
pub const NAME_MAX: usize = 50;
pub const EMAIL_MAX: usize = 120;
pub const USERNAME_MAX: usize = 50;

/// Shortest plaintext secret the generator may hand to the hasher.
pub const SECRET_MIN: usize = 12;

/// A single rejected field, with the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

pub fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn check_name(field: &'static str, value: &str, errors: &mut Vec<FieldError>) {
    let len = value.chars().count();
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "must not be blank"));
    } else if len > NAME_MAX {
        errors.push(FieldError::new(
            field,
            format!("must be at most {NAME_MAX} characters, got {len}"),
        ));
    }
}

pub fn check_email(value: &str, errors: &mut Vec<FieldError>) {
    let len = value.chars().count();
    if len > EMAIL_MAX {
        errors.push(FieldError::new(
            "email",
            format!("must be at most {EMAIL_MAX} characters, got {len}"),
        ));
    }
    if !is_valid_email(value) {
        errors.push(FieldError::new("email", "not a valid email address"));
    }
}

pub fn check_username(value: &str, errors: &mut Vec<FieldError>) {
    let len = value.chars().count();
    if len == 0 {
        errors.push(FieldError::new("username", "must not be empty"));
    } else if len > USERNAME_MAX {
        errors.push(FieldError::new(
            "username",
            format!("must be at most {USERNAME_MAX} characters, got {len}"),
        ));
    }
    if value.chars().any(char::is_whitespace) {
        errors.push(FieldError::new("username", "must not contain whitespace"));
    }
}

pub fn check_secret(value: &str, errors: &mut Vec<FieldError>) {
    let len = value.chars().count();
    if len < SECRET_MIN {
        errors.push(FieldError::new(
            "password",
            format!("must be at least {SECRET_MIN} characters, got {len}"),
        ));
    }
}
