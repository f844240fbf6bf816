use std::fmt;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::password::SecretHash;
use crate::validation::{check_email, check_name, check_secret, check_username, FieldError};

/// `(email, username)` pairs already present in the table.
pub type ExistingKeys = Vec<(String, String)>;

/// A drawn user that still carries its plaintext password.
#[derive(Clone, PartialEq, Eq)]
pub struct Candidate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

impl Candidate {
    /// Checks every field against the column constraints of `users`.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_name("first_name", &self.first_name, &mut errors);
        check_name("last_name", &self.last_name, &mut errors);
        check_email(&self.email, &mut errors);
        check_username(&self.username, &mut errors);
        check_secret(&self.password, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

/// A row ready for insertion into `users`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,                   // assigned once, never changed
    pub first_name: String,
    pub last_name: String,
    pub email: String,              // unique
    pub username: String,           // unique
    pub password_hash: SecretHash,  // Argon2 PHC string
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl NewUser {
    /// Consumes the candidate so its plaintext password goes out of scope here.
    pub fn from_candidate(candidate: Candidate, password_hash: SecretHash, now: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: candidate.first_name,
            last_name: candidate.last_name,
            email: candidate.email,
            username: candidate.username,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}
