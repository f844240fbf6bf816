use std::collections::HashSet;

use crate::store::{StoreError, UserTx};
use crate::users::repo_types::Candidate;

/// Emails and usernames already taken, either in the table or earlier in
/// this batch. Only ever grows.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    emails: HashSet<String>,
    usernames: HashSet<String>,
}

impl DuplicateIndex {
    /// Snapshots the table once, inside the run's transaction.
    pub async fn load(tx: &mut dyn UserTx) -> Result<Self, StoreError> {
        Ok(tx.existing_keys().await?.into_iter().collect())
    }

    pub fn contains_email(&self, email: &str) -> bool {
        self.emails.contains(email)
    }

    pub fn contains_username(&self, username: &str) -> bool {
        self.usernames.contains(username)
    }

    /// True when neither the email nor the username is taken.
    pub fn admits(&self, candidate: &Candidate) -> bool {
        !self.contains_email(&candidate.email) && !self.contains_username(&candidate.username)
    }

    pub fn register(&mut self, candidate: &Candidate) {
        self.emails.insert(candidate.email.clone());
        self.usernames.insert(candidate.username.clone());
    }

    pub fn email_count(&self) -> usize {
        self.emails.len()
    }

    pub fn username_count(&self) -> usize {
        self.usernames.len()
    }
}

impl FromIterator<(String, String)> for DuplicateIndex {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut index = Self::default();
        for (email, username) in iter {
            index.emails.insert(email);
            index.usernames.insert(username);
        }
        index
    }
}
