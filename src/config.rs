use std::fmt;

use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

use crate::validation::{join_errors, FieldError};

pub const DEFAULT_DB_PORT: u16 = 5432;

/// Every missing or malformed setting found in one pass over the environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} invalid setting(s): {}", .fields.len(), join_errors(.fields))]
pub struct ConfigError {
    pub fields: Vec<FieldError>,
}

/// Connection parameters and the password pepper for a single run.
#[derive(Clone)]
pub struct Settings {
    pub db_host: String,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub db_port: u16,
    pub salt: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from `DB_*` variables plus the unprefixed `SALT`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut fields = Vec::new();
        let mut required = |key: &'static str| match lookup(key) {
            Some(value) => value,
            None => {
                fields.push(FieldError::new(key, "field required"));
                String::new()
            }
        };

        let db_host = required("DB_HOST");
        let db_user = required("DB_USER");
        let db_password = required("DB_PASSWORD");
        let db_name = required("DB_NAME");
        let salt = required("SALT");

        let db_port = match lookup("DB_PORT") {
            None => DEFAULT_DB_PORT,
            Some(raw) => match raw.trim().parse::<u16>() {
                Ok(port) if port > 0 => port,
                _ => {
                    fields.push(FieldError::new(
                        "DB_PORT",
                        format!("expected a port number, got {raw:?}"),
                    ));
                    DEFAULT_DB_PORT
                }
            },
        };

        if !fields.is_empty() {
            return Err(ConfigError { fields });
        }

        Ok(Self {
            db_host,
            db_user,
            db_password,
            db_name,
            db_port,
            salt,
        })
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_user)
            .password(&self.db_password)
            .database(&self.db_name)
    }

    /// First four characters of the salt, the rest starred out.
    pub fn masked_salt(&self) -> String {
        let head: String = self.salt.chars().take(4).collect();
        format!("{head}****")
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("db_host", &self.db_host)
            .field("db_user", &self.db_user)
            .field("db_password", &"****")
            .field("db_name", &self.db_name)
            .field("db_port", &self.db_port)
            .field("salt", &self.masked_salt())
            .finish()
    }
}
