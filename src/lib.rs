//! Seeds a PostgreSQL `users` table with fake, unique, password-hashed users
//! in a single all-or-nothing transaction.

pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod store;
pub mod users;
pub mod validation;
