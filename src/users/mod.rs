pub mod committer;
pub mod generator;
pub mod index;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
