use std::process::ExitCode;

use tracing::{error, info};

use crate::cli::Cli;
use crate::config::{ConfigError, Settings};
use crate::store::Connect;
use crate::users::generator::FakerSource;
use crate::users::password::SecretHasher;
use crate::users::services::seed_users;

pub const EXIT_CONFIG: u8 = 1;
pub const EXIT_SEED_FAILED: u8 = 2;

/// One seeding run: settings, connect, schema, seed, close.
///
/// Settings are checked before anything touches the database, so a bad
/// environment never opens a connection.
pub async fn run(
    cli: &Cli,
    settings: Result<Settings, ConfigError>,
    connector: &dyn Connect,
) -> ExitCode {
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration Error:\n{e}");
            error!(error = %e, "configuration error");
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    info!(
        db_host = %settings.db_host,
        db_user = %settings.db_user,
        salt = %settings.masked_salt(),
        "loaded settings"
    );

    let store = match connector.connect(&settings).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = ?e, "could not open database session");
            return ExitCode::from(EXIT_SEED_FAILED);
        }
    };

    info!("creating tables if they don't exist");
    let code = match store.ensure_schema().await {
        Err(e) => {
            error!(error = %e, "schema creation failed");
            ExitCode::from(EXIT_SEED_FAILED)
        }
        Ok(()) => {
            let hasher = SecretHasher::new(settings.salt.as_str());
            match seed_users(store.as_ref(), &hasher, FakerSource::from_entropy(), cli.number).await {
                Ok(report) => {
                    info!(
                        inserted = report.inserted,
                        existing = report.existing,
                        "successfully added {} users to the database",
                        report.inserted
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(category = e.category(), error = %e, "seeding failed; no users were added");
                    ExitCode::from(EXIT_SEED_FAILED)
                }
            }
        }
    };

    store.close().await;
    info!("session closed");
    code
}
