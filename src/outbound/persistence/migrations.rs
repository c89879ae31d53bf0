//! Embedded SQL migrations.
//!
//! Migrations are compiled into the binary and run over a synchronous
//! connection on a blocking thread, since `diesel_migrations` does not
//! speak `diesel-async`.

use diesel::{Connection, PgConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

/// All migrations under `migrations/`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Errors raised while applying migrations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    /// Could not connect to the database.
    #[error("failed to connect for migrations: {message}")]
    Connection { message: String },

    /// A migration failed to apply.
    #[error("failed to run migrations: {message}")]
    Execution { message: String },
}

/// Apply all pending migrations against the given database.
pub async fn run_migrations(database_url: &str) -> Result<(), MigrationError> {
    let url = database_url.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&url).map_err(|err| MigrationError::Connection {
            message: err.to_string(),
        })?;
        conn.run_pending_migrations(MIGRATIONS)
            .map(|_| ())
            .map_err(|err| MigrationError::Execution {
                message: err.to_string(),
            })
    })
    .await
    .map_err(|err| MigrationError::Execution {
        message: err.to_string(),
    })?
}
