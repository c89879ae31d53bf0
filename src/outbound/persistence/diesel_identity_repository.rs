//! PostgreSQL-backed `IdentityRepository` implementation using Diesel.
//!
//! Inserts rely on the table's unique indexes rather than pre-checks; a
//! uniqueness violation reported by PostgreSQL is translated into the
//! matching duplicate error so concurrent identical registrations collapse
//! to one account and one clean conflict.

use async_trait::async_trait;
use diesel::define_sql_function;
use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel_async::RunQueryDsl;

use crate::domain::credential::PasswordCredential;
use crate::domain::identity::{EmailAddress, Identity, IdentityId, Username};
use crate::domain::ports::{IdentityRepository, IdentityRepositoryError, NewIdentityRecord};

use super::diesel_helpers::{
    classify_unique_violation, log_diesel_error, pool_error_message, UniqueViolationTarget,
};
use super::models::{IdentityRow, NewIdentityRow};
use super::pool::DbPool;
use super::schema::identities;

define_sql_function! {
    /// SQL `lower()`, used for the named case-insensitive username lookup.
    fn lower(input: Text) -> Text;
}

/// Diesel-backed implementation of the `IdentityRepository` port.
#[derive(Clone)]
pub struct DieselIdentityRepository {
    pool: DbPool,
}

impl DieselIdentityRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: super::pool::PoolError) -> IdentityRepositoryError {
    IdentityRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error, operation: &str) -> IdentityRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    log_diesel_error(&error, operation);

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            match classify_unique_violation(info.message(), info.constraint_name()) {
                UniqueViolationTarget::Username => IdentityRepositoryError::DuplicateUsername,
                UniqueViolationTarget::Email => IdentityRepositoryError::DuplicateEmail,
                UniqueViolationTarget::Other => {
                    IdentityRepositoryError::query("unexpected unique violation")
                }
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            IdentityRepositoryError::connection("database connection error")
        }
        _ => IdentityRepositoryError::query("database error"),
    }
}

/// Convert a database row to a domain identity.
///
/// Rows were validated on the way in, so a failure here means the stored
/// data is corrupted and surfaces as a query error.
fn row_to_identity(row: IdentityRow) -> Result<Identity, IdentityRepositoryError> {
    let username = Username::new(row.username).map_err(|err| {
        IdentityRepositoryError::query(format!("corrupted username in database: {err}"))
    })?;
    let email = EmailAddress::new(row.email).map_err(|err| {
        IdentityRepositoryError::query(format!("corrupted email in database: {err}"))
    })?;
    Ok(Identity::new(
        IdentityId::from_uuid(row.id),
        username,
        email,
        row.created_at,
    ))
}

#[async_trait]
impl IdentityRepository for DieselIdentityRepository {
    async fn insert(&self, record: NewIdentityRecord) -> Result<Identity, IdentityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewIdentityRow {
            id: *record.id.as_uuid(),
            username: record.username.as_ref(),
            email: record.email.as_ref(),
            credential: record.credential.as_str(),
        };

        let stored: IdentityRow = diesel::insert_into(identities::table)
            .values(&row)
            .returning(IdentityRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "insert identity"))?;

        row_to_identity(stored)
    }

    async fn find_by_id(
        &self,
        id: IdentityId,
    ) -> Result<Option<Identity>, IdentityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let result: Option<IdentityRow> = identities::table
            .find(id.as_uuid())
            .select(IdentityRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "find identity by id"))?;

        result.map(row_to_identity).transpose()
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, IdentityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let result: Option<IdentityRow> = identities::table
            .filter(lower(identities::username).eq(username.to_lowercase()))
            .select(IdentityRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "find identity by username"))?;

        result.map(row_to_identity).transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Identity>, IdentityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let result: Option<IdentityRow> = identities::table
            .filter(identities::email.eq(email.as_ref()))
            .select(IdentityRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "find identity by email"))?;

        result.map(row_to_identity).transpose()
    }

    async fn find_for_login(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<(Identity, PasswordCredential)>, IdentityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let result: Option<IdentityRow> = identities::table
            .filter(identities::email.eq(email.as_ref()))
            .select(IdentityRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "find identity for login"))?;

        result
            .map(|row| {
                let credential = PasswordCredential::from_stored(row.credential.clone());
                row_to_identity(row).map(|identity| (identity, credential))
            })
            .transpose()
    }
}
