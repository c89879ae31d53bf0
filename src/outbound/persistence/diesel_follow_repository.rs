//! PostgreSQL-backed `FollowRepository` implementation using Diesel.
//!
//! Edge mutations are single atomic statements guarded by the composite
//! primary key. A duplicate follow is absorbed by `ON CONFLICT DO NOTHING`
//! (and a racing unique violation is normalized to success, honoring the
//! idempotency contract); deleting a missing edge simply affects zero rows.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::identity::IdentityId;
use crate::domain::ports::{FollowRepository, FollowRepositoryError};

use super::diesel_helpers::{log_diesel_error, pool_error_message};
use super::models::NewFollowRow;
use super::pool::DbPool;
use super::schema::follows;

/// Diesel-backed implementation of the `FollowRepository` port.
#[derive(Clone)]
pub struct DieselFollowRepository {
    pool: DbPool,
}

impl DieselFollowRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: super::pool::PoolError) -> FollowRepositoryError {
    FollowRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error, operation: &str) -> FollowRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    log_diesel_error(&error, operation);

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            // The source is authenticated and therefore exists; a foreign
            // key failure means the target id did not resolve.
            let constraint = info.constraint_name().unwrap_or_default();
            if constraint.contains("target") || info.message().contains("target") {
                FollowRepositoryError::TargetMissing
            } else {
                FollowRepositoryError::query("foreign key violation")
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            FollowRepositoryError::connection("database connection error")
        }
        _ => FollowRepositoryError::query("database error"),
    }
}

#[async_trait]
impl FollowRepository for DieselFollowRepository {
    async fn insert_edge(
        &self,
        source: IdentityId,
        target: IdentityId,
    ) -> Result<(), FollowRepositoryError> {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewFollowRow {
            source_id: *source.as_uuid(),
            target_id: *target.as_uuid(),
        };

        let result = diesel::insert_into(follows::table)
            .values(&row)
            .on_conflict((follows::source_id, follows::target_id))
            .do_nothing()
            .execute(&mut conn)
            .await;

        match result {
            Ok(_) => Ok(()),
            // Unique violation despite ON CONFLICT means a concurrent
            // insert won the race; the edge exists, which is the outcome
            // the caller asked for.
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Ok(()),
            Err(err) => Err(map_diesel_error(err, "insert follow edge")),
        }
    }

    async fn remove_edge(
        &self,
        source: IdentityId,
        target: IdentityId,
    ) -> Result<(), FollowRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // Zero affected rows is the idempotent no-op, not an error.
        diesel::delete(follows::table.find((source.as_uuid(), target.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "remove follow edge"))?;
        Ok(())
    }

    async fn is_following(
        &self,
        source: IdentityId,
        target: IdentityId,
    ) -> Result<bool, FollowRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(exists(
            follows::table.find((source.as_uuid(), target.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(|err| map_diesel_error(err, "check follow edge"))
    }

    async fn followees(
        &self,
        source: IdentityId,
    ) -> Result<Vec<IdentityId>, FollowRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let ids: Vec<Uuid> = follows::table
            .filter(follows::source_id.eq(source.as_uuid()))
            .select(follows::target_id)
            .order(follows::target_id.asc())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "list followees"))?;

        Ok(ids.into_iter().map(IdentityId::from_uuid).collect())
    }

    async fn followers(
        &self,
        target: IdentityId,
    ) -> Result<Vec<IdentityId>, FollowRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let ids: Vec<Uuid> = follows::table
            .filter(follows::target_id.eq(target.as_uuid()))
            .select(follows::source_id)
            .order(follows::source_id.asc())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "list followers"))?;

        Ok(ids.into_iter().map(IdentityId::from_uuid).collect())
    }
}
