//! PostgreSQL-backed `PostRepository` implementation using Diesel.
//!
//! `created_at` is assigned by the database (`now()`), so ordering reflects
//! insertion order at the store. All reads order by `(created_at DESC,
//! id DESC)`; the id tiebreak keeps same-instant posts deterministic.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::identity::IdentityId;
use crate::domain::post::{Post, PostBody, PostId};
use crate::domain::ports::{PostRepository, PostRepositoryError};

use super::diesel_helpers::{log_diesel_error, pool_error_message};
use super::models::{NewPostRow, PostRow};
use super::pool::DbPool;
use super::schema::posts;

/// Diesel-backed implementation of the `PostRepository` port.
#[derive(Clone)]
pub struct DieselPostRepository {
    pool: DbPool,
}

impl DieselPostRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: super::pool::PoolError) -> PostRepositoryError {
    PostRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error, operation: &str) -> PostRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    log_diesel_error(&error, operation);

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            PostRepositoryError::AuthorMissing
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            PostRepositoryError::connection("database connection error")
        }
        _ => PostRepositoryError::query("database error"),
    }
}

fn row_to_post(row: PostRow) -> Result<Post, PostRepositoryError> {
    let body = PostBody::new(row.body)
        .map_err(|err| PostRepositoryError::query(format!("corrupted post body in database: {err}")))?;
    Ok(Post::new(
        PostId::from_uuid(row.id),
        IdentityId::from_uuid(row.author_id),
        body,
        row.created_at,
    ))
}

fn rows_to_posts(rows: Vec<PostRow>) -> Result<Vec<Post>, PostRepositoryError> {
    rows.into_iter().map(row_to_post).collect()
}

fn clamp_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl PostRepository for DieselPostRepository {
    async fn insert(
        &self,
        id: PostId,
        author: IdentityId,
        body: PostBody,
    ) -> Result<Post, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewPostRow {
            id: *id.as_uuid(),
            author_id: *author.as_uuid(),
            body: body.as_ref(),
        };

        let stored: PostRow = diesel::insert_into(posts::table)
            .values(&row)
            .returning(PostRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "insert post"))?;

        row_to_post(stored)
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let result: Option<PostRow> = posts::table
            .find(id.as_uuid())
            .select(PostRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "find post by id"))?;

        result.map(row_to_post).transpose()
    }

    async fn by_author(
        &self,
        author: IdentityId,
        limit: usize,
    ) -> Result<Vec<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<PostRow> = posts::table
            .filter(posts::author_id.eq(author.as_uuid()))
            .order((posts::created_at.desc(), posts::id.desc()))
            .limit(clamp_limit(limit))
            .select(PostRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "list posts by author"))?;

        rows_to_posts(rows)
    }

    async fn by_authors(
        &self,
        authors: &[IdentityId],
        limit: usize,
    ) -> Result<Vec<Post>, PostRepositoryError> {
        if authors.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let author_ids: Vec<uuid::Uuid> = authors.iter().map(|id| *id.as_uuid()).collect();

        // One ordered query across all authors gives the globally
        // time-sorted interleaving the stream contract requires.
        let rows: Vec<PostRow> = posts::table
            .filter(posts::author_id.eq_any(author_ids))
            .order((posts::created_at.desc(), posts::id.desc()))
            .limit(clamp_limit(limit))
            .select(PostRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "list posts by authors"))?;

        rows_to_posts(rows)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<PostRow> = posts::table
            .order((posts::created_at.desc(), posts::id.desc()))
            .limit(clamp_limit(limit))
            .select(PostRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "list recent posts"))?;

        rows_to_posts(rows)
    }
}
