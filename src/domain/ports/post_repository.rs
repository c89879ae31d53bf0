//! Port abstraction for post persistence adapters and their errors.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::identity::IdentityId;
use crate::domain::post::{Post, PostBody, PostId};

/// Persistence errors raised by post repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostRepositoryError {
    /// The owning identity does not exist (foreign key violation).
    #[error("post author does not exist")]
    AuthorMissing,

    /// Repository connection could not be established.
    #[error("post repository connection failed: {message}")]
    Connection { message: String },

    /// Query or mutation failed during execution.
    #[error("post repository query failed: {message}")]
    Query { message: String },
}

impl PostRepositoryError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Driven port for post persistence.
///
/// All read operations return a fresh consistent snapshot ordered newest
/// first; each call re-queries the store rather than serving cached state.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post; `created_at` is assigned by the store.
    async fn insert(
        &self,
        id: PostId,
        author: IdentityId,
        body: PostBody,
    ) -> Result<Post, PostRepositoryError>;

    /// Fetch a single post by id.
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PostRepositoryError>;

    /// Posts by one author, newest first, truncated to `limit`.
    async fn by_author(
        &self,
        author: IdentityId,
        limit: usize,
    ) -> Result<Vec<Post>, PostRepositoryError>;

    /// Posts by any of the given authors as one globally time-sorted
    /// sequence, newest first, truncated to `limit`.
    ///
    /// This is a single ordered query, not a per-author fetch that gets
    /// concatenated, so interleaving across authors is correct.
    async fn by_authors(
        &self,
        authors: &[IdentityId],
        limit: usize,
    ) -> Result<Vec<Post>, PostRepositoryError>;

    /// Posts across all authors, newest first, truncated to `limit`.
    async fn recent(&self, limit: usize) -> Result<Vec<Post>, PostRepositoryError>;
}

/// In-memory post store for tests and development wiring.
///
/// Assigns `created_at` at insert time and keeps an insertion sequence so
/// same-instant posts still order deterministically, newest first.
#[derive(Default)]
pub struct FixturePostRepository {
    posts: Mutex<Vec<(u64, Post)>>,
}

impl FixturePostRepository {
    /// Create an empty fixture store.
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot_newest_first(&self) -> Vec<Post> {
        let posts = self.posts.lock().expect("fixture lock");
        let mut ordered: Vec<(u64, Post)> = posts.clone();
        ordered.sort_by(|(seq_a, post_a), (seq_b, post_b)| {
            post_b
                .created_at()
                .cmp(&post_a.created_at())
                .then(seq_b.cmp(seq_a))
        });
        ordered.into_iter().map(|(_, post)| post).collect()
    }
}

#[async_trait]
impl PostRepository for FixturePostRepository {
    async fn insert(
        &self,
        id: PostId,
        author: IdentityId,
        body: PostBody,
    ) -> Result<Post, PostRepositoryError> {
        let mut posts = self.posts.lock().expect("fixture lock");
        let seq = posts.last().map_or(0, |(seq, _)| seq + 1);
        let post = Post::new(id, author, body, Utc::now());
        posts.push((seq, post.clone()));
        Ok(post)
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PostRepositoryError> {
        let posts = self.posts.lock().expect("fixture lock");
        Ok(posts
            .iter()
            .find(|(_, post)| post.id() == id)
            .map(|(_, post)| post.clone()))
    }

    async fn by_author(
        &self,
        author: IdentityId,
        limit: usize,
    ) -> Result<Vec<Post>, PostRepositoryError> {
        Ok(self
            .snapshot_newest_first()
            .into_iter()
            .filter(|post| post.author() == author)
            .take(limit)
            .collect())
    }

    async fn by_authors(
        &self,
        authors: &[IdentityId],
        limit: usize,
    ) -> Result<Vec<Post>, PostRepositoryError> {
        Ok(self
            .snapshot_newest_first()
            .into_iter()
            .filter(|post| authors.contains(&post.author()))
            .take(limit)
            .collect())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Post>, PostRepositoryError> {
        Ok(self.snapshot_newest_first().into_iter().take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    //! Contract coverage for the fixture post store.
    use super::*;

    async fn publish(repo: &FixturePostRepository, author: IdentityId, text: &str) -> Post {
        repo.insert(
            PostId::random(),
            author,
            PostBody::new(text).expect("valid body"),
        )
        .await
        .expect("insert succeeds")
    }

    #[tokio::test]
    async fn reads_are_newest_first() {
        let repo = FixturePostRepository::new();
        let author = IdentityId::random();
        publish(&repo, author, "first").await;
        publish(&repo, author, "second").await;
        publish(&repo, author, "third").await;

        let posts = repo.by_author(author, 10).await.expect("query ok");
        let bodies: Vec<&str> = posts.iter().map(|post| post.body().as_ref()).collect();
        assert_eq!(bodies, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn by_authors_interleaves_across_authors() {
        let repo = FixturePostRepository::new();
        let (a, b) = (IdentityId::random(), IdentityId::random());
        publish(&repo, a, "a1").await;
        publish(&repo, b, "b1").await;
        publish(&repo, a, "a2").await;

        let posts = repo.by_authors(&[a, b], 10).await.expect("query ok");
        let bodies: Vec<&str> = posts.iter().map(|post| post.body().as_ref()).collect();
        assert_eq!(bodies, vec!["a2", "b1", "a1"]);
    }

    #[tokio::test]
    async fn limits_truncate_after_ordering() {
        let repo = FixturePostRepository::new();
        let author = IdentityId::random();
        for n in 0..5 {
            publish(&repo, author, &format!("post {n}")).await;
        }

        let posts = repo.recent(2).await.expect("query ok");
        let bodies: Vec<&str> = posts.iter().map(|post| post.body().as_ref()).collect();
        assert_eq!(bodies, vec!["post 4", "post 3"]);
    }

    #[tokio::test]
    async fn find_by_id_round_trips() {
        let repo = FixturePostRepository::new();
        let post = publish(&repo, IdentityId::random(), "hello").await;

        let found = repo.find_by_id(post.id()).await.expect("query ok");
        assert_eq!(found, Some(post));
        assert!(repo.find_by_id(PostId::random()).await.expect("query ok").is_none());
    }
}
