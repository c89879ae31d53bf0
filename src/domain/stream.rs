//! Post publication and stream aggregation.
//!
//! The aggregator is a stateless query composition over the identity,
//! follow, and post stores; nothing here caches mutable state between
//! calls, so every read reflects a fresh snapshot.

use std::sync::Arc;

use tracing::debug;

use crate::domain::identity::IdentityId;
use crate::domain::post::{Post, PostBody, PostId, PostValidationError};
use crate::domain::ports::{
    FollowRepository, FollowRepositoryError, IdentityRepository, IdentityRepositoryError,
    PostRepository, PostRepositoryError,
};
use crate::domain::Error;

/// Result cap applied when the caller does not supply one.
pub const DEFAULT_STREAM_LIMIT: usize = 100;

/// Stream service over the identity, follow, and post repository ports.
#[derive(Clone)]
pub struct StreamService {
    identities: Arc<dyn IdentityRepository>,
    follows: Arc<dyn FollowRepository>,
    posts: Arc<dyn PostRepository>,
}

impl StreamService {
    /// Create a new service backed by the given repositories.
    pub fn new(
        identities: Arc<dyn IdentityRepository>,
        follows: Arc<dyn FollowRepository>,
        posts: Arc<dyn PostRepository>,
    ) -> Self {
        Self {
            identities,
            follows,
            posts,
        }
    }

    /// Publish a post as `author`.
    ///
    /// The body is trimmed; an empty result is [`Error::invalid_request`].
    /// The author is assumed authenticated and existing; a foreign-key
    /// failure still maps to a not-found rather than an internal error.
    pub async fn publish(&self, author: IdentityId, content: &str) -> Result<Post, Error> {
        let body = PostBody::new(content).map_err(|err| match err {
            PostValidationError::EmptyBody => Error::invalid_request("post body must not be empty"),
        })?;

        let post = self
            .posts
            .insert(PostId::random(), author, body)
            .await
            .map_err(map_post_error)?;
        debug!(post_id = %post.id(), %author, "post published");
        Ok(post)
    }

    /// All posts system-wide, newest first, truncated to `limit`
    /// (default [`DEFAULT_STREAM_LIMIT`]).
    pub async fn global_stream(&self, limit: Option<usize>) -> Result<Vec<Post>, Error> {
        self.posts
            .recent(limit.unwrap_or(DEFAULT_STREAM_LIMIT))
            .await
            .map_err(map_post_error)
    }

    /// The stream visible to a viewer, with two modes.
    ///
    /// With no profile (or a profile resolving to the viewer themself) this
    /// is the following stream: the viewer's own posts unioned with every
    /// followee's, as one globally time-sorted sequence. With a different
    /// profile it is that identity's posts only; an unknown profile is
    /// [`Error::not_found`]. An anonymous viewer without a profile falls
    /// back to the global stream.
    pub async fn user_stream(
        &self,
        viewer: Option<IdentityId>,
        profile_username: Option<&str>,
    ) -> Result<Vec<Post>, Error> {
        let limit = DEFAULT_STREAM_LIMIT;

        if let Some(username) = profile_username {
            let profile = self
                .identities
                .find_by_username(username)
                .await
                .map_err(map_identity_error)?
                .ok_or_else(|| Error::not_found("no such identity"))?;

            if viewer != Some(profile.id()) {
                return self
                    .posts
                    .by_author(profile.id(), limit)
                    .await
                    .map_err(map_post_error);
            }
        }

        let Some(viewer) = viewer else {
            return self.global_stream(None).await;
        };

        let mut authors = self
            .follows
            .followees(viewer)
            .await
            .map_err(map_follow_error)?;
        authors.push(viewer);

        // One ordered query across all authors; per-followee fetches would
        // group by author instead of interleaving chronologically.
        self.posts
            .by_authors(&authors, limit)
            .await
            .map_err(map_post_error)
    }

    /// Fetch a single post by id.
    pub async fn post(&self, id: PostId) -> Result<Post, Error> {
        self.posts
            .find_by_id(id)
            .await
            .map_err(map_post_error)?
            .ok_or_else(|| Error::not_found("no such post"))
    }
}

fn map_identity_error(error: IdentityRepositoryError) -> Error {
    match error {
        IdentityRepositoryError::Connection { message } => Error::service_unavailable(message),
        other => Error::internal(other.to_string()),
    }
}

fn map_follow_error(error: FollowRepositoryError) -> Error {
    match error {
        FollowRepositoryError::Connection { message } => Error::service_unavailable(message),
        other => Error::internal(other.to_string()),
    }
}

fn map_post_error(error: PostRepositoryError) -> Error {
    match error {
        PostRepositoryError::AuthorMissing => Error::not_found("no such identity"),
        PostRepositoryError::Connection { message } => Error::service_unavailable(message),
        PostRepositoryError::Query { message } => Error::internal(message),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::follow_graph::FollowService;
    use crate::domain::identity::{Identity, RegistrationRequest};
    use crate::domain::ports::{
        FixtureFollowRepository, FixtureIdentityRepository, FixturePostRepository,
    };
    use crate::domain::registration::RegistrationService;
    use crate::domain::ErrorCode;

    struct World {
        streams: StreamService,
        follows: FollowService,
        juan: Identity,
        maria: Identity,
        pedro: Identity,
    }

    async fn world() -> World {
        let identities = Arc::new(FixtureIdentityRepository::new());
        let follow_repo = Arc::new(FixtureFollowRepository::new());
        let posts = Arc::new(FixturePostRepository::new());
        let registration = RegistrationService::new(identities.clone());

        let mut registered = Vec::new();
        for (username, email) in [
            ("juan", "juan@example.com"),
            ("maria", "maria@example.com"),
            ("pedro", "pedro@example.com"),
        ] {
            registered.push(
                registration
                    .register(
                        RegistrationRequest::try_from_parts(username, email, "shared-password")
                            .expect("valid request"),
                    )
                    .await
                    .expect("registration succeeds"),
            );
        }
        let pedro = registered.pop().expect("pedro");
        let maria = registered.pop().expect("maria");
        let juan = registered.pop().expect("juan");

        World {
            streams: StreamService::new(identities.clone(), follow_repo.clone(), posts),
            follows: FollowService::new(identities, follow_repo),
            juan,
            maria,
            pedro,
        }
    }

    fn bodies(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|post| post.body().as_ref()).collect()
    }

    #[tokio::test]
    async fn publish_trims_and_rejects_blank_content() {
        let world = world().await;
        let post = world
            .streams
            .publish(world.juan.id(), "  hello world  ")
            .await
            .expect("publish succeeds");
        assert_eq!(post.body().as_ref(), "hello world");

        let err = world
            .streams
            .publish(world.juan.id(), "   \n ")
            .await
            .expect_err("blank content must fail");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn following_stream_unions_self_and_followees() {
        let world = world().await;
        world.follows.follow(world.juan.id(), "maria").await.expect("follow maria");
        world.follows.follow(world.juan.id(), "pedro").await.expect("follow pedro");

        world.streams.publish(world.juan.id(), "from juan").await.expect("publish");
        world.streams.publish(world.maria.id(), "from maria").await.expect("publish");
        world.streams.publish(world.pedro.id(), "from pedro").await.expect("publish");

        let stream = world
            .streams
            .user_stream(Some(world.juan.id()), None)
            .await
            .expect("stream ok");
        assert_eq!(bodies(&stream), vec!["from pedro", "from maria", "from juan"]);
    }

    #[tokio::test]
    async fn unfollowing_removes_the_followee_from_the_next_read() {
        let world = world().await;
        world.follows.follow(world.juan.id(), "maria").await.expect("follow");
        world.streams.publish(world.maria.id(), "from maria").await.expect("publish");
        world.streams.publish(world.juan.id(), "from juan").await.expect("publish");

        world.follows.unfollow(world.juan.id(), "maria").await.expect("unfollow");

        let stream = world
            .streams
            .user_stream(Some(world.juan.id()), None)
            .await
            .expect("stream ok");
        assert_eq!(bodies(&stream), vec!["from juan"]);
    }

    #[tokio::test]
    async fn profile_stream_shows_only_that_identity() {
        let world = world().await;
        world.streams.publish(world.juan.id(), "from juan").await.expect("publish");
        world.streams.publish(world.maria.id(), "from maria").await.expect("publish");

        let stream = world
            .streams
            .user_stream(Some(world.juan.id()), Some("Maria"))
            .await
            .expect("stream ok");
        assert_eq!(bodies(&stream), vec!["from maria"]);
    }

    #[tokio::test]
    async fn own_profile_falls_back_to_following_stream() {
        let world = world().await;
        world.follows.follow(world.juan.id(), "maria").await.expect("follow");
        world.streams.publish(world.maria.id(), "from maria").await.expect("publish");

        let stream = world
            .streams
            .user_stream(Some(world.juan.id()), Some("juan"))
            .await
            .expect("stream ok");
        assert_eq!(bodies(&stream), vec!["from maria"]);
    }

    #[tokio::test]
    async fn unknown_profile_is_not_found() {
        let world = world().await;
        let err = world
            .streams
            .user_stream(Some(world.juan.id()), Some("ghost"))
            .await
            .expect_err("unknown profile must fail");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn anonymous_viewer_without_profile_reads_the_global_stream() {
        let world = world().await;
        world.streams.publish(world.juan.id(), "one").await.expect("publish");
        world.streams.publish(world.maria.id(), "two").await.expect("publish");

        let stream = world.streams.user_stream(None, None).await.expect("stream ok");
        assert_eq!(bodies(&stream), vec!["two", "one"]);
    }

    #[tokio::test]
    async fn global_stream_respects_the_limit() {
        let world = world().await;
        for n in 0..5 {
            world
                .streams
                .publish(world.juan.id(), &format!("post {n}"))
                .await
                .expect("publish");
        }

        let capped = world.streams.global_stream(Some(3)).await.expect("stream ok");
        assert_eq!(bodies(&capped), vec!["post 4", "post 3", "post 2"]);
    }

    #[tokio::test]
    async fn single_post_read_round_trips() {
        let world = world().await;
        let post = world.streams.publish(world.juan.id(), "hello").await.expect("publish");

        let fetched = world.streams.post(post.id()).await.expect("read ok");
        assert_eq!(fetched, post);

        let err = world
            .streams
            .post(PostId::random())
            .await
            .expect_err("unknown post must fail");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
