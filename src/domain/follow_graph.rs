//! Follow/unfollow use-cases.
//!
//! The external interface addresses follow targets by username; this
//! service resolves the handle case-insensitively, rejects self-follow, and
//! delegates the idempotent edge mutation to the follow repository. The
//! viewer id is always passed explicitly by the caller; an unauthenticated
//! caller has no business reaching these operations.

use std::sync::Arc;

use tracing::debug;

use crate::domain::identity::IdentityId;
use crate::domain::ports::{
    FollowRepository, FollowRepositoryError, IdentityRepository, IdentityRepositoryError,
};
use crate::domain::Error;

/// Follow-graph service over the identity and follow repository ports.
#[derive(Clone)]
pub struct FollowService {
    identities: Arc<dyn IdentityRepository>,
    follows: Arc<dyn FollowRepository>,
}

impl FollowService {
    /// Create a new service backed by the given repositories.
    pub fn new(identities: Arc<dyn IdentityRepository>, follows: Arc<dyn FollowRepository>) -> Self {
        Self { identities, follows }
    }

    /// Follow `target_username` as `viewer`.
    ///
    /// Idempotent: following an already-followed identity succeeds without
    /// creating a second edge. Fails with [`Error::not_found`] when the
    /// username does not resolve and [`Error::invalid_request`] for
    /// self-follow.
    pub async fn follow(&self, viewer: IdentityId, target_username: &str) -> Result<(), Error> {
        let target = self.resolve(target_username).await?;
        if target == viewer {
            return Err(Error::invalid_request("cannot follow yourself"));
        }

        self.follows
            .insert_edge(viewer, target)
            .await
            .map_err(map_follow_error)?;
        debug!(%viewer, %target, "follow edge ensured");
        Ok(())
    }

    /// Unfollow `target_username` as `viewer`.
    ///
    /// Idempotent: removing a follow that does not exist succeeds and
    /// leaves the graph unchanged. Still fails with [`Error::not_found`]
    /// when the username does not resolve, so callers learn about typos.
    pub async fn unfollow(&self, viewer: IdentityId, target_username: &str) -> Result<(), Error> {
        let target = self.resolve(target_username).await?;
        self.follows
            .remove_edge(viewer, target)
            .await
            .map_err(map_follow_error)?;
        debug!(%viewer, %target, "follow edge removed");
        Ok(())
    }

    /// Whether `viewer` currently follows `target_username`.
    pub async fn is_following(
        &self,
        viewer: IdentityId,
        target_username: &str,
    ) -> Result<bool, Error> {
        let target = self.resolve(target_username).await?;
        self.follows
            .is_following(viewer, target)
            .await
            .map_err(map_follow_error)
    }

    /// Identities the given identity follows.
    pub async fn followees(&self, source: IdentityId) -> Result<Vec<IdentityId>, Error> {
        self.follows.followees(source).await.map_err(map_follow_error)
    }

    /// Identities following the given identity.
    pub async fn followers(&self, target: IdentityId) -> Result<Vec<IdentityId>, Error> {
        self.follows.followers(target).await.map_err(map_follow_error)
    }

    async fn resolve(&self, username: &str) -> Result<IdentityId, Error> {
        let identity = self
            .identities
            .find_by_username(username)
            .await
            .map_err(map_identity_error)?
            .ok_or_else(|| Error::not_found("no such identity"))?;
        Ok(identity.id())
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
        // The username resolved a moment ago; a foreign-key failure here
        // means the target vanished between the two statements.
        FollowRepositoryError::TargetMissing => Error::not_found("no such identity"),
        FollowRepositoryError::Connection { message } => Error::service_unavailable(message),
        FollowRepositoryError::Query { message } => Error::internal(message),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::identity::{Identity, RegistrationRequest};
    use crate::domain::ports::{FixtureFollowRepository, FixtureIdentityRepository};
    use crate::domain::registration::RegistrationService;
    use crate::domain::ErrorCode;

    struct Graph {
        service: FollowService,
        follows: Arc<FixtureFollowRepository>,
        juan: Identity,
        maria: Identity,
    }

    async fn graph() -> Graph {
        let identities = Arc::new(FixtureIdentityRepository::new());
        let follows = Arc::new(FixtureFollowRepository::new());
        let registration = RegistrationService::new(identities.clone());

        let juan = registration
            .register(
                RegistrationRequest::try_from_parts("juan", "juan@example.com", "juan-password")
                    .expect("valid request"),
            )
            .await
            .expect("juan registers");
        let maria = registration
            .register(
                RegistrationRequest::try_from_parts("maria", "maria@example.com", "maria-password")
                    .expect("valid request"),
            )
            .await
            .expect("maria registers");

        Graph {
            service: FollowService::new(identities, follows.clone()),
            follows,
            juan,
            maria,
        }
    }

    #[tokio::test]
    async fn follow_twice_is_equivalent_to_once() {
        let graph = graph().await;
        graph.service.follow(graph.juan.id(), "maria").await.expect("first follow");
        graph.service.follow(graph.juan.id(), "maria").await.expect("second follow is a no-op");

        assert_eq!(graph.follows.edge_count(), 1);
        let followees = graph.service.followees(graph.juan.id()).await.expect("query ok");
        assert_eq!(followees, vec![graph.maria.id()]);
    }

    #[tokio::test]
    async fn follow_resolves_usernames_case_insensitively() {
        let graph = graph().await;
        graph.service.follow(graph.juan.id(), "MARIA").await.expect("case variant resolves");
        assert!(graph
            .service
            .is_following(graph.juan.id(), "maria")
            .await
            .expect("query ok"));
    }

    #[tokio::test]
    async fn follow_unknown_username_is_not_found() {
        let graph = graph().await;
        let err = graph
            .service
            .follow(graph.juan.id(), "ghost")
            .await
            .expect_err("unknown target must fail");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn self_follow_is_rejected() {
        let graph = graph().await;
        let err = graph
            .service
            .follow(graph.juan.id(), "juan")
            .await
            .expect_err("self-follow must fail");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(graph.follows.edge_count(), 0);
    }

    #[tokio::test]
    async fn unfollow_without_an_edge_is_a_no_op_success() {
        let graph = graph().await;
        graph
            .service
            .unfollow(graph.juan.id(), "maria")
            .await
            .expect("no-op unfollow succeeds");
        assert_eq!(graph.follows.edge_count(), 0);
    }

    #[tokio::test]
    async fn unfollow_removes_only_that_edge() {
        let graph = graph().await;
        graph.service.follow(graph.juan.id(), "maria").await.expect("follow");
        graph.service.follow(graph.maria.id(), "juan").await.expect("reverse follow");

        graph.service.unfollow(graph.juan.id(), "maria").await.expect("unfollow");

        assert!(!graph
            .service
            .is_following(graph.juan.id(), "maria")
            .await
            .expect("query ok"));
        assert!(graph
            .service
            .is_following(graph.maria.id(), "juan")
            .await
            .expect("query ok"));
    }

    #[tokio::test]
    async fn followers_mirror_followees() {
        let graph = graph().await;
        graph.service.follow(graph.juan.id(), "maria").await.expect("follow");

        let followers = graph.service.followers(graph.maria.id()).await.expect("query ok");
        assert_eq!(followers, vec![graph.juan.id()]);
    }
}
