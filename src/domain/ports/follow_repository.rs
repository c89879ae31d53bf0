//! Port abstraction for follow-edge persistence adapters and their errors.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::identity::IdentityId;

/// Persistence errors raised by follow repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FollowRepositoryError {
    /// The target identity does not exist (foreign key violation).
    #[error("follow target does not exist")]
    TargetMissing,

    /// Repository connection could not be established.
    #[error("follow repository connection failed: {message}")]
    Connection { message: String },

    /// Query or mutation failed during execution.
    #[error("follow repository query failed: {message}")]
    Query { message: String },
}

impl FollowRepositoryError {
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

/// Driven port for the follow graph.
///
/// Edges are directed `(source, target)` pairs with at-most-one semantics.
/// Both mutations are idempotent: inserting an existing edge and removing a
/// missing edge are successes, not errors.
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Create the edge if it does not already exist.
    ///
    /// A duplicate insert collapses to success; implementations normalise
    /// the store's uniqueness violation rather than surfacing it.
    async fn insert_edge(
        &self,
        source: IdentityId,
        target: IdentityId,
    ) -> Result<(), FollowRepositoryError>;

    /// Remove the edge; removing a missing edge is a no-op success.
    async fn remove_edge(
        &self,
        source: IdentityId,
        target: IdentityId,
    ) -> Result<(), FollowRepositoryError>;

    /// Whether `source` currently follows `target`.
    async fn is_following(
        &self,
        source: IdentityId,
        target: IdentityId,
    ) -> Result<bool, FollowRepositoryError>;

    /// Identities that `source` follows, in ascending id order.
    ///
    /// Semantically a set; the sorted order makes reads deterministic.
    async fn followees(&self, source: IdentityId)
        -> Result<Vec<IdentityId>, FollowRepositoryError>;

    /// Identities following `target`, in ascending id order.
    async fn followers(&self, target: IdentityId)
        -> Result<Vec<IdentityId>, FollowRepositoryError>;
}

/// In-memory follow graph for tests and development wiring.
#[derive(Default)]
pub struct FixtureFollowRepository {
    edges: Mutex<HashSet<(IdentityId, IdentityId)>>,
}

impl FixtureFollowRepository {
    /// Create an empty fixture graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of edges, for test assertions.
    pub fn edge_count(&self) -> usize {
        self.edges.lock().expect("fixture lock").len()
    }
}

#[async_trait]
impl FollowRepository for FixtureFollowRepository {
    async fn insert_edge(
        &self,
        source: IdentityId,
        target: IdentityId,
    ) -> Result<(), FollowRepositoryError> {
        let mut edges = self.edges.lock().expect("fixture lock");
        edges.insert((source, target));
        Ok(())
    }

    async fn remove_edge(
        &self,
        source: IdentityId,
        target: IdentityId,
    ) -> Result<(), FollowRepositoryError> {
        let mut edges = self.edges.lock().expect("fixture lock");
        edges.remove(&(source, target));
        Ok(())
    }

    async fn is_following(
        &self,
        source: IdentityId,
        target: IdentityId,
    ) -> Result<bool, FollowRepositoryError> {
        let edges = self.edges.lock().expect("fixture lock");
        Ok(edges.contains(&(source, target)))
    }

    async fn followees(
        &self,
        source: IdentityId,
    ) -> Result<Vec<IdentityId>, FollowRepositoryError> {
        let edges = self.edges.lock().expect("fixture lock");
        let mut ids: Vec<IdentityId> = edges
            .iter()
            .filter(|(edge_source, _)| *edge_source == source)
            .map(|(_, edge_target)| *edge_target)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn followers(
        &self,
        target: IdentityId,
    ) -> Result<Vec<IdentityId>, FollowRepositoryError> {
        let edges = self.edges.lock().expect("fixture lock");
        let mut ids: Vec<IdentityId> = edges
            .iter()
            .filter(|(_, edge_target)| *edge_target == target)
            .map(|(edge_source, _)| *edge_source)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    //! Contract coverage for the fixture follow graph.
    use super::*;

    #[tokio::test]
    async fn duplicate_insert_collapses_to_one_edge() {
        let repo = FixtureFollowRepository::new();
        let (a, b) = (IdentityId::random(), IdentityId::random());

        repo.insert_edge(a, b).await.expect("first insert");
        repo.insert_edge(a, b).await.expect("second insert is a no-op success");

        assert_eq!(repo.edge_count(), 1);
        assert_eq!(repo.followees(a).await.expect("query ok"), vec![b]);
    }

    #[tokio::test]
    async fn removing_a_missing_edge_is_a_no_op() {
        let repo = FixtureFollowRepository::new();
        let (a, b) = (IdentityId::random(), IdentityId::random());

        repo.remove_edge(a, b).await.expect("no-op success");
        assert_eq!(repo.edge_count(), 0);
    }

    #[tokio::test]
    async fn neighbour_reads_are_sorted_by_id() {
        let repo = FixtureFollowRepository::new();
        let source = IdentityId::random();
        let mut targets = vec![
            IdentityId::random(),
            IdentityId::random(),
            IdentityId::random(),
        ];
        for target in &targets {
            repo.insert_edge(source, *target).await.expect("insert");
            repo.insert_edge(*target, source).await.expect("reverse insert");
        }
        targets.sort_unstable();

        assert_eq!(repo.followees(source).await.expect("query ok"), targets);
        assert_eq!(repo.followers(source).await.expect("query ok"), targets);
    }

    #[tokio::test]
    async fn edges_are_directed() {
        let repo = FixtureFollowRepository::new();
        let (a, b) = (IdentityId::random(), IdentityId::random());

        repo.insert_edge(a, b).await.expect("insert");

        assert!(repo.is_following(a, b).await.expect("query ok"));
        assert!(!repo.is_following(b, a).await.expect("query ok"));
        assert_eq!(repo.followers(b).await.expect("query ok"), vec![a]);
        assert!(repo.followers(a).await.expect("query ok").is_empty());
    }
}
