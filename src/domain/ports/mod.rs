//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Each port is a driven trait the services depend on, paired with a
//! port-specific error enum and an in-memory fixture implementation used by
//! tests and development wiring.

mod follow_repository;
mod identity_repository;
mod post_repository;

pub use follow_repository::{FixtureFollowRepository, FollowRepository, FollowRepositoryError};
pub use identity_repository::{
    FixtureIdentityRepository, IdentityRepository, IdentityRepositoryError, NewIdentityRecord,
};
pub use post_repository::{FixturePostRepository, PostRepository, PostRepositoryError};
