//! Domain primitives, entities, and driving services.
//!
//! Purpose: define the strongly typed social-graph model (identities, follow
//! edges, posts) and the use-case services inbound adapters call. Types are
//! immutable; invariants live in each type's Rustdoc. Services take every
//! dependency and the caller's identity explicitly.

pub mod auth;
pub mod credential;
pub mod error;
pub mod follow_graph;
pub mod identity;
pub mod login;
pub mod ports;
pub mod post;
pub mod registration;
pub mod stream;

pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::credential::{CredentialError, PasswordCredential};
pub use self::error::{Error, ErrorCode};
pub use self::follow_graph::FollowService;
pub use self::identity::{
    EmailAddress, Identity, IdentityId, IdentityValidationError, RegistrationRequest, Username,
    PASSWORD_MIN, USERNAME_MAX,
};
pub use self::login::LoginService;
pub use self::post::{Post, PostBody, PostId, PostValidationError};
pub use self::registration::RegistrationService;
pub use self::stream::{StreamService, DEFAULT_STREAM_LIMIT};

/// Convenient result alias for driving-service operations.
pub type DomainResult<T> = Result<T, Error>;
