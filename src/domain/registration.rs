//! Registration use-case.
//!
//! Shape validation happens in [`RegistrationRequest`](crate::domain::RegistrationRequest)
//! at the boundary; this service derives the credential and performs the
//! atomic insert. Uniqueness is decided by the store's indexes, never by an
//! application pre-check, so concurrent identical registrations cannot both
//! slip through.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::domain::credential::PasswordCredential;
use crate::domain::identity::{Identity, IdentityId, RegistrationRequest};
use crate::domain::ports::{IdentityRepository, IdentityRepositoryError, NewIdentityRecord};
use crate::domain::Error;

/// Registration service over the identity repository port.
#[derive(Clone)]
pub struct RegistrationService {
    identities: Arc<dyn IdentityRepository>,
}

impl RegistrationService {
    /// Create a new service backed by the given repository.
    pub fn new(identities: Arc<dyn IdentityRepository>) -> Self {
        Self { identities }
    }

    /// Register a new identity.
    ///
    /// Returns [`Error::conflict`] with a `duplicate_username` or
    /// `duplicate_email` detail code when the handle or email is taken.
    pub async fn register(&self, request: RegistrationRequest) -> Result<Identity, Error> {
        let credential = PasswordCredential::derive(request.password())
            .map_err(|err| Error::internal(err.to_string()))?;

        let record = NewIdentityRecord {
            id: IdentityId::random(),
            username: request.username().clone(),
            email: request.email().clone(),
            credential,
        };

        let identity = self
            .identities
            .insert(record)
            .await
            .map_err(map_insert_error)?;

        debug!(identity_id = %identity.id(), username = %identity.username(), "identity registered");
        Ok(identity)
    }
}

fn map_insert_error(error: IdentityRepositoryError) -> Error {
    match error {
        IdentityRepositoryError::DuplicateUsername => {
            Error::conflict("username is already registered")
                .with_details(json!({ "code": "duplicate_username" }))
        }
        IdentityRepositoryError::DuplicateEmail => Error::conflict("email is already registered")
            .with_details(json!({ "code": "duplicate_email" })),
        IdentityRepositoryError::Connection { message } => Error::service_unavailable(message),
        IdentityRepositoryError::Query { message } => Error::internal(message),
    }
}
