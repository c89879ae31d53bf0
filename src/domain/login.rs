//! Login use-case.

use std::sync::Arc;

use tracing::debug;

use crate::domain::auth::LoginCredentials;
use crate::domain::credential::verify_against_dummy;
use crate::domain::identity::Identity;
use crate::domain::ports::{IdentityRepository, IdentityRepositoryError};
use crate::domain::Error;

/// Message returned for every authentication failure.
///
/// Unknown email and wrong password are indistinguishable to the caller, so
/// responses cannot be used to enumerate accounts.
const AUTH_FAILED: &str = "invalid credentials";

/// Authentication service over the identity repository port.
#[derive(Clone)]
pub struct LoginService {
    identities: Arc<dyn IdentityRepository>,
}

impl LoginService {
    /// Create a new service backed by the given repository.
    pub fn new(identities: Arc<dyn IdentityRepository>) -> Self {
        Self { identities }
    }

    /// Validate credentials and return the authenticated identity.
    pub async fn authenticate(&self, credentials: &LoginCredentials) -> Result<Identity, Error> {
        let lookup = self
            .identities
            .find_for_login(credentials.email())
            .await
            .map_err(map_lookup_error)?;

        let Some((identity, stored)) = lookup else {
            // Burn one verification so unknown accounts cost the same as
            // known ones.
            verify_against_dummy(credentials.password());
            return Err(Error::unauthorized(AUTH_FAILED));
        };

        if !stored.verify(credentials.password()) {
            debug!(identity_id = %identity.id(), "password verification failed");
            return Err(Error::unauthorized(AUTH_FAILED));
        }

        Ok(identity)
    }
}

fn map_lookup_error(error: IdentityRepositoryError) -> Error {
    match error {
        IdentityRepositoryError::Connection { message } => Error::service_unavailable(message),
        IdentityRepositoryError::DuplicateUsername
        | IdentityRepositoryError::DuplicateEmail
        | IdentityRepositoryError::Query { .. } => Error::internal(error.to_string()),
    }
}
