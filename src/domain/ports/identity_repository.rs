//! Port abstraction for identity persistence adapters and their errors.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::credential::PasswordCredential;
use crate::domain::identity::{EmailAddress, Identity, IdentityId, Username};

/// Persistence errors raised by identity repository adapters.
///
/// Uniqueness is enforced by the store; adapters translate the low-level
/// constraint violation into the matching duplicate variant rather than a
/// generic query failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityRepositoryError {
    /// The requested username is already registered (case-insensitive).
    #[error("username is already registered")]
    DuplicateUsername,

    /// The requested email is already registered.
    #[error("email is already registered")]
    DuplicateEmail,

    /// Repository connection could not be established.
    #[error("identity repository connection failed: {message}")]
    Connection { message: String },

    /// Query or mutation failed during execution.
    #[error("identity repository query failed: {message}")]
    Query { message: String },
}

impl IdentityRepositoryError {
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

/// Insert payload for a new identity.
///
/// The id is chosen by the caller; the creation timestamp is assigned by
/// the store so ordering reflects actual insertion order.
#[derive(Debug, Clone)]
pub struct NewIdentityRecord {
    pub id: IdentityId,
    pub username: Username,
    pub email: EmailAddress,
    pub credential: PasswordCredential,
}

/// Driven port for identity persistence.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Insert a new identity atomically.
    ///
    /// The store's unique indexes are the final authority on duplicates;
    /// implementations must not pre-check and must map uniqueness
    /// violations to the duplicate error variants.
    async fn insert(&self, record: NewIdentityRecord) -> Result<Identity, IdentityRepositoryError>;

    /// Fetch an identity by id.
    async fn find_by_id(&self, id: IdentityId)
        -> Result<Option<Identity>, IdentityRepositoryError>;

    /// Fetch an identity by username, matching case-insensitively.
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, IdentityRepositoryError>;

    /// Fetch an identity by exact email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Identity>, IdentityRepositoryError>;

    /// Fetch an identity together with its stored credential for login.
    ///
    /// The only operation that surfaces the credential; everything else in
    /// the domain sees identities without one.
    async fn find_for_login(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<(Identity, PasswordCredential)>, IdentityRepositoryError>;
}

struct StoredIdentity {
    identity: Identity,
    credential: PasswordCredential,
}

/// In-memory identity repository for tests and development wiring.
///
/// Mirrors the database contract: duplicate detection is case-insensitive
/// for usernames and exact for emails, and `created_at` is assigned at
/// insert time.
#[derive(Default)]
pub struct FixtureIdentityRepository {
    records: Mutex<Vec<StoredIdentity>>,
}

impl FixtureIdentityRepository {
    /// Create an empty fixture repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored identities.
    pub fn len(&self) -> usize {
        self.records.lock().expect("fixture lock").len()
    }

    /// Whether the repository holds no identities.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IdentityRepository for FixtureIdentityRepository {
    async fn insert(&self, record: NewIdentityRecord) -> Result<Identity, IdentityRepositoryError> {
        let mut records = self.records.lock().expect("fixture lock");
        if records
            .iter()
            .any(|stored| stored.identity.username().matches(record.username.as_ref()))
        {
            return Err(IdentityRepositoryError::DuplicateUsername);
        }
        if records
            .iter()
            .any(|stored| stored.identity.email() == &record.email)
        {
            return Err(IdentityRepositoryError::DuplicateEmail);
        }

        let identity = Identity::new(record.id, record.username, record.email, Utc::now());
        records.push(StoredIdentity {
            identity: identity.clone(),
            credential: record.credential,
        });
        Ok(identity)
    }

    async fn find_by_id(
        &self,
        id: IdentityId,
    ) -> Result<Option<Identity>, IdentityRepositoryError> {
        let records = self.records.lock().expect("fixture lock");
        Ok(records
            .iter()
            .find(|stored| stored.identity.id() == id)
            .map(|stored| stored.identity.clone()))
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, IdentityRepositoryError> {
        let records = self.records.lock().expect("fixture lock");
        Ok(records
            .iter()
            .find(|stored| stored.identity.username().matches(username))
            .map(|stored| stored.identity.clone()))
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Identity>, IdentityRepositoryError> {
        let records = self.records.lock().expect("fixture lock");
        Ok(records
            .iter()
            .find(|stored| stored.identity.email() == email)
            .map(|stored| stored.identity.clone()))
    }

    async fn find_for_login(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<(Identity, PasswordCredential)>, IdentityRepositoryError> {
        let records = self.records.lock().expect("fixture lock");
        Ok(records
            .iter()
            .find(|stored| stored.identity.email() == email)
            .map(|stored| (stored.identity.clone(), stored.credential.clone())))
    }
}

#[cfg(test)]
mod tests {
    //! Contract coverage for the fixture repository.
    use super::*;

    fn record(username: &str, email: &str) -> NewIdentityRecord {
        NewIdentityRecord {
            id: IdentityId::random(),
            username: Username::new(username).expect("valid username"),
            email: EmailAddress::new(email).expect("valid email"),
            credential: PasswordCredential::from_stored("$argon2id$stub"),
        }
    }

    #[tokio::test]
    async fn insert_then_lookup_by_each_key() {
        let repo = FixtureIdentityRepository::new();
        let identity = repo.insert(record("juan", "juan@example.com")).await.expect("inserts");

        let by_id = repo.find_by_id(identity.id()).await.expect("query ok");
        assert_eq!(by_id.as_ref(), Some(&identity));

        let by_username = repo.find_by_username("JUAN").await.expect("query ok");
        assert_eq!(by_username.as_ref(), Some(&identity));

        let email = EmailAddress::new("juan@example.com").expect("valid email");
        let by_email = repo.find_by_email(&email).await.expect("query ok");
        assert_eq!(by_email.as_ref(), Some(&identity));
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected_case_insensitively() {
        let repo = FixtureIdentityRepository::new();
        repo.insert(record("juan", "one@example.com")).await.expect("first insert");

        let err = repo
            .insert(record("Juan", "two@example.com"))
            .await
            .expect_err("case variant must conflict");
        assert_eq!(err, IdentityRepositoryError::DuplicateUsername);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let repo = FixtureIdentityRepository::new();
        repo.insert(record("juan", "same@example.com")).await.expect("first insert");

        let err = repo
            .insert(record("maria", "same@example.com"))
            .await
            .expect_err("duplicate email must conflict");
        assert_eq!(err, IdentityRepositoryError::DuplicateEmail);
    }

    #[tokio::test]
    async fn login_lookup_surfaces_the_credential() {
        let repo = FixtureIdentityRepository::new();
        repo.insert(record("juan", "juan@example.com")).await.expect("inserts");

        let email = EmailAddress::new("juan@example.com").expect("valid email");
        let (identity, credential) = repo
            .find_for_login(&email)
            .await
            .expect("query ok")
            .expect("account exists");
        assert_eq!(identity.username().as_ref(), "juan");
        assert_eq!(credential.as_str(), "$argon2id$stub");
    }

    #[tokio::test]
    async fn missing_lookups_return_none() {
        let repo = FixtureIdentityRepository::new();
        assert!(repo.find_by_username("ghost").await.expect("query ok").is_none());
        assert!(repo.find_by_id(IdentityId::random()).await.expect("query ok").is_none());
    }
}
