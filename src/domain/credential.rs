//! Password credential derivation and verification.
//!
//! Credentials are Argon2id digests in PHC string format, so the salt and
//! cost parameters travel inside the stored value. Verification never
//! errors: a malformed stored credential simply fails to verify.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tracing::warn;

/// Derived password credential as persisted in the identity store.
///
/// Never contains plaintext. Equality is deliberately not derived; comparing
/// two credentials byte-wise is meaningless and comparing a credential to a
/// plaintext must go through [`PasswordCredential::verify`].
#[derive(Debug, Clone)]
pub struct PasswordCredential(String);

/// Failure to derive a credential. Only ever caused by a broken RNG or
/// out-of-range hasher parameters, so callers treat it as internal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to derive password credential: {message}")]
pub struct CredentialError {
    message: String,
}

impl PasswordCredential {
    /// Derive a credential from a plaintext password with a fresh random salt.
    pub fn derive(plaintext: &str) -> Result<Self, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|err| CredentialError {
                message: err.to_string(),
            })?;
        Ok(Self(digest.to_string()))
    }

    /// Wrap a credential string read back from storage.
    ///
    /// The format is not validated here; a corrupted value surfaces as a
    /// failed [`verify`](Self::verify), never as a panic.
    pub fn from_stored(stored: impl Into<String>) -> Self {
        Self(stored.into())
    }

    /// Check a plaintext password against this credential.
    ///
    /// Comparison happens inside the argon2 verifier, which is constant-time
    /// with respect to the digest contents. Malformed stored credentials
    /// return `false`.
    pub fn verify(&self, plaintext: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.0) else {
            warn!("stored password credential is not a valid PHC string");
            return false;
        };
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// PHC string for persistence.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Well-formed Argon2id PHC string with default cost parameters.
///
/// Fallback for [`verify_against_dummy`] when derivation fails: it must
/// parse, so verification still pays the full Argon2 cost instead of
/// bailing out on the malformed-credential path.
const FALLBACK_DUMMY: &str = "$argon2id$v=19$m=19456,t=2,p=1$AAAAAAAAAAAAAAAAAAAAAA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Verify a plaintext against a throwaway credential.
///
/// Used by the login service when the email does not resolve, so unknown
/// and known accounts both cost one Argon2 verification and response
/// timing does not reveal which factor failed.
pub fn verify_against_dummy(plaintext: &str) {
    // Derived once from an unguessable value at first use.
    static DUMMY: std::sync::OnceLock<PasswordCredential> = std::sync::OnceLock::new();
    let dummy = DUMMY.get_or_init(|| {
        PasswordCredential::derive(uuid::Uuid::new_v4().to_string().as_str())
            .unwrap_or_else(|_| PasswordCredential::from_stored(FALLBACK_DUMMY))
    });
    let _ = dummy.verify(plaintext);
}
