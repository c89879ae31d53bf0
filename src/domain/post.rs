//! Post data model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identity::IdentityId;

/// Stable post identifier stored as a UUID v4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(Uuid);

impl PostId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an identifier read back from storage.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Validation error returned by [`PostBody::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostValidationError {
    /// Body was empty once trimmed of whitespace.
    EmptyBody,
}

impl fmt::Display for PostValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBody => write!(f, "post body must not be empty"),
        }
    }
}

impl std::error::Error for PostValidationError {}

/// Post text content.
///
/// ## Invariants
/// - Non-empty after trimming; stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostBody(String);

impl PostBody {
    /// Trim and validate post content.
    pub fn new(content: impl Into<String>) -> Result<Self, PostValidationError> {
        let content = content.into();
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(PostValidationError::EmptyBody);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for PostBody {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PostBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<PostBody> for String {
    fn from(value: PostBody) -> Self {
        value.0
    }
}

impl TryFrom<String> for PostBody {
    type Error = PostValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Immutable authored post.
///
/// ## Invariants
/// - `author` references an identity that existed at creation time.
/// - `created_at` is assigned by the store, monotonically non-decreasing
///   across inserts; equal timestamps are valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    id: PostId,
    author: IdentityId,
    body: PostBody,
    created_at: DateTime<Utc>,
}

impl Post {
    /// Build a [`Post`] from validated components.
    pub fn new(id: PostId, author: IdentityId, body: PostBody, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            author,
            body,
            created_at,
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> PostId {
        self.id
    }

    /// Owning identity.
    pub fn author(&self) -> IdentityId {
        self.author
    }

    /// Trimmed text content.
    pub fn body(&self) -> &PostBody {
        &self.body
    }

    /// Store-assigned creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
