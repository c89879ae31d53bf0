//! Diesel table definitions for the PostgreSQL schema.
//!
//! These must match the migrations exactly; Diesel uses them for
//! compile-time query validation and type-safe SQL generation. Regenerate
//! with `diesel print-schema` when the migrations change.

diesel::table! {
    /// Registered accounts.
    ///
    /// Usernames are unique case-insensitively via a unique index on
    /// `lower(username)`; emails carry a plain unique constraint. The
    /// `credential` column stores the Argon2 PHC string, never plaintext.
    identities (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Account handle in its registered spelling (max 32 characters).
        username -> Varchar,
        /// Login email address.
        email -> Varchar,
        /// Derived password credential (PHC string).
        credential -> Text,
        /// Registration timestamp, assigned by the database.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Directed follow edges.
    ///
    /// The composite primary key enforces at most one edge per ordered
    /// pair and doubles as the by-source index; `follows_target_idx`
    /// covers follower lookups.
    follows (source_id, target_id) {
        /// Following identity.
        source_id -> Uuid,
        /// Followed identity.
        target_id -> Uuid,
        /// Edge creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Authored posts.
    posts (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning identity (foreign key).
        author_id -> Uuid,
        /// Trimmed text content.
        body -> Text,
        /// Creation timestamp, assigned by the database.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(posts -> identities (author_id));

diesel::allow_tables_to_appear_in_same_query!(identities, follows, posts);
