//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL via Diesel with async support through `diesel-async` and
//! `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types; no business logic lives here.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) are implementation details, never exposed to the domain.
//! - **Constraint-driven correctness**: uniqueness and referential
//!   integrity are enforced by the database, and adapters translate
//!   violations into typed port errors (or, for idempotent edge inserts,
//!   into success).
//!
//! # Example
//!
//! ```ignore
//! use murmur::outbound::persistence::{DbPool, PoolConfig, DieselIdentityRepository};
//!
//! murmur::outbound::persistence::run_migrations(url).await?;
//! let pool = DbPool::new(PoolConfig::new(url)).await?;
//! let identities = DieselIdentityRepository::new(pool);
//! ```

pub(crate) mod diesel_helpers;
mod diesel_follow_repository;
mod diesel_identity_repository;
mod diesel_post_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_follow_repository::DieselFollowRepository;
pub use diesel_identity_repository::DieselIdentityRepository;
pub use diesel_post_repository::DieselPostRepository;
pub use migrations::{run_migrations, MigrationError, MIGRATIONS};
pub use pool::{DbPool, PoolConfig, PoolError};
