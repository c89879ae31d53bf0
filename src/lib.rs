//! Core of a minimal social network: identities, the follow graph, posts,
//! and stream aggregation.
//!
//! The crate is laid out hexagonally. `domain` holds entities, validation
//! newtypes, and the driving services that inbound adapters (HTTP handlers,
//! CLIs) call. `domain::ports` declares the driven repository traits the
//! services depend on, together with in-memory fixture implementations.
//! `outbound::persistence` provides the PostgreSQL adapters built on Diesel
//! with async connections.
//!
//! Routing, templating, and session handling live outside this crate; every
//! operation takes the caller's identity (or none) as an explicit argument
//! rather than reading ambient request state.

pub mod domain;
pub mod outbound;
