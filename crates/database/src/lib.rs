//! # Acrelot Database Crate
//!
//! This crate is the marketplace's interface to its record store. It is a
//! Layer 3 adapter: the rest of the application talks to the repository
//! ports defined here and never sees SQL or connection handling.
//!
//! ## Architectural Principles
//!
//! - **Ports, not models:** `MarketRepository` and `SellerDirectory` are
//!   object-safe async traits. Handlers receive them as trait objects, so
//!   unit tests can inject the in-memory implementation with fixtures.
//! - **Atomic counters:** seller metric updates are single-statement
//!   upsert-increments executed together with their event-log append in one
//!   transaction. There is no read-then-write window to lose updates in.
//! - **Bounded reads:** every listing/sale query is filtered, ordered, and
//!   limited server-side; window statistics come back as aggregates.
//!
//! ## Public API
//!
//! - `connect` / `run_migrations`: pool setup against `DATABASE_URL`.
//! - `MarketRepository` / `SellerDirectory`: the repository ports.
//! - `PgRepository`: the PostgreSQL implementation of both ports.
//! - `InMemoryRepository`: the fixture-backed implementation for tests.
//! - `DbError`: the specific error types that can be returned from this crate.

pub mod connection;
pub mod error;
pub mod memory;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use memory::InMemoryRepository;
pub use repository::{ComparableQuery, MarketRepository, PgRepository, SellerDirectory};
