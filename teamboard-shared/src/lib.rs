//! # Teamboard Shared Library
//!
//! Domain core of the Teamboard project membership service, used by the API
//! server and its tests.
//!
//! ## Module Organization
//!
//! - `models`: row types and their SQL
//! - `db`: connection pool and migrations
//! - `store`: the `MembershipStore` contract with PostgreSQL and in-memory implementations
//! - `auth`: JWT primitives, credential extraction, project authorization guard
//! - `membership`: invitation state machine, member lifecycle, project operations

pub mod auth;
pub mod db;
pub mod membership;
pub mod models;
pub mod store;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
