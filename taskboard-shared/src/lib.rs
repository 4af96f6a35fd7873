//! # Taskboard Shared Library
//!
//! This crate contains the domain types, storage layer, authentication
//! primitives and board orchestration used by the Taskboard API server and
//! its tooling.
//!
//! ## Module Organization
//!
//! - `models`: Domain records (users, projects, columns, tasks, comments)
//! - `auth`: Password hashing, JWT, invite tokens and the authorization policy
//! - `db`: PostgreSQL pool and migrations
//! - `store`: Store traits with PostgreSQL and in-memory backends
//! - `services`: Access-controlled project, membership and board operations

pub mod auth;
pub mod db;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
