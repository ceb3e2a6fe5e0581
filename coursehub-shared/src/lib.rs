//! # CourseHub Shared Library
//!
//! This crate contains the data layer and business rules shared by the
//! CourseHub API server: models and their CRUD operations, authentication
//! primitives, and the moderation/ban cascades.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and migrations
//! - `models`: Database models and data structures
//! - `auth`: Authentication, route guards and authorization helpers
//! - `cascade`: Manually sequenced multi-table cleanups (moderation, course removal, bans)
//! - `identity`: Deletion of authentication identities (local or remote function)

pub mod auth;
pub mod cascade;
pub mod db;
pub mod identity;
pub mod models;

/// Current version of the CourseHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
