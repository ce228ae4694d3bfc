//! Port contracts for tag annotation.
//!
//! Ports define infrastructure-agnostic interfaces used by tagging
//! services.

pub mod repository;

pub use repository::{TagRepository, TagRepositoryError, TagRepositoryResult};
