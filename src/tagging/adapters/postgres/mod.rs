//! `PostgreSQL` adapters for tagging persistence.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresTagRepository, TagPgPool};
