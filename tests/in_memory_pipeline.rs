//! In-memory integration tests for the pipeline and tagging services.
//!
//! Tests are organized into modules by functionality:
//! - `board_flow_tests`: Placement, moves, no-op handling, board columns
//! - `tag_flow_tests`: Catalog and association behaviour across tenants
//! - `concurrency_tests`: Racing moves and idempotent tag operations

mod in_memory {
    pub mod helpers;

    mod board_flow_tests;
    mod concurrency_tests;
    mod tag_flow_tests;
}
