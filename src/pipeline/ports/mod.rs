//! Port contracts for the application pipeline.
//!
//! Ports define infrastructure-agnostic interfaces used by pipeline
//! services.

pub mod repository;

pub use repository::{
    ApplicationRepository, PipelineRepositoryError, PipelineRepositoryResult, StageRepository,
};
