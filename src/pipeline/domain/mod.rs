//! Domain model for the application pipeline.
//!
//! Models jobs, their ordered hiring stages, candidate applications, and
//! the append-only stage transition ledger, keeping all infrastructure
//! concerns outside of the domain boundary.

mod application;
mod error;
mod history;
mod ids;
mod job;
mod stage;

pub use application::{
    Application, BoardSort, CandidateProfile, EvaluationScores, PersistedApplicationData,
};
pub use error::{ParseJobStatusError, PipelineDomainError, ReplayError};
pub use history::{PersistedTransitionData, StageTransition, replay_current_stage};
pub use ids::{ApplicationId, JobId, OrderIndex, StageId, TransitionId};
pub use job::{Job, JobStatus, PersistedJobData};
pub use stage::{
    PersistedStageData, Stage, StageDraft, StageName, StagePlan, default_stage_plan,
};
