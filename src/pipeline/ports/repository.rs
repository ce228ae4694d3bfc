//! Repository ports for pipeline persistence and the transition ledger.

use crate::pipeline::domain::{
    Application, ApplicationId, Job, JobId, Stage, StageId, StagePlan, StageTransition,
};
use crate::tenant::CompanyId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for pipeline repository operations.
pub type PipelineRepositoryResult<T> = Result<T, PipelineRepositoryError>;

/// Stage registry persistence contract.
///
/// Stage writes always go through [`Self::rewrite_stages`]; single-stage
/// edits are expressed as a rewrite of the whole list, mirroring how
/// recruiters author pipelines.
#[async_trait]
pub trait StageRepository: Send + Sync {
    /// Stores a new job with no stages.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineRepositoryError::JobExists`] when the job ID is
    /// already taken.
    async fn create_job(&self, job: &Job) -> PipelineRepositoryResult<()>;

    /// Finds a job owned by `company`.
    ///
    /// Returns `None` for absent jobs and for jobs owned by another
    /// company; the two cases are indistinguishable.
    async fn find_job(&self, company: CompanyId, job: JobId)
    -> PipelineRepositoryResult<Option<Job>>;

    /// Finds a stage of `job`.
    ///
    /// Returns `None` when the stage does not exist or belongs to a
    /// different job.
    async fn find_stage(&self, job: JobId, stage: StageId)
    -> PipelineRepositoryResult<Option<Stage>>;

    /// Returns all stages of `job` ordered by pipeline position.
    async fn list_stages(&self, job: JobId) -> PipelineRepositoryResult<Vec<Stage>>;

    /// Atomically replaces the stage list of `job` with `plan`.
    ///
    /// Entries targeting existing stages update them in place; entries
    /// without a target create new stages stamped with `now`. A stage
    /// omitted from the plan is deleted unless it is referenced: a stage
    /// holding any application's current pointer rejects the whole plan,
    /// and a stage referenced only by ledger rows is deactivated instead
    /// of deleted.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineRepositoryError::UnknownStage`] when a plan
    /// entry targets a stage that does not belong to the job, and
    /// [`PipelineRepositoryError::StageInUse`] when the plan omits a
    /// current-referenced stage.
    async fn rewrite_stages(
        &self,
        job: JobId,
        plan: &StagePlan,
        now: DateTime<Utc>,
    ) -> PipelineRepositoryResult<Vec<Stage>>;
}

/// Application store and transition ledger persistence contract.
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Stores a new application.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineRepositoryError::ApplicationExists`] when the
    /// application ID is already taken, or
    /// [`PipelineRepositoryError::UnknownJob`] when the referenced job
    /// does not exist.
    async fn create_application(&self, application: &Application)
    -> PipelineRepositoryResult<()>;

    /// Finds an application of `job` owned by `company`.
    ///
    /// Returns `None` for absent applications and for applications of
    /// another company or job; the cases are indistinguishable.
    async fn find_in_job(
        &self,
        company: CompanyId,
        job: JobId,
        application: ApplicationId,
    ) -> PipelineRepositoryResult<Option<Application>>;

    /// Finds an application owned by `company` regardless of job.
    ///
    /// Returns `None` for absent and cross-company applications alike.
    async fn find_in_company(
        &self,
        company: CompanyId,
        application: ApplicationId,
    ) -> PipelineRepositoryResult<Option<Application>>;

    /// Persists evaluation scores from the application aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineRepositoryError::UnknownApplication`] when the
    /// application does not exist.
    async fn record_evaluation(&self, application: &Application)
    -> PipelineRepositoryResult<()>;

    /// Atomically appends a ledger row and advances the stage pointer.
    ///
    /// The pointer update is a compare-and-swap: it only applies while
    /// the application's current stage still equals `expected_from`
    /// (which is also the row's origin). Both writes commit together or
    /// not at all; the ledger and the pointer never diverge.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineRepositoryError::StaleStage`] when a concurrent
    /// transition moved the pointer first, and
    /// [`PipelineRepositoryError::UnknownApplication`] when the
    /// application no longer exists.
    async fn commit_transition(
        &self,
        transition: &StageTransition,
        expected_from: Option<StageId>,
        now: DateTime<Utc>,
    ) -> PipelineRepositoryResult<()>;

    /// Returns the ledger of an application in creation order, oldest
    /// first; empty if the application has never moved.
    async fn history(
        &self,
        company: CompanyId,
        job: JobId,
        application: ApplicationId,
    ) -> PipelineRepositoryResult<Vec<StageTransition>>;

    /// Returns the applications of `job` whose current stage is `stage`,
    /// in no particular order.
    async fn list_by_stage(
        &self,
        company: CompanyId,
        job: JobId,
        stage: StageId,
    ) -> PipelineRepositoryResult<Vec<Application>>;
}

/// Errors returned by pipeline repository implementations.
#[derive(Debug, Clone, Error)]
pub enum PipelineRepositoryError {
    /// A job with the same identifier already exists.
    #[error("duplicate job identifier: {0}")]
    JobExists(JobId),

    /// An application with the same identifier already exists.
    #[error("duplicate application identifier: {0}")]
    ApplicationExists(ApplicationId),

    /// The referenced job does not exist.
    #[error("unknown job: {0}")]
    UnknownJob(JobId),

    /// The referenced application does not exist.
    #[error("unknown application: {0}")]
    UnknownApplication(ApplicationId),

    /// A stage plan entry targets a stage the job does not own.
    #[error("unknown stage: {0}")]
    UnknownStage(StageId),

    /// A stage plan omits a stage still holding an application.
    #[error("stage {0} is the current stage of at least one application")]
    StageInUse(StageId),

    /// The compare-and-swap guard on the stage pointer failed.
    #[error("application {0} changed stage concurrently")]
    StaleStage(ApplicationId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl PipelineRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<diesel::result::Error> for PipelineRepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        Self::persistence(err)
    }
}
