//! Stage registry service: authoring and querying a job's pipeline.

use crate::pipeline::{
    domain::{
        Job, JobId, PipelineDomainError, Stage, StageId, StagePlan, default_stage_plan,
    },
    ports::{PipelineRepositoryError, StageRepository},
};
use crate::tenant::TenantContext;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for stage registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The job is absent or belongs to another company; the cases are
    /// deliberately indistinguishable.
    #[error("job not found: {0}")]
    JobNotFound(JobId),

    /// A plan entry targets a stage the job does not own.
    #[error("stage {0} does not belong to this job")]
    UnknownStage(StageId),

    /// The plan omits a stage still holding at least one application.
    #[error("stage {0} is the current stage of at least one application")]
    StageInUse(StageId),

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] PipelineDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(PipelineRepositoryError),
}

impl From<PipelineRepositoryError> for RegistryError {
    fn from(err: PipelineRepositoryError) -> Self {
        match err {
            PipelineRepositoryError::UnknownJob(id) => Self::JobNotFound(id),
            PipelineRepositoryError::UnknownStage(id) => Self::UnknownStage(id),
            PipelineRepositoryError::StageInUse(id) => Self::StageInUse(id),
            other => Self::Repository(other),
        }
    }
}

/// Result type for stage registry service operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Stage registry orchestration service.
#[derive(Clone)]
pub struct StageRegistryService<R, C>
where
    R: StageRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> StageRegistryService<R, C>
where
    R: StageRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new stage registry service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Creates a draft job for the caller's company with its initial
    /// pipeline.
    ///
    /// When no plan is given, the default Triagem / Entrevista /
    /// Contratação template is applied.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the plan fails validation or the
    /// repository rejects persistence.
    pub async fn create_job(
        &self,
        ctx: &TenantContext,
        plan: Option<StagePlan>,
    ) -> RegistryResult<(Job, Vec<Stage>)> {
        let plan = match plan {
            Some(plan) => plan,
            None => default_stage_plan()?,
        };
        let job = Job::new(ctx.company_id(), &*self.clock);
        self.repository.create_job(&job).await?;
        let stages = self
            .repository
            .rewrite_stages(job.id(), &plan, self.clock.utc())
            .await?;
        tracing::debug!(job = %job.id(), stages = stages.len(), "job created with initial pipeline");
        Ok((job, stages))
    }

    /// Returns the active stages of a job ordered by pipeline position.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::JobNotFound`] when the job cannot be
    /// resolved within the caller's tenant.
    pub async fn list_active_stages(
        &self,
        ctx: &TenantContext,
        job_id: JobId,
    ) -> RegistryResult<Vec<Stage>> {
        self.require_job(ctx, job_id).await?;
        let stages = self.repository.list_stages(job_id).await?;
        Ok(stages.into_iter().filter(Stage::is_active).collect())
    }

    /// Returns whether `stage_id` is a stage of `job_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::JobNotFound`] when the job cannot be
    /// resolved within the caller's tenant.
    pub async fn stage_belongs_to_job(
        &self,
        ctx: &TenantContext,
        job_id: JobId,
        stage_id: StageId,
    ) -> RegistryResult<bool> {
        self.require_job(ctx, job_id).await?;
        Ok(self.repository.find_stage(job_id, stage_id).await?.is_some())
    }

    /// Replaces a job's stage list with a validated plan.
    ///
    /// A stage omitted from the plan is deleted unless referenced: a
    /// stage holding any application's current pointer rejects the plan
    /// with [`RegistryError::StageInUse`], and a stage referenced only
    /// by ledger rows is deactivated instead of deleted.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::JobNotFound`],
    /// [`RegistryError::UnknownStage`], or [`RegistryError::StageInUse`]
    /// as described, or [`RegistryError::Repository`] on persistence
    /// failure.
    pub async fn rewrite_stages(
        &self,
        ctx: &TenantContext,
        job_id: JobId,
        plan: StagePlan,
    ) -> RegistryResult<Vec<Stage>> {
        self.require_job(ctx, job_id).await?;
        let stages = self
            .repository
            .rewrite_stages(job_id, &plan, self.clock.utc())
            .await?;
        tracing::debug!(job = %job_id, stages = stages.len(), "stage list rewritten");
        Ok(stages)
    }

    async fn require_job(&self, ctx: &TenantContext, job_id: JobId) -> RegistryResult<Job> {
        self.repository
            .find_job(ctx.company_id(), job_id)
            .await?
            .ok_or(RegistryError::JobNotFound(job_id))
    }
}
