//! Stage transition engine: validated, audited moves across the board.

use crate::pipeline::{
    domain::{
        Application, ApplicationId, BoardSort, JobId, ReplayError, StageId, StageTransition,
        replay_current_stage,
    },
    ports::{ApplicationRepository, PipelineRepositoryError, StageRepository},
};
use crate::tenant::TenantContext;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for moving an application to a target stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveApplicationRequest {
    job_id: JobId,
    application_id: ApplicationId,
    to_stage_id: StageId,
    notes: Option<String>,
}

impl MoveApplicationRequest {
    /// Creates a move request.
    #[must_use]
    pub const fn new(job_id: JobId, application_id: ApplicationId, to_stage_id: StageId) -> Self {
        Self {
            job_id,
            application_id,
            to_stage_id,
            notes: None,
        }
    }

    /// Attaches a free-form note to the resulting ledger row.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Result of a move request.
///
/// A request targeting the application's current stage is not an error:
/// it changes nothing, appends nothing to the ledger, and reports the
/// live application as-is. This keeps redundant client retries out of
/// the audit trail.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// The application changed stage and a ledger row was appended.
    Moved {
        /// Application with the advanced stage pointer.
        application: Application,
        /// The ledger row recording the move.
        transition: StageTransition,
    },
    /// The application was already in the target stage.
    AlreadyInStage {
        /// The unchanged application.
        application: Application,
    },
}

impl MoveOutcome {
    /// Returns whether the move changed the application's stage.
    #[must_use]
    pub const fn changed(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }

    /// Returns the application after the request.
    #[must_use]
    pub const fn application(&self) -> &Application {
        match self {
            Self::Moved { application, .. } | Self::AlreadyInStage { application } => application,
        }
    }

    /// Returns the appended ledger row, if the move changed stage.
    #[must_use]
    pub const fn transition(&self) -> Option<&StageTransition> {
        match self {
            Self::Moved { transition, .. } => Some(transition),
            Self::AlreadyInStage { .. } => None,
        }
    }
}

/// Result of replaying an application's ledger against its live pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayReport {
    /// The ledger folds exactly to the live pointer.
    Consistent {
        /// Stage both sources agree on; `None` for a never-moved
        /// application.
        stage: Option<StageId>,
    },
    /// The ledger folds to a different stage than the live pointer.
    Diverged {
        /// Stage the ledger proves.
        ledger_stage: Option<StageId>,
        /// Stage the live pointer holds.
        live_stage: Option<StageId>,
    },
    /// The ledger itself violates the chain invariant.
    CorruptLedger(ReplayError),
}

impl ReplayReport {
    /// Returns whether ledger and pointer agree.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        matches!(self, Self::Consistent { .. })
    }
}

/// Service-level errors for stage transition operations.
#[derive(Debug, Error)]
pub enum TransitionError {
    /// The application is absent or belongs to another company or job;
    /// the cases are deliberately indistinguishable.
    #[error("application not found: {0}")]
    ApplicationNotFound(ApplicationId),

    /// The job is absent or belongs to another company.
    #[error("job not found: {0}")]
    JobNotFound(JobId),

    /// The target stage does not exist, is inactive, or belongs to
    /// another job.
    #[error("stage {0} is not a valid target for this job")]
    InvalidStage(StageId),

    /// A concurrent transition won the race; refetch and retry.
    #[error("application {0} changed stage concurrently")]
    Conflict(ApplicationId),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(PipelineRepositoryError),
}

impl From<PipelineRepositoryError> for TransitionError {
    fn from(err: PipelineRepositoryError) -> Self {
        match err {
            PipelineRepositoryError::StaleStage(id) => Self::Conflict(id),
            PipelineRepositoryError::UnknownApplication(id) => Self::ApplicationNotFound(id),
            PipelineRepositoryError::UnknownJob(id) => Self::JobNotFound(id),
            other => Self::Repository(other),
        }
    }
}

/// Result type for stage transition service operations.
pub type TransitionResult<T> = Result<T, TransitionError>;

/// Stage transition orchestration service.
#[derive(Clone)]
pub struct StageTransitionService<R, C>
where
    R: ApplicationRepository + StageRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> StageTransitionService<R, C>
where
    R: ApplicationRepository + StageRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new stage transition service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Moves an application to a target stage of its job.
    ///
    /// Appends a ledger row and advances the live pointer in one atomic
    /// commit. Moving to the current stage is a documented no-op that
    /// returns [`MoveOutcome::AlreadyInStage`] without touching the
    /// ledger.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::ApplicationNotFound`] when the
    /// application cannot be resolved within the caller's tenant,
    /// [`TransitionError::InvalidStage`] when the target fails a stage
    /// constraint, and [`TransitionError::Conflict`] when a concurrent
    /// move invalidated the read; the caller should refetch and retry.
    pub async fn move_application(
        &self,
        ctx: &TenantContext,
        request: MoveApplicationRequest,
    ) -> TransitionResult<MoveOutcome> {
        let application = self
            .repository
            .find_in_job(ctx.company_id(), request.job_id, request.application_id)
            .await?
            .ok_or(TransitionError::ApplicationNotFound(request.application_id))?;

        let stage = self
            .repository
            .find_stage(request.job_id, request.to_stage_id)
            .await?
            .ok_or(TransitionError::InvalidStage(request.to_stage_id))?;
        if !stage.is_active() {
            return Err(TransitionError::InvalidStage(stage.id()));
        }

        if application.current_stage_id() == Some(stage.id()) {
            tracing::debug!(
                application = %application.id(),
                stage = %stage.id(),
                "application already in target stage; skipping ledger write"
            );
            return Ok(MoveOutcome::AlreadyInStage { application });
        }

        let expected_from = application.current_stage_id();
        let transition = StageTransition::record(
            &application,
            stage.id(),
            ctx.user_id(),
            request.notes,
            &*self.clock,
        );
        let committed_at = transition.created_at();
        match self
            .repository
            .commit_transition(&transition, expected_from, committed_at)
            .await
        {
            Ok(()) => {}
            Err(PipelineRepositoryError::StaleStage(id)) => {
                tracing::warn!(
                    application = %id,
                    "stage pointer changed under a concurrent move; reporting conflict"
                );
                return Err(TransitionError::Conflict(id));
            }
            Err(err) => return Err(err.into()),
        }

        tracing::debug!(
            application = %application.id(),
            from = ?expected_from,
            to = %stage.id(),
            "application moved"
        );
        let mut moved = application;
        moved.advance_to(stage.id(), committed_at);
        Ok(MoveOutcome::Moved {
            application: moved,
            transition,
        })
    }

    /// Returns an application's transition ledger in creation order,
    /// oldest first; empty if the application has never moved.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::ApplicationNotFound`] when the
    /// application cannot be resolved within the caller's tenant.
    pub async fn stage_history(
        &self,
        ctx: &TenantContext,
        job_id: JobId,
        application_id: ApplicationId,
    ) -> TransitionResult<Vec<StageTransition>> {
        let application = self
            .repository
            .find_in_job(ctx.company_id(), job_id, application_id)
            .await?
            .ok_or(TransitionError::ApplicationNotFound(application_id))?;
        Ok(self
            .repository
            .history(ctx.company_id(), job_id, application.id())
            .await?)
    }

    /// Returns the applications currently sitting in one board column,
    /// ordered by the caller-supplied sort key.
    ///
    /// Only the live pointer matters here; ledger contents are
    /// irrelevant to column membership.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::JobNotFound`] when the job cannot be
    /// resolved within the caller's tenant and
    /// [`TransitionError::InvalidStage`] when the stage does not belong
    /// to the job.
    pub async fn board_column(
        &self,
        ctx: &TenantContext,
        job_id: JobId,
        stage_id: StageId,
        sort: BoardSort,
    ) -> TransitionResult<Vec<Application>> {
        self.repository
            .find_job(ctx.company_id(), job_id)
            .await?
            .ok_or(TransitionError::JobNotFound(job_id))?;
        self.repository
            .find_stage(job_id, stage_id)
            .await?
            .ok_or(TransitionError::InvalidStage(stage_id))?;

        let mut applications = self
            .repository
            .list_by_stage(ctx.company_id(), job_id, stage_id)
            .await?;
        sort.apply(&mut applications);
        Ok(applications)
    }

    /// Replays an application's ledger and compares the folded result
    /// with the live stage pointer.
    ///
    /// A maintenance and test tool: under the atomic commit of
    /// [`Self::move_application`] the two can never diverge, so any
    /// inconsistency reported here points at storage-level tampering or
    /// corruption.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::ApplicationNotFound`] when the
    /// application cannot be resolved within the caller's tenant.
    pub async fn audit_replay(
        &self,
        ctx: &TenantContext,
        job_id: JobId,
        application_id: ApplicationId,
    ) -> TransitionResult<ReplayReport> {
        let application = self
            .repository
            .find_in_job(ctx.company_id(), job_id, application_id)
            .await?
            .ok_or(TransitionError::ApplicationNotFound(application_id))?;
        let ledger = self
            .repository
            .history(ctx.company_id(), job_id, application.id())
            .await?;

        let report = match replay_current_stage(&ledger) {
            Err(err) => ReplayReport::CorruptLedger(err),
            Ok(ledger_stage) if ledger_stage == application.current_stage_id() => {
                ReplayReport::Consistent {
                    stage: ledger_stage,
                }
            }
            Ok(ledger_stage) => ReplayReport::Diverged {
                ledger_stage,
                live_stage: application.current_stage_id(),
            },
        };
        if !report.is_consistent() {
            tracing::warn!(
                application = %application.id(),
                report = ?report,
                "ledger replay does not match live stage pointer"
            );
        }
        Ok(report)
    }
}
