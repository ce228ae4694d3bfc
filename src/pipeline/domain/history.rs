//! Append-only ledger of stage transitions.

use super::{Application, ApplicationId, JobId, ReplayError, StageId, TransitionId};
use crate::tenant::{CompanyId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// One row of the stage transition ledger.
///
/// Rows are immutable once written; `job_id` and `company_id` are
/// denormalised from the application so the ledger can be queried and
/// tenant-scoped without joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransition {
    id: TransitionId,
    application_id: ApplicationId,
    job_id: JobId,
    company_id: CompanyId,
    from_stage_id: Option<StageId>,
    to_stage_id: StageId,
    changed_by: UserId,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTransitionData {
    /// Persisted transition identifier.
    pub id: TransitionId,
    /// Persisted application the row belongs to.
    pub application_id: ApplicationId,
    /// Persisted owning job.
    pub job_id: JobId,
    /// Persisted owning company.
    pub company_id: CompanyId,
    /// Persisted origin stage; `None` for the first placement.
    pub from_stage_id: Option<StageId>,
    /// Persisted destination stage.
    pub to_stage_id: StageId,
    /// Persisted acting user.
    pub changed_by: UserId,
    /// Persisted free-form note, if any.
    pub notes: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl StageTransition {
    /// Records the move of `application` to `to_stage_id`.
    ///
    /// The origin is taken from the application's live pointer at call
    /// time; committing the row is conditioned on that pointer still
    /// holding, so a stale record never reaches the ledger.
    #[must_use]
    pub fn record(
        application: &Application,
        to_stage_id: StageId,
        changed_by: UserId,
        notes: Option<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: TransitionId::new(),
            application_id: application.id(),
            job_id: application.job_id(),
            company_id: application.company_id(),
            from_stage_id: application.current_stage_id(),
            to_stage_id,
            changed_by,
            notes,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a transition from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTransitionData) -> Self {
        Self {
            id: data.id,
            application_id: data.application_id,
            job_id: data.job_id,
            company_id: data.company_id,
            from_stage_id: data.from_stage_id,
            to_stage_id: data.to_stage_id,
            changed_by: data.changed_by,
            notes: data.notes,
            created_at: data.created_at,
        }
    }

    /// Returns the transition identifier.
    #[must_use]
    pub const fn id(&self) -> TransitionId {
        self.id
    }

    /// Returns the application this row belongs to.
    #[must_use]
    pub const fn application_id(&self) -> ApplicationId {
        self.application_id
    }

    /// Returns the owning job.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Returns the owning company.
    #[must_use]
    pub const fn company_id(&self) -> CompanyId {
        self.company_id
    }

    /// Returns the origin stage; `None` for the first placement.
    #[must_use]
    pub const fn from_stage_id(&self) -> Option<StageId> {
        self.from_stage_id
    }

    /// Returns the destination stage.
    #[must_use]
    pub const fn to_stage_id(&self) -> StageId {
        self.to_stage_id
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn changed_by(&self) -> UserId {
        self.changed_by
    }

    /// Returns the free-form note, if any.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Folds a ledger, given in creation order, down to the stage it proves.
///
/// Verifies the chain invariant on the way: the first row must start
/// from an unplaced application, every later row must start where the
/// previous one ended, and no row may stay in place. The result is the
/// stage the application must currently be in.
///
/// # Errors
///
/// Returns [`ReplayError::BrokenChain`] on a discontinuity and
/// [`ReplayError::StationaryRow`] on a row that does not change stage.
pub fn replay_current_stage(
    transitions: &[StageTransition],
) -> Result<Option<StageId>, ReplayError> {
    let mut current: Option<StageId> = None;
    for (index, transition) in transitions.iter().enumerate() {
        if transition.from_stage_id() != current {
            return Err(ReplayError::BrokenChain { index });
        }
        if transition.from_stage_id() == Some(transition.to_stage_id()) {
            return Err(ReplayError::StationaryRow { index });
        }
        current = Some(transition.to_stage_id());
    }
    Ok(current)
}
