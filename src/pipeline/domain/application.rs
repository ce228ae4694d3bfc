//! Application aggregate: one candidate's submission to one job.

use super::{ApplicationId, JobId, StageId};
use crate::tenant::CompanyId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};

/// Candidate identity captured at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    /// Candidate first name.
    pub first_name: String,
    /// Candidate last name, if provided.
    pub last_name: Option<String>,
    /// Candidate contact email.
    pub email: String,
}

impl CandidateProfile {
    /// Creates a candidate profile.
    #[must_use]
    pub fn new(first_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: None,
            email: email.into(),
        }
    }

    /// Sets the candidate last name.
    #[must_use]
    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }
}

/// Evaluation results written by the external AI-scoring collaborator.
///
/// Opaque to this core except for board ordering; `details` carries
/// whatever breakdown the collaborator produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationScores {
    /// Resume-screening score, if computed.
    pub ai_score: Option<f64>,
    /// Aggregate evaluation score, if computed.
    pub overall_score: Option<f64>,
    /// Provider-specific breakdown payload.
    pub details: Option<serde_json::Value>,
}

/// One candidate's application to one job.
///
/// `company_id` is denormalised from the job so every read and write can
/// be tenant-scoped without a join. `current_stage_id` is `None` until
/// the application is first placed on the board; once set it always
/// references a stage of `job_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    id: ApplicationId,
    job_id: JobId,
    company_id: CompanyId,
    candidate: CandidateProfile,
    current_stage_id: Option<StageId>,
    evaluation: EvaluationScores,
    submitted_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted application.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedApplicationData {
    /// Persisted application identifier.
    pub id: ApplicationId,
    /// Persisted job the candidate applied to.
    pub job_id: JobId,
    /// Persisted owning company.
    pub company_id: CompanyId,
    /// Persisted candidate identity.
    pub candidate: CandidateProfile,
    /// Persisted board position, if placed.
    pub current_stage_id: Option<StageId>,
    /// Persisted evaluation results.
    pub evaluation: EvaluationScores,
    /// Persisted submission timestamp.
    pub submitted_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Creates a new application from a candidate submission.
    ///
    /// The application starts unplaced; the first stage move puts it on
    /// the board.
    #[must_use]
    pub fn new(
        job_id: JobId,
        company_id: CompanyId,
        candidate: CandidateProfile,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ApplicationId::new(),
            job_id,
            company_id,
            candidate,
            current_stage_id: None,
            evaluation: EvaluationScores::default(),
            submitted_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs an application from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedApplicationData) -> Self {
        Self {
            id: data.id,
            job_id: data.job_id,
            company_id: data.company_id,
            candidate: data.candidate,
            current_stage_id: data.current_stage_id,
            evaluation: data.evaluation,
            submitted_at: data.submitted_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the application identifier.
    #[must_use]
    pub const fn id(&self) -> ApplicationId {
        self.id
    }

    /// Returns the job the candidate applied to.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Returns the owning company.
    #[must_use]
    pub const fn company_id(&self) -> CompanyId {
        self.company_id
    }

    /// Returns the candidate identity.
    #[must_use]
    pub const fn candidate(&self) -> &CandidateProfile {
        &self.candidate
    }

    /// Returns the current board position, or `None` if unplaced.
    #[must_use]
    pub const fn current_stage_id(&self) -> Option<StageId> {
        self.current_stage_id
    }

    /// Returns the evaluation results.
    #[must_use]
    pub const fn evaluation(&self) -> &EvaluationScores {
        &self.evaluation
    }

    /// Returns the submission timestamp.
    #[must_use]
    pub const fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Moves the live stage pointer to `stage_id`.
    ///
    /// `at` is the creation time of the ledger row recording the move,
    /// so the pointer and the ledger always carry the same timestamp.
    pub const fn advance_to(&mut self, stage_id: StageId, at: DateTime<Utc>) {
        self.current_stage_id = Some(stage_id);
        self.updated_at = at;
    }

    /// Stores evaluation results delivered by the scoring collaborator.
    pub fn record_evaluation(&mut self, evaluation: EvaluationScores, clock: &impl Clock) {
        self.evaluation = evaluation;
        self.updated_at = clock.utc();
    }
}

/// Caller-supplied ordering for board columns.
///
/// Equal keys keep no particular order; callers must not rely on sort
/// stability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardSort {
    /// Highest aggregate evaluation score first; unscored applications last.
    OverallScoreDesc,
    /// Most recent submission first.
    #[default]
    SubmittedAtDesc,
}

impl BoardSort {
    /// Sorts a board column in place according to this key.
    pub fn apply(self, applications: &mut [Application]) {
        match self {
            Self::OverallScoreDesc => {
                applications.sort_by(|a, b| {
                    compare_scores_desc(
                        a.evaluation().overall_score,
                        b.evaluation().overall_score,
                    )
                });
            }
            Self::SubmittedAtDesc => {
                applications.sort_by_key(|application| Reverse(application.submitted_at()));
            }
        }
    }
}

/// Descending comparison that sinks unscored applications to the end.
fn compare_scores_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(left), Some(right)) => right.total_cmp(&left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
