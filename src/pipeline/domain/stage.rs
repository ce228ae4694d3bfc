//! Hiring stage entity and the bulk-rewrite stage plan.

use super::{JobId, OrderIndex, PipelineDomainError, StageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Validated stage display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageName(String);

impl StageName {
    /// Widest name the persisted column accepts.
    const MAX_LENGTH: usize = 255;

    /// Creates a validated stage name.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::EmptyStageName`] when the trimmed
    /// value is empty, or [`PipelineDomainError::StageNameTooLong`] when it
    /// exceeds the persisted column width.
    pub fn new(value: impl Into<String>) -> Result<Self, PipelineDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PipelineDomainError::EmptyStageName);
        }
        let length = trimmed.chars().count();
        if length > Self::MAX_LENGTH {
            return Err(PipelineDomainError::StageNameTooLong(length));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StageName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named, ordered step in a job's hiring pipeline.
///
/// Stages are authored with their job and rewritten as a whole list; a
/// stage that has been referenced by an application is deactivated on
/// removal rather than deleted, so ledger rows always resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    id: StageId,
    job_id: JobId,
    name: StageName,
    description: Option<String>,
    order_index: OrderIndex,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedStageData {
    /// Persisted stage identifier.
    pub id: StageId,
    /// Persisted owning job.
    pub job_id: JobId,
    /// Persisted display name.
    pub name: StageName,
    /// Persisted description, if any.
    pub description: Option<String>,
    /// Persisted pipeline position.
    pub order_index: OrderIndex,
    /// Persisted activity flag.
    pub is_active: bool,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Stage {
    /// Reconstructs a stage from persisted storage.
    ///
    /// Stages are only ever materialised from a [`StagePlan`] by the
    /// stage repository, which stamps timestamps itself; there is no
    /// free-standing constructor.
    #[must_use]
    pub fn from_persisted(data: PersistedStageData) -> Self {
        Self {
            id: data.id,
            job_id: data.job_id,
            name: data.name,
            description: data.description,
            order_index: data.order_index,
            is_active: data.is_active,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the stage identifier.
    #[must_use]
    pub const fn id(&self) -> StageId {
        self.id
    }

    /// Returns the owning job.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Returns the display name.
    #[must_use]
    pub const fn name(&self) -> &StageName {
        &self.name
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the pipeline position.
    #[must_use]
    pub const fn order_index(&self) -> OrderIndex {
        self.order_index
    }

    /// Returns whether the stage accepts new placements.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// One entry of a bulk stage rewrite.
///
/// An entry carrying the identifier of an existing stage updates that
/// stage in place; an entry without one creates a new stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDraft {
    /// Existing stage to update, or `None` to create a new stage.
    pub id: Option<StageId>,
    /// Display name.
    pub name: StageName,
    /// Optional description.
    pub description: Option<String>,
    /// Pipeline position.
    pub order_index: OrderIndex,
    /// Whether the stage accepts new placements.
    pub is_active: bool,
}

impl StageDraft {
    /// Creates an active draft for a new stage.
    #[must_use]
    pub const fn new(name: StageName, order_index: OrderIndex) -> Self {
        Self {
            id: None,
            name,
            description: None,
            order_index,
            is_active: true,
        }
    }

    /// Sets the draft description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Targets an existing stage instead of creating a new one.
    #[must_use]
    pub const fn for_existing(mut self, id: StageId) -> Self {
        self.id = Some(id);
        self
    }

    /// Marks the draft inactive.
    #[must_use]
    pub const fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Validated payload for rewriting a job's whole stage list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    entries: Vec<StageDraft>,
}

impl StagePlan {
    /// Creates a validated stage plan.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::DuplicateOrderIndex`] when two
    /// entries share a position, or
    /// [`PipelineDomainError::DuplicateStageInPlan`] when two entries
    /// target the same existing stage.
    pub fn new(entries: Vec<StageDraft>) -> Result<Self, PipelineDomainError> {
        let mut seen_positions = HashSet::new();
        let mut seen_ids = HashSet::new();
        for entry in &entries {
            if !seen_positions.insert(entry.order_index) {
                return Err(PipelineDomainError::DuplicateOrderIndex(
                    entry.order_index.value(),
                ));
            }
            if let Some(id) = entry.id
                && !seen_ids.insert(id)
            {
                return Err(PipelineDomainError::DuplicateStageInPlan(id));
            }
        }
        Ok(Self { entries })
    }

    /// Returns the plan entries.
    #[must_use]
    pub fn entries(&self) -> &[StageDraft] {
        &self.entries
    }

    /// Returns the identifiers of existing stages the plan keeps.
    #[must_use]
    pub fn retained_stage_ids(&self) -> HashSet<StageId> {
        self.entries.iter().filter_map(|entry| entry.id).collect()
    }
}

/// Returns the pipeline template applied when a job is authored without
/// explicit stages: Triagem, Entrevista, and Contratação.
///
/// # Errors
///
/// Never fails in practice; the template values satisfy every
/// invariant, and the `Result` only reflects the fallible constructors.
pub fn default_stage_plan() -> Result<StagePlan, PipelineDomainError> {
    let entries = vec![
        StageDraft::new(StageName::new("Triagem")?, OrderIndex::new(0)?)
            .with_description("Avaliação inicial dos candidatos"),
        StageDraft::new(StageName::new("Entrevista")?, OrderIndex::new(1)?)
            .with_description("Entrevista com candidatos selecionados"),
        StageDraft::new(StageName::new("Contratação")?, OrderIndex::new(2)?)
            .with_description("Processo final de contratação"),
    ];
    StagePlan::new(entries)
}
