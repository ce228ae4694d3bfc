//! Job entity owning the hiring pipeline of a posting.

use super::{JobId, ParseJobStatusError};
use crate::tenant::CompanyId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Publication status of a job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is being authored and not yet visible to candidates.
    Draft,
    /// Job accepts candidate submissions.
    Published,
    /// Job is temporarily hidden from candidates.
    Paused,
    /// Job no longer accepts submissions.
    Closed,
}

impl JobStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Paused => "paused",
            Self::Closed => "closed",
        }
    }
}

impl TryFrom<&str> for JobStatus {
    type Error = ParseJobStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "paused" => Ok(Self::Paused),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseJobStatusError(value.to_owned())),
        }
    }
}

/// Job posting owning an ordered set of hiring stages.
///
/// Authoring and publication workflows live outside this core; the job is
/// carried here for tenancy checks and as the owner of its stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    id: JobId,
    company_id: CompanyId,
    status: JobStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedJobData {
    /// Persisted job identifier.
    pub id: JobId,
    /// Persisted owning company.
    pub company_id: CompanyId,
    /// Persisted publication status.
    pub status: JobStatus,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Creates a new draft job for a company.
    #[must_use]
    pub fn new(company_id: CompanyId, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: JobId::new(),
            company_id,
            status: JobStatus::Draft,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a job from persisted storage.
    #[must_use]
    pub const fn from_persisted(data: PersistedJobData) -> Self {
        Self {
            id: data.id,
            company_id: data.company_id,
            status: data.status,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the job identifier.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// Returns the owning company.
    #[must_use]
    pub const fn company_id(&self) -> CompanyId {
        self.company_id
    }

    /// Returns the publication status.
    #[must_use]
    pub const fn status(&self) -> JobStatus {
        self.status
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
