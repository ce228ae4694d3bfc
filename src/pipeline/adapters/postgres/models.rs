//! Diesel row models for pipeline persistence.

use super::schema::{application_stage_history, applications, job_stages, jobs};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for job records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobRow {
    /// Job identifier.
    pub id: uuid::Uuid,
    /// Owning company.
    pub company_id: uuid::Uuid,
    /// Publication status.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for job records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = jobs)]
pub struct NewJobRow {
    /// Job identifier.
    pub id: uuid::Uuid,
    /// Owning company.
    pub company_id: uuid::Uuid,
    /// Publication status.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for stage records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = job_stages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StageRow {
    /// Stage identifier.
    pub id: uuid::Uuid,
    /// Owning job.
    pub job_id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Pipeline position.
    pub order_index: i32,
    /// Whether the stage accepts new placements.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for stage records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = job_stages)]
pub struct NewStageRow {
    /// Stage identifier.
    pub id: uuid::Uuid,
    /// Owning job.
    pub job_id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Pipeline position.
    pub order_index: i32,
    /// Whether the stage accepts new placements.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for application records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = applications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ApplicationRow {
    /// Application identifier.
    pub id: uuid::Uuid,
    /// Job the candidate applied to.
    pub job_id: uuid::Uuid,
    /// Owning company.
    pub company_id: uuid::Uuid,
    /// Candidate first name.
    pub first_name: String,
    /// Candidate last name.
    pub last_name: Option<String>,
    /// Candidate contact email.
    pub email: String,
    /// Current board position.
    pub current_stage_id: Option<uuid::Uuid>,
    /// Resume-screening score.
    pub ai_score: Option<f64>,
    /// Aggregate evaluation score.
    pub overall_score: Option<f64>,
    /// Provider-specific evaluation breakdown.
    pub evaluation_details: Option<Value>,
    /// Submission timestamp.
    pub submitted_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for application records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = applications)]
pub struct NewApplicationRow {
    /// Application identifier.
    pub id: uuid::Uuid,
    /// Job the candidate applied to.
    pub job_id: uuid::Uuid,
    /// Owning company.
    pub company_id: uuid::Uuid,
    /// Candidate first name.
    pub first_name: String,
    /// Candidate last name.
    pub last_name: Option<String>,
    /// Candidate contact email.
    pub email: String,
    /// Current board position.
    pub current_stage_id: Option<uuid::Uuid>,
    /// Resume-screening score.
    pub ai_score: Option<f64>,
    /// Aggregate evaluation score.
    pub overall_score: Option<f64>,
    /// Provider-specific evaluation breakdown.
    pub evaluation_details: Option<Value>,
    /// Submission timestamp.
    pub submitted_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for ledger records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = application_stage_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TransitionRow {
    /// Ledger row identifier.
    pub id: uuid::Uuid,
    /// Application the row belongs to.
    pub application_id: uuid::Uuid,
    /// Owning job.
    pub job_id: uuid::Uuid,
    /// Owning company.
    pub company_id: uuid::Uuid,
    /// Origin stage.
    pub from_stage_id: Option<uuid::Uuid>,
    /// Destination stage.
    pub to_stage_id: uuid::Uuid,
    /// Acting user.
    pub changed_by: uuid::Uuid,
    /// Optional free-form note.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for ledger records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = application_stage_history)]
pub struct NewTransitionRow {
    /// Ledger row identifier.
    pub id: uuid::Uuid,
    /// Application the row belongs to.
    pub application_id: uuid::Uuid,
    /// Owning job.
    pub job_id: uuid::Uuid,
    /// Owning company.
    pub company_id: uuid::Uuid,
    /// Origin stage.
    pub from_stage_id: Option<uuid::Uuid>,
    /// Destination stage.
    pub to_stage_id: uuid::Uuid,
    /// Acting user.
    pub changed_by: uuid::Uuid,
    /// Optional free-form note.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
