//! Diesel row models for tagging persistence.

use super::schema::{application_tags, tags};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for tag records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TagRow {
    /// Tag identifier.
    pub id: uuid::Uuid,
    /// Owning company.
    pub company_id: uuid::Uuid,
    /// Display label.
    pub label: String,
    /// Badge background colour.
    pub color: String,
    /// Badge text colour.
    pub text_color: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for tag records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tags)]
pub struct NewTagRow {
    /// Tag identifier.
    pub id: uuid::Uuid,
    /// Owning company.
    pub company_id: uuid::Uuid,
    /// Display label.
    pub label: String,
    /// Badge background colour.
    pub color: String,
    /// Badge text colour.
    pub text_color: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for association records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = application_tags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AssociationRow {
    /// Association identifier.
    pub id: uuid::Uuid,
    /// Tagged application.
    pub application_id: uuid::Uuid,
    /// Attached tag.
    pub tag_id: uuid::Uuid,
    /// User who attached the tag.
    pub added_by_user_id: uuid::Uuid,
    /// Attachment timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for association records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = application_tags)]
pub struct NewAssociationRow {
    /// Association identifier.
    pub id: uuid::Uuid,
    /// Tagged application.
    pub application_id: uuid::Uuid,
    /// Attached tag.
    pub tag_id: uuid::Uuid,
    /// User who attached the tag.
    pub added_by_user_id: uuid::Uuid,
    /// Attachment timestamp.
    pub created_at: DateTime<Utc>,
}
