//! Tag aggregate and its validated scalars.

use super::{TagDomainError, TagId};
use crate::tenant::CompanyId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validated tag label, unique within a company.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagLabel(String);

impl TagLabel {
    /// Widest label the persisted column accepts.
    const MAX_LENGTH: usize = 100;

    /// Creates a validated tag label.
    ///
    /// # Errors
    ///
    /// Returns [`TagDomainError::EmptyLabel`] when the trimmed value is
    /// empty, or [`TagDomainError::LabelTooLong`] when it exceeds the
    /// persisted column width.
    pub fn new(value: impl Into<String>) -> Result<Self, TagDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TagDomainError::EmptyLabel);
        }
        let length = trimmed.chars().count();
        if length > Self::MAX_LENGTH {
            return Err(TagDomainError::LabelTooLong(length));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the label as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TagLabel {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TagLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated `#RRGGBB` colour for badge rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagColor(String);

impl TagColor {
    /// Creates a validated colour.
    ///
    /// # Errors
    ///
    /// Returns [`TagDomainError::InvalidColor`] when the value is not a
    /// `#` followed by six hex digits.
    pub fn new(value: impl Into<String>) -> Result<Self, TagDomainError> {
        let raw = value.into();
        let mut chars = raw.chars();
        let well_formed = chars.next() == Some('#')
            && raw.chars().count() == 7
            && chars.all(|c| c.is_ascii_hexdigit());
        if !well_formed {
            return Err(TagDomainError::InvalidColor(raw));
        }
        Ok(Self(raw.to_ascii_uppercase()))
    }

    /// Returns the default badge background colour.
    #[must_use]
    pub fn default_background() -> Self {
        Self("#3B82F6".to_owned())
    }

    /// Returns the default badge text colour.
    #[must_use]
    pub fn default_text() -> Self {
        Self("#FFFFFF".to_owned())
    }

    /// Returns the colour as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TagColor {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TagColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reusable, company-scoped label attachable to applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    id: TagId,
    company_id: CompanyId,
    label: TagLabel,
    color: TagColor,
    text_color: TagColor,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTagData {
    /// Persisted tag identifier.
    pub id: TagId,
    /// Persisted owning company.
    pub company_id: CompanyId,
    /// Persisted label.
    pub label: TagLabel,
    /// Persisted badge background colour.
    pub color: TagColor,
    /// Persisted badge text colour.
    pub text_color: TagColor,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Tag {
    /// Creates a new tag in a company's catalog.
    #[must_use]
    pub fn new(
        company_id: CompanyId,
        label: TagLabel,
        color: TagColor,
        text_color: TagColor,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TagId::new(),
            company_id,
            label,
            color,
            text_color,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a tag from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTagData) -> Self {
        Self {
            id: data.id,
            company_id: data.company_id,
            label: data.label,
            color: data.color,
            text_color: data.text_color,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the tag identifier.
    #[must_use]
    pub const fn id(&self) -> TagId {
        self.id
    }

    /// Returns the owning company.
    #[must_use]
    pub const fn company_id(&self) -> CompanyId {
        self.company_id
    }

    /// Returns the label.
    #[must_use]
    pub const fn label(&self) -> &TagLabel {
        &self.label
    }

    /// Returns the badge background colour.
    #[must_use]
    pub const fn color(&self) -> &TagColor {
        &self.color
    }

    /// Returns the badge text colour.
    #[must_use]
    pub const fn text_color(&self) -> &TagColor {
        &self.text_color
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

    /// Replaces the label.
    pub fn relabel(&mut self, label: TagLabel, clock: &impl Clock) {
        self.label = label;
        self.updated_at = clock.utc();
    }

    /// Replaces the badge colours.
    pub fn recolor(&mut self, color: TagColor, text_color: TagColor, clock: &impl Clock) {
        self.color = color;
        self.text_color = text_color;
        self.updated_at = clock.utc();
    }
}
