//! Tag-to-application association and its display view.

use super::{AssociationId, Tag, TagColor, TagId, TagLabel};
use crate::pipeline::domain::ApplicationId;
use crate::tenant::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// One tag attached to one application.
///
/// Set-membership model: an application either holds a tag or it does
/// not, and the `(application_id, tag_id)` pair is unique. Deleting the
/// application or the tag cascades the association away at the storage
/// layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagAssociation {
    id: AssociationId,
    application_id: ApplicationId,
    tag_id: TagId,
    added_by: UserId,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedAssociationData {
    /// Persisted association identifier.
    pub id: AssociationId,
    /// Persisted application.
    pub application_id: ApplicationId,
    /// Persisted tag.
    pub tag_id: TagId,
    /// Persisted acting user.
    pub added_by: UserId,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TagAssociation {
    /// Records the attachment of `tag_id` to `application_id`.
    #[must_use]
    pub fn record(
        application_id: ApplicationId,
        tag_id: TagId,
        added_by: UserId,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: AssociationId::new(),
            application_id,
            tag_id,
            added_by,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs an association from persisted storage.
    #[must_use]
    pub const fn from_persisted(data: PersistedAssociationData) -> Self {
        Self {
            id: data.id,
            application_id: data.application_id,
            tag_id: data.tag_id,
            added_by: data.added_by,
            created_at: data.created_at,
        }
    }

    /// Returns the association identifier.
    #[must_use]
    pub const fn id(&self) -> AssociationId {
        self.id
    }

    /// Returns the tagged application.
    #[must_use]
    pub const fn application_id(&self) -> ApplicationId {
        self.application_id
    }

    /// Returns the attached tag.
    #[must_use]
    pub const fn tag_id(&self) -> TagId {
        self.tag_id
    }

    /// Returns the user who attached the tag.
    #[must_use]
    pub const fn added_by(&self) -> UserId {
        self.added_by
    }

    /// Returns the attachment timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// An association denormalised with its tag's display fields, as needed
/// for badge rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedTag {
    /// The underlying association.
    pub association: TagAssociation,
    /// Label of the attached tag.
    pub label: TagLabel,
    /// Badge background colour of the attached tag.
    pub color: TagColor,
    /// Badge text colour of the attached tag.
    pub text_color: TagColor,
}

impl AppliedTag {
    /// Joins an association with its tag's display fields.
    #[must_use]
    pub fn new(association: TagAssociation, tag: &Tag) -> Self {
        Self {
            association,
            label: tag.label().clone(),
            color: tag.color().clone(),
            text_color: tag.text_color().clone(),
        }
    }
}
