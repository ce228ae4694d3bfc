//! Repository port for tag catalog and association persistence.

use crate::pipeline::domain::ApplicationId;
use crate::tagging::domain::{AppliedTag, Tag, TagAssociation, TagId, TagLabel};
use crate::tenant::CompanyId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for tag repository operations.
pub type TagRepositoryResult<T> = Result<T, TagRepositoryError>;

/// Tag catalog and association persistence contract.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Stores a new tag.
    ///
    /// Uniqueness of `(company_id, label)` is enforced by the storage
    /// constraint, not by a read-then-write check.
    ///
    /// # Errors
    ///
    /// Returns [`TagRepositoryError::DuplicateLabel`] when the company
    /// already has a tag with this label.
    async fn create_tag(&self, tag: &Tag) -> TagRepositoryResult<()>;

    /// Persists changes to an existing tag (label, colours, timestamps).
    ///
    /// # Errors
    ///
    /// Returns [`TagRepositoryError::UnknownTag`] when the tag does not
    /// exist and [`TagRepositoryError::DuplicateLabel`] when the new
    /// label collides within the company.
    async fn update_tag(&self, tag: &Tag) -> TagRepositoryResult<()>;

    /// Deletes a tag of `company` and cascades its associations.
    ///
    /// Returns `false` when no such tag exists in the company; absent
    /// and cross-company tags are indistinguishable.
    async fn delete_tag(&self, company: CompanyId, tag: TagId) -> TagRepositoryResult<bool>;

    /// Finds a tag of `company`.
    ///
    /// Returns `None` for absent tags and for tags of another company.
    async fn find_tag(&self, company: CompanyId, tag: TagId)
    -> TagRepositoryResult<Option<Tag>>;

    /// Returns the catalog of `company` ordered by label.
    async fn list_tags(&self, company: CompanyId) -> TagRepositoryResult<Vec<Tag>>;

    /// Attaches a tag to an application, idempotently.
    ///
    /// A duplicate attach resolves to the stored association rather than
    /// an error, built on the unique `(application_id, tag_id)`
    /// constraint; two racing inserts both observe the same surviving
    /// row.
    async fn attach(&self, association: &TagAssociation)
    -> TagRepositoryResult<TagAssociation>;

    /// Detaches a tag from an application.
    ///
    /// Returns `false` when no such association existed; a duplicate
    /// detach race is a no-op on both sides.
    async fn detach(
        &self,
        application: ApplicationId,
        tag: TagId,
    ) -> TagRepositoryResult<bool>;

    /// Returns an application's tags with display fields, newest first.
    async fn list_for_application(
        &self,
        application: ApplicationId,
    ) -> TagRepositoryResult<Vec<AppliedTag>>;

    /// Returns all associations of one tag, newest first.
    async fn associations_for_tag(
        &self,
        tag: TagId,
    ) -> TagRepositoryResult<Vec<TagAssociation>>;
}

/// Errors returned by tag repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TagRepositoryError {
    /// The company already has a tag with this label.
    #[error("company {company} already has a tag labelled '{label}'")]
    DuplicateLabel {
        /// Owning company.
        company: CompanyId,
        /// The colliding label.
        label: TagLabel,
    },

    /// The tag was not found.
    #[error("unknown tag: {0}")]
    UnknownTag(TagId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TagRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<diesel::result::Error> for TagRepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        Self::persistence(err)
    }
}
