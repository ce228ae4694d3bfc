//! Tag catalog service: authoring a company's reusable labels.

use crate::tagging::{
    domain::{Tag, TagColor, TagDomainError, TagId, TagLabel},
    ports::{TagRepository, TagRepositoryError},
};
use crate::tenant::TenantContext;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for creating a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTagRequest {
    label: String,
    color: Option<String>,
    text_color: Option<String>,
}

impl CreateTagRequest {
    /// Creates a request with the required label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            color: None,
            text_color: None,
        }
    }

    /// Sets the badge background colour.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Sets the badge text colour.
    #[must_use]
    pub fn with_text_color(mut self, text_color: impl Into<String>) -> Self {
        self.text_color = Some(text_color.into());
        self
    }
}

/// Request payload for updating a tag; unset fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTagRequest {
    label: Option<String>,
    color: Option<String>,
    text_color: Option<String>,
}

impl UpdateTagRequest {
    /// Creates an empty update.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            label: None,
            color: None,
            text_color: None,
        }
    }

    /// Replaces the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Replaces the badge background colour.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Replaces the badge text colour.
    #[must_use]
    pub fn with_text_color(mut self, text_color: impl Into<String>) -> Self {
        self.text_color = Some(text_color.into());
        self
    }
}

/// Service-level errors for tag catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The tag is absent or belongs to another company; the cases are
    /// deliberately indistinguishable.
    #[error("tag not found: {0}")]
    NotFound(TagId),

    /// The company already has a tag with this label.
    #[error("a tag labelled '{label}' already exists")]
    DuplicateLabel {
        /// The colliding label.
        label: TagLabel,
    },

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TagDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(TagRepositoryError),
}

impl From<TagRepositoryError> for CatalogError {
    fn from(err: TagRepositoryError) -> Self {
        match err {
            TagRepositoryError::DuplicateLabel { label, .. } => Self::DuplicateLabel { label },
            TagRepositoryError::UnknownTag(id) => Self::NotFound(id),
            other => Self::Repository(other),
        }
    }
}

/// Result type for tag catalog service operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Tag catalog orchestration service.
#[derive(Clone)]
pub struct TagCatalogService<T, C>
where
    T: TagRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<T>,
    clock: Arc<C>,
}

impl<T, C> TagCatalogService<T, C>
where
    T: TagRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new tag catalog service.
    #[must_use]
    pub const fn new(repository: Arc<T>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Creates a tag in the caller's catalog.
    ///
    /// Label uniqueness rides on the storage constraint; two racing
    /// creates with the same label resolve to one row and one
    /// [`CatalogError::DuplicateLabel`].
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Domain`] on invalid label or colour and
    /// [`CatalogError::DuplicateLabel`] on a label collision.
    pub async fn create_tag(
        &self,
        ctx: &TenantContext,
        request: CreateTagRequest,
    ) -> CatalogResult<Tag> {
        let label = TagLabel::new(request.label)?;
        let color = match request.color {
            Some(value) => TagColor::new(value)?,
            None => TagColor::default_background(),
        };
        let text_color = match request.text_color {
            Some(value) => TagColor::new(value)?,
            None => TagColor::default_text(),
        };

        let tag = Tag::new(ctx.company_id(), label, color, text_color, &*self.clock);
        self.repository.create_tag(&tag).await?;
        tracing::debug!(tag = %tag.id(), label = %tag.label(), "tag created");
        Ok(tag)
    }

    /// Updates a tag's label and colours.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when the tag cannot be
    /// resolved within the caller's tenant, [`CatalogError::Domain`] on
    /// invalid values, and [`CatalogError::DuplicateLabel`] on a label
    /// collision.
    pub async fn update_tag(
        &self,
        ctx: &TenantContext,
        tag_id: TagId,
        request: UpdateTagRequest,
    ) -> CatalogResult<Tag> {
        let mut tag = self.require_tag(ctx, tag_id).await?;

        if let Some(label) = request.label {
            tag.relabel(TagLabel::new(label)?, &*self.clock);
        }
        if request.color.is_some() || request.text_color.is_some() {
            let color = match request.color {
                Some(value) => TagColor::new(value)?,
                None => tag.color().clone(),
            };
            let text_color = match request.text_color {
                Some(value) => TagColor::new(value)?,
                None => tag.text_color().clone(),
            };
            tag.recolor(color, text_color, &*self.clock);
        }

        self.repository.update_tag(&tag).await?;
        Ok(tag)
    }

    /// Returns the caller's catalog ordered by label.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Repository`] on persistence failure.
    pub async fn list_tags(&self, ctx: &TenantContext) -> CatalogResult<Vec<Tag>> {
        Ok(self.repository.list_tags(ctx.company_id()).await?)
    }

    /// Returns one tag of the caller's catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when the tag cannot be
    /// resolved within the caller's tenant.
    pub async fn find_tag(&self, ctx: &TenantContext, tag_id: TagId) -> CatalogResult<Tag> {
        self.require_tag(ctx, tag_id).await
    }

    /// Deletes a tag; its associations cascade away with it.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when the tag cannot be
    /// resolved within the caller's tenant.
    pub async fn delete_tag(&self, ctx: &TenantContext, tag_id: TagId) -> CatalogResult<()> {
        let deleted = self
            .repository
            .delete_tag(ctx.company_id(), tag_id)
            .await?;
        if !deleted {
            return Err(CatalogError::NotFound(tag_id));
        }
        tracing::debug!(tag = %tag_id, "tag deleted");
        Ok(())
    }

    async fn require_tag(&self, ctx: &TenantContext, tag_id: TagId) -> CatalogResult<Tag> {
        self.repository
            .find_tag(ctx.company_id(), tag_id)
            .await?
            .ok_or(CatalogError::NotFound(tag_id))
    }
}
