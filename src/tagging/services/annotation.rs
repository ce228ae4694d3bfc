//! Tag association engine: attaching and detaching labels on
//! applications.

use crate::pipeline::{
    domain::ApplicationId,
    ports::{ApplicationRepository, PipelineRepositoryError},
};
use crate::tagging::{
    domain::{AppliedTag, Tag, TagAssociation, TagId},
    ports::{TagRepository, TagRepositoryError},
};
use crate::tenant::TenantContext;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for tag association operations.
#[derive(Debug, Error)]
pub enum AnnotationError {
    /// The application is absent or belongs to another company; the
    /// cases are deliberately indistinguishable.
    #[error("application not found: {0}")]
    ApplicationNotFound(ApplicationId),

    /// The tag does not exist in the caller's catalog.
    #[error("tag {0} is not in the company's catalog")]
    InvalidTag(TagId),

    /// Tag repository operation failed.
    #[error(transparent)]
    TagRepository(TagRepositoryError),

    /// Application store operation failed.
    #[error(transparent)]
    ApplicationStore(PipelineRepositoryError),
}

impl From<TagRepositoryError> for AnnotationError {
    fn from(err: TagRepositoryError) -> Self {
        match err {
            TagRepositoryError::UnknownTag(id) => Self::InvalidTag(id),
            other => Self::TagRepository(other),
        }
    }
}

impl From<PipelineRepositoryError> for AnnotationError {
    fn from(err: PipelineRepositoryError) -> Self {
        match err {
            PipelineRepositoryError::UnknownApplication(id) => Self::ApplicationNotFound(id),
            other => Self::ApplicationStore(other),
        }
    }
}

/// Result type for tag association service operations.
pub type AnnotationResult<T> = Result<T, AnnotationError>;

/// Tag association orchestration service.
///
/// Validates both ends of an association before touching storage: the
/// application must resolve within the caller's tenant, and the tag must
/// belong to the caller's catalog.
#[derive(Clone)]
pub struct TagAnnotationService<T, A, C>
where
    T: TagRepository,
    A: ApplicationRepository,
    C: Clock + Send + Sync,
{
    tags: Arc<T>,
    applications: Arc<A>,
    clock: Arc<C>,
}

impl<T, A, C> TagAnnotationService<T, A, C>
where
    T: TagRepository,
    A: ApplicationRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new tag association service.
    #[must_use]
    pub const fn new(tags: Arc<T>, applications: Arc<A>, clock: Arc<C>) -> Self {
        Self {
            tags,
            applications,
            clock,
        }
    }

    /// Attaches a tag to an application, idempotently.
    ///
    /// A duplicate add returns the existing association; optimistic UI
    /// double-clicks and retries never surface an error.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationError::ApplicationNotFound`] when the
    /// application cannot be resolved within the caller's tenant and
    /// [`AnnotationError::InvalidTag`] when the tag is not in the
    /// caller's catalog.
    pub async fn add_tag(
        &self,
        ctx: &TenantContext,
        application_id: ApplicationId,
        tag_id: TagId,
    ) -> AnnotationResult<TagAssociation> {
        let application = self.require_application(ctx, application_id).await?;
        let tag = self.require_tag(ctx, tag_id).await?;

        let association =
            TagAssociation::record(application, tag.id(), ctx.user_id(), &*self.clock);
        let stored = self.tags.attach(&association).await?;
        tracing::debug!(
            application = %application,
            tag = %tag.id(),
            "tag attached"
        );
        Ok(stored)
    }

    /// Detaches a tag from an application, idempotently.
    ///
    /// Removing an association that does not exist succeeds silently;
    /// the caller only cares that the end state holds no association.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationError::ApplicationNotFound`] when the
    /// application cannot be resolved within the caller's tenant and
    /// [`AnnotationError::InvalidTag`] when the tag is not in the
    /// caller's catalog.
    pub async fn remove_tag(
        &self,
        ctx: &TenantContext,
        application_id: ApplicationId,
        tag_id: TagId,
    ) -> AnnotationResult<()> {
        let application = self.require_application(ctx, application_id).await?;
        let tag = self.require_tag(ctx, tag_id).await?;

        let removed = self.tags.detach(application, tag.id()).await?;
        if !removed {
            tracing::debug!(
                application = %application,
                tag = %tag.id(),
                "tag was not attached; detach is a no-op"
            );
        }
        Ok(())
    }

    /// Returns an application's tags with display fields, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationError::ApplicationNotFound`] when the
    /// application cannot be resolved within the caller's tenant.
    pub async fn list_tags(
        &self,
        ctx: &TenantContext,
        application_id: ApplicationId,
    ) -> AnnotationResult<Vec<AppliedTag>> {
        let application = self.require_application(ctx, application_id).await?;
        Ok(self.tags.list_for_application(application).await?)
    }

    /// Returns every application association of one catalog tag, newest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationError::InvalidTag`] when the tag is not in
    /// the caller's catalog.
    pub async fn applications_for_tag(
        &self,
        ctx: &TenantContext,
        tag_id: TagId,
    ) -> AnnotationResult<Vec<TagAssociation>> {
        let tag = self.require_tag(ctx, tag_id).await?;
        Ok(self.tags.associations_for_tag(tag.id()).await?)
    }

    async fn require_application(
        &self,
        ctx: &TenantContext,
        application_id: ApplicationId,
    ) -> AnnotationResult<ApplicationId> {
        let application = self
            .applications
            .find_in_company(ctx.company_id(), application_id)
            .await?
            .ok_or(AnnotationError::ApplicationNotFound(application_id))?;
        Ok(application.id())
    }

    async fn require_tag(&self, ctx: &TenantContext, tag_id: TagId) -> AnnotationResult<Tag> {
        self.tags
            .find_tag(ctx.company_id(), tag_id)
            .await?
            .ok_or(AnnotationError::InvalidTag(tag_id))
    }
}
