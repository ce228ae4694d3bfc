//! Behaviour tests for the tag association engine.

use std::sync::Arc;

use crate::pipeline::{
    adapters::memory::InMemoryPipelineRepository,
    domain::{Application, CandidateProfile, JobId},
    ports::ApplicationRepository,
    services::StageRegistryService,
};
use crate::tagging::{
    adapters::memory::InMemoryTagRepository,
    domain::Tag,
    services::{
        AnnotationError, CreateTagRequest, TagAnnotationService, TagCatalogService,
    },
};
use crate::tenant::{CompanyId, TenantContext, UserId};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

type TestAnnotations =
    TagAnnotationService<InMemoryTagRepository, InMemoryPipelineRepository, DefaultClock>;
type TestCatalog = TagCatalogService<InMemoryTagRepository, DefaultClock>;
type TestRegistry = StageRegistryService<InMemoryPipelineRepository, DefaultClock>;

struct Tagging {
    pipeline: Arc<InMemoryPipelineRepository>,
    annotations: TestAnnotations,
    catalog: TestCatalog,
    registry: TestRegistry,
    ctx: TenantContext,
}

#[fixture]
fn tagging() -> Tagging {
    let pipeline = Arc::new(InMemoryPipelineRepository::new());
    let tags = Arc::new(InMemoryTagRepository::new());
    let clock = Arc::new(DefaultClock);
    Tagging {
        annotations: TagAnnotationService::new(
            Arc::clone(&tags),
            Arc::clone(&pipeline),
            Arc::clone(&clock),
        ),
        catalog: TagCatalogService::new(tags, Arc::clone(&clock)),
        registry: StageRegistryService::new(Arc::clone(&pipeline), clock),
        pipeline,
        ctx: TenantContext::new(CompanyId::new(), UserId::new()),
    }
}

/// Seeds a job and one application for the given tenant.
async fn seed_application(tagging: &Tagging, ctx: &TenantContext) -> Application {
    let (job, _) = tagging
        .registry
        .create_job(ctx, None)
        .await
        .expect("job creation should succeed");
    seed_application_for_job(tagging, ctx, job.id()).await
}

async fn seed_application_for_job(
    tagging: &Tagging,
    ctx: &TenantContext,
    job: JobId,
) -> Application {
    let application = Application::new(
        job,
        ctx.company_id(),
        CandidateProfile::new("Elisa", "elisa@example.com"),
        &DefaultClock,
    );
    tagging
        .pipeline
        .create_application(&application)
        .await
        .expect("application creation should succeed");
    application
}

async fn seed_tag(tagging: &Tagging, ctx: &TenantContext, label: &str) -> Tag {
    tagging
        .catalog
        .create_tag(ctx, CreateTagRequest::new(label))
        .await
        .expect("tag creation should succeed")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn attaching_a_tag_records_the_acting_user(tagging: Tagging) {
    let application = seed_application(&tagging, &tagging.ctx).await;
    let tag = seed_tag(&tagging, &tagging.ctx, "Finalista").await;

    let association = tagging
        .annotations
        .add_tag(&tagging.ctx, application.id(), tag.id())
        .await
        .expect("attach should succeed");

    assert_eq!(association.application_id(), application.id());
    assert_eq!(association.tag_id(), tag.id());
    assert_eq!(association.added_by(), tagging.ctx.user_id());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_attach_returns_the_existing_association(tagging: Tagging) {
    let application = seed_application(&tagging, &tagging.ctx).await;
    let tag = seed_tag(&tagging, &tagging.ctx, "Finalista").await;

    let first = tagging
        .annotations
        .add_tag(&tagging.ctx, application.id(), tag.id())
        .await
        .expect("first attach should succeed");
    let second = tagging
        .annotations
        .add_tag(&tagging.ctx, application.id(), tag.id())
        .await
        .expect("duplicate attach should succeed");

    assert_eq!(first.id(), second.id());

    let applied = tagging
        .annotations
        .list_tags(&tagging.ctx, application.id())
        .await
        .expect("listing should succeed");
    assert_eq!(applied.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_foreign_companys_tag_is_invalid(tagging: Tagging) {
    let owner = TenantContext::new(CompanyId::new(), UserId::new());
    let tag = seed_tag(&tagging, &owner, "Finalista").await;
    let application = seed_application(&tagging, &tagging.ctx).await;

    let result = tagging
        .annotations
        .add_tag(&tagging.ctx, application.id(), tag.id())
        .await;

    assert!(matches!(
        result,
        Err(AnnotationError::InvalidTag(id)) if id == tag.id()
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_foreign_companys_application_is_not_found(tagging: Tagging) {
    let owner = TenantContext::new(CompanyId::new(), UserId::new());
    let application = seed_application(&tagging, &owner).await;
    let tag = seed_tag(&tagging, &tagging.ctx, "Finalista").await;

    let result = tagging
        .annotations
        .add_tag(&tagging.ctx, application.id(), tag.id())
        .await;

    assert!(matches!(
        result,
        Err(AnnotationError::ApplicationNotFound(id)) if id == application.id()
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn detaching_an_absent_association_is_a_silent_no_op(tagging: Tagging) {
    let application = seed_application(&tagging, &tagging.ctx).await;
    let tag = seed_tag(&tagging, &tagging.ctx, "Finalista").await;

    tagging
        .annotations
        .remove_tag(&tagging.ctx, application.id(), tag.id())
        .await
        .expect("detach of absent association should succeed");

    let applied = tagging
        .annotations
        .list_tags(&tagging.ctx, application.id())
        .await
        .expect("listing should succeed");
    assert!(applied.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn detach_is_idempotent(tagging: Tagging) {
    let application = seed_application(&tagging, &tagging.ctx).await;
    let tag = seed_tag(&tagging, &tagging.ctx, "Finalista").await;
    tagging
        .annotations
        .add_tag(&tagging.ctx, application.id(), tag.id())
        .await
        .expect("attach should succeed");

    for _ in 0..2 {
        tagging
            .annotations
            .remove_tag(&tagging.ctx, application.id(), tag.id())
            .await
            .expect("detach should succeed");
    }

    let applied = tagging
        .annotations
        .list_tags(&tagging.ctx, application.id())
        .await
        .expect("listing should succeed");
    assert!(applied.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listing_denormalises_badge_fields(tagging: Tagging) {
    let application = seed_application(&tagging, &tagging.ctx).await;
    let tag = tagging
        .catalog
        .create_tag(
            &tagging.ctx,
            CreateTagRequest::new("Finalista").with_color("#16A34A"),
        )
        .await
        .expect("tag creation should succeed");
    tagging
        .annotations
        .add_tag(&tagging.ctx, application.id(), tag.id())
        .await
        .expect("attach should succeed");

    let applied = tagging
        .annotations
        .list_tags(&tagging.ctx, application.id())
        .await
        .expect("listing should succeed");

    let badge = applied.first().expect("one tag should be attached");
    assert_eq!(badge.label.as_str(), "Finalista");
    assert_eq!(badge.color.as_str(), "#16A34A");
    assert_eq!(badge.text_color.as_str(), "#FFFFFF");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn associations_can_be_listed_per_tag(tagging: Tagging) {
    let (job, _) = tagging
        .registry
        .create_job(&tagging.ctx, None)
        .await
        .expect("job creation should succeed");
    let first = seed_application_for_job(&tagging, &tagging.ctx, job.id()).await;
    let second = seed_application_for_job(&tagging, &tagging.ctx, job.id()).await;
    let tag = seed_tag(&tagging, &tagging.ctx, "Finalista").await;
    for application in [&first, &second] {
        tagging
            .annotations
            .add_tag(&tagging.ctx, application.id(), tag.id())
            .await
            .expect("attach should succeed");
    }

    let associations = tagging
        .annotations
        .applications_for_tag(&tagging.ctx, tag.id())
        .await
        .expect("listing should succeed");

    let mut tagged: Vec<_> = associations
        .iter()
        .map(|association| association.application_id())
        .collect();
    tagged.sort_by_key(|id| id.into_inner());
    let mut expected = vec![first.id(), second.id()];
    expected.sort_by_key(|id| id.into_inner());
    assert_eq!(tagged, expected);

    let intruder = TenantContext::new(CompanyId::new(), UserId::new());
    let cross_tenant = tagging
        .annotations
        .applications_for_tag(&intruder, tag.id())
        .await;
    assert!(matches!(cross_tenant, Err(AnnotationError::InvalidTag(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_tag_cascades_its_associations(tagging: Tagging) {
    let application = seed_application(&tagging, &tagging.ctx).await;
    let tag = seed_tag(&tagging, &tagging.ctx, "Finalista").await;
    tagging
        .annotations
        .add_tag(&tagging.ctx, application.id(), tag.id())
        .await
        .expect("attach should succeed");

    tagging
        .catalog
        .delete_tag(&tagging.ctx, tag.id())
        .await
        .expect("deletion should succeed");

    let applied = tagging
        .annotations
        .list_tags(&tagging.ctx, application.id())
        .await
        .expect("listing should succeed");
    assert!(applied.is_empty());
}
