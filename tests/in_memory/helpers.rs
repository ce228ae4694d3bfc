//! Shared test helpers for in-memory integration tests.

use std::sync::{Arc, Once};

use mockable::DefaultClock;
use rstest::fixture;
use talentflow::pipeline::{
    adapters::memory::InMemoryPipelineRepository,
    domain::{Application, CandidateProfile, JobId, Stage, StageId},
    ports::ApplicationRepository,
    services::{StageRegistryService, StageTransitionService},
};
use talentflow::tagging::{
    adapters::memory::InMemoryTagRepository,
    services::{TagAnnotationService, TagCatalogService},
};
use talentflow::tenant::{CompanyId, TenantContext, UserId};

/// Fully wired in-memory deployment of both bounded contexts.
pub struct TestBed {
    /// Shared pipeline storage.
    pub pipeline: Arc<InMemoryPipelineRepository>,
    /// Shared tag storage.
    pub tags: Arc<InMemoryTagRepository>,
    /// Stage transition engine under test.
    pub transitions: StageTransitionService<InMemoryPipelineRepository, DefaultClock>,
    /// Stage registry under test.
    pub registry: StageRegistryService<InMemoryPipelineRepository, DefaultClock>,
    /// Tag catalog under test.
    pub catalog: TagCatalogService<InMemoryTagRepository, DefaultClock>,
    /// Tag association engine under test.
    pub annotations:
        TagAnnotationService<InMemoryTagRepository, InMemoryPipelineRepository, DefaultClock>,
    /// Acting recruiter context.
    pub ctx: TenantContext,
}

static TRACING: Once = Once::new();

/// Installs a compact subscriber once so service events show up under
/// `--nocapture`.
fn init_tracing() {
    TRACING.call_once(|| {
        drop(
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_test_writer()
                .try_init(),
        );
    });
}

/// Provides a fresh wired test bed for each test.
#[fixture]
pub fn testbed() -> TestBed {
    init_tracing();
    let pipeline = Arc::new(InMemoryPipelineRepository::new());
    let tags = Arc::new(InMemoryTagRepository::new());
    let clock = Arc::new(DefaultClock);
    TestBed {
        transitions: StageTransitionService::new(Arc::clone(&pipeline), Arc::clone(&clock)),
        registry: StageRegistryService::new(Arc::clone(&pipeline), Arc::clone(&clock)),
        catalog: TagCatalogService::new(Arc::clone(&tags), Arc::clone(&clock)),
        annotations: TagAnnotationService::new(Arc::clone(&tags), Arc::clone(&pipeline), clock),
        pipeline,
        tags,
        ctx: TenantContext::new(CompanyId::new(), UserId::new()),
    }
}

/// Creates a job with the default pipeline for the given tenant.
pub async fn seed_job(bed: &TestBed, ctx: &TenantContext) -> (JobId, Vec<Stage>) {
    let (job, stages) = bed
        .registry
        .create_job(ctx, None)
        .await
        .expect("job creation should succeed");
    (job.id(), stages)
}

/// Stores an application submitted to `job` by a fresh candidate.
pub async fn seed_application(bed: &TestBed, ctx: &TenantContext, job: JobId) -> Application {
    let application = Application::new(
        job,
        ctx.company_id(),
        CandidateProfile::new("Marina", "marina@example.com").with_last_name("Lima"),
        &DefaultClock,
    );
    bed.pipeline
        .create_application(&application)
        .await
        .expect("application creation should succeed");
    application
}

/// Looks up a stage by display name.
pub fn stage_named(stages: &[Stage], name: &str) -> StageId {
    stages
        .iter()
        .find(|stage| stage.name().as_str() == name)
        .map(Stage::id)
        .expect("stage should exist")
}
