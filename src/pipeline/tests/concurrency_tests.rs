//! Tests for the compare-and-swap guard on concurrent stage moves.

use std::sync::Arc;

use crate::pipeline::{
    adapters::memory::InMemoryPipelineRepository,
    domain::{
        Application, ApplicationId, CandidateProfile, Job, JobId, PersistedStageData, Stage,
        StageId, StageName, StagePlan, StageTransition, OrderIndex,
    },
    ports::{
        ApplicationRepository, PipelineRepositoryError, PipelineRepositoryResult,
        StageRepository,
    },
    services::{
        MoveApplicationRequest, ReplayReport, StageRegistryService, StageTransitionService,
        TransitionError,
    },
};
use crate::tenant::{CompanyId, TenantContext, UserId};
use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};
use rstest::{fixture, rstest};

type TestTransitions = StageTransitionService<InMemoryPipelineRepository, DefaultClock>;
type TestRegistry = StageRegistryService<InMemoryPipelineRepository, DefaultClock>;

struct Board {
    repository: Arc<InMemoryPipelineRepository>,
    transitions: TestTransitions,
    registry: TestRegistry,
    ctx: TenantContext,
}

#[fixture]
fn board() -> Board {
    let repository = Arc::new(InMemoryPipelineRepository::new());
    let clock = Arc::new(DefaultClock);
    Board {
        transitions: StageTransitionService::new(Arc::clone(&repository), Arc::clone(&clock)),
        registry: StageRegistryService::new(Arc::clone(&repository), clock),
        repository,
        ctx: TenantContext::new(CompanyId::new(), UserId::new()),
    }
}

struct Placed {
    job: JobId,
    application: Application,
    triagem: StageId,
    entrevista: StageId,
    contratacao: StageId,
}

/// Seeds a default pipeline with one application placed in Triagem.
async fn placed_application(board: &Board) -> Placed {
    let (job, stages) = board
        .registry
        .create_job(&board.ctx, None)
        .await
        .expect("job creation should succeed");
    let find = |name: &str| {
        stages
            .iter()
            .find(|stage| stage.name().as_str() == name)
            .map(Stage::id)
            .expect("stage should exist")
    };
    let (triagem, entrevista, contratacao) =
        (find("Triagem"), find("Entrevista"), find("Contratação"));

    let application = Application::new(
        job.id(),
        board.ctx.company_id(),
        CandidateProfile::new("Carla", "carla@example.com"),
        &DefaultClock,
    );
    board
        .repository
        .create_application(&application)
        .await
        .expect("application creation should succeed");
    let outcome = board
        .transitions
        .move_application(
            &board.ctx,
            MoveApplicationRequest::new(job.id(), application.id(), triagem),
        )
        .await
        .expect("placement should succeed");

    Placed {
        job: job.id(),
        application: outcome.application().clone(),
        triagem,
        entrevista,
        contratacao,
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn racing_commits_from_one_read_leave_exactly_one_ledger_row(board: Board) {
    let placed = placed_application(&board).await;
    let clock = DefaultClock;

    // Both writers read the application while it sat in Triagem.
    let to_entrevista = StageTransition::record(
        &placed.application,
        placed.entrevista,
        board.ctx.user_id(),
        None,
        &clock,
    );
    let to_contratacao = StageTransition::record(
        &placed.application,
        placed.contratacao,
        board.ctx.user_id(),
        None,
        &clock,
    );

    let first = board
        .repository
        .commit_transition(&to_entrevista, Some(placed.triagem), clock.utc())
        .await;
    let second = board
        .repository
        .commit_transition(&to_contratacao, Some(placed.triagem), clock.utc())
        .await;

    assert!(first.is_ok());
    assert!(matches!(
        second,
        Err(PipelineRepositoryError::StaleStage(id)) if id == placed.application.id()
    ));

    let history = board
        .transitions
        .stage_history(&board.ctx, placed.job, placed.application.id())
        .await
        .expect("history should load");
    assert_eq!(history.len(), 2);
    assert_eq!(
        history.last().map(|row| row.to_stage_id()),
        Some(placed.entrevista)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_moves_never_desynchronise_ledger_and_pointer(board: Board) {
    let placed = placed_application(&board).await;

    let to_entrevista = board.transitions.move_application(
        &board.ctx,
        MoveApplicationRequest::new(placed.job, placed.application.id(), placed.entrevista),
    );
    let to_contratacao = board.transitions.move_application(
        &board.ctx,
        MoveApplicationRequest::new(placed.job, placed.application.id(), placed.contratacao),
    );
    let (first, second) = tokio::join!(to_entrevista, to_contratacao);

    let successes = [&first, &second]
        .into_iter()
        .filter(|result| result.is_ok())
        .count();
    let conflicts = [&first, &second]
        .into_iter()
        .filter(|result| matches!(result, Err(TransitionError::Conflict(_))))
        .count();
    assert!(successes >= 1);
    assert_eq!(successes + conflicts, 2);

    let history = board
        .transitions
        .stage_history(&board.ctx, placed.job, placed.application.id())
        .await
        .expect("history should load");
    assert_eq!(history.len(), 1 + successes);

    let report = board
        .transitions
        .audit_replay(&board.ctx, placed.job, placed.application.id())
        .await
        .expect("replay should run");
    assert!(report.is_consistent());
    assert!(matches!(report, ReplayReport::Consistent { stage: Some(_) }));
}

mockall::mock! {
    PipelineRepo {}

    #[async_trait::async_trait]
    impl StageRepository for PipelineRepo {
        async fn create_job(&self, job: &Job) -> PipelineRepositoryResult<()>;
        async fn find_job(
            &self,
            company: CompanyId,
            job: JobId,
        ) -> PipelineRepositoryResult<Option<Job>>;
        async fn find_stage(
            &self,
            job: JobId,
            stage: StageId,
        ) -> PipelineRepositoryResult<Option<Stage>>;
        async fn list_stages(&self, job: JobId) -> PipelineRepositoryResult<Vec<Stage>>;
        async fn rewrite_stages(
            &self,
            job: JobId,
            plan: &StagePlan,
            now: DateTime<Utc>,
        ) -> PipelineRepositoryResult<Vec<Stage>>;
    }

    #[async_trait::async_trait]
    impl ApplicationRepository for PipelineRepo {
        async fn create_application(
            &self,
            application: &Application,
        ) -> PipelineRepositoryResult<()>;
        async fn find_in_job(
            &self,
            company: CompanyId,
            job: JobId,
            application: ApplicationId,
        ) -> PipelineRepositoryResult<Option<Application>>;
        async fn find_in_company(
            &self,
            company: CompanyId,
            application: ApplicationId,
        ) -> PipelineRepositoryResult<Option<Application>>;
        async fn record_evaluation(
            &self,
            application: &Application,
        ) -> PipelineRepositoryResult<()>;
        async fn commit_transition(
            &self,
            transition: &StageTransition,
            expected_from: Option<StageId>,
            now: DateTime<Utc>,
        ) -> PipelineRepositoryResult<()>;
        async fn history(
            &self,
            company: CompanyId,
            job: JobId,
            application: ApplicationId,
        ) -> PipelineRepositoryResult<Vec<StageTransition>>;
        async fn list_by_stage(
            &self,
            company: CompanyId,
            job: JobId,
            stage: StageId,
        ) -> PipelineRepositoryResult<Vec<Application>>;
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lost_compare_and_swap_surfaces_as_a_conflict() {
    let ctx = TenantContext::new(CompanyId::new(), UserId::new());
    let clock = DefaultClock;
    let job_id = JobId::new();
    let stage = Stage::from_persisted(PersistedStageData {
        id: StageId::new(),
        job_id,
        name: StageName::new("Entrevista").expect("valid name"),
        description: None,
        order_index: OrderIndex::new(1).expect("valid position"),
        is_active: true,
        created_at: clock.utc(),
        updated_at: clock.utc(),
    });
    let application = Application::new(
        job_id,
        ctx.company_id(),
        CandidateProfile::new("Davi", "davi@example.com"),
        &clock,
    );
    let application_id = application.id();
    let stage_id = stage.id();

    let mut mock = MockPipelineRepo::new();
    mock.expect_find_in_job()
        .returning(move |_, _, _| Ok(Some(application.clone())));
    mock.expect_find_stage()
        .returning(move |_, _| Ok(Some(stage.clone())));
    mock.expect_commit_transition()
        .returning(move |_, _, _| Err(PipelineRepositoryError::StaleStage(application_id)));

    let service = StageTransitionService::new(Arc::new(mock), Arc::new(DefaultClock));
    let result = service
        .move_application(&ctx, MoveApplicationRequest::new(job_id, application_id, stage_id))
        .await;

    assert!(matches!(
        result,
        Err(TransitionError::Conflict(id)) if id == application_id
    ));
}
