//! `PostgreSQL` repository implementation for pipeline storage.

use super::{
    models::{
        ApplicationRow, JobRow, NewApplicationRow, NewJobRow, NewStageRow, NewTransitionRow,
        StageRow, TransitionRow,
    },
    schema::{application_stage_history, applications, job_stages, jobs},
};
use crate::pipeline::{
    domain::{
        Application, ApplicationId, CandidateProfile, EvaluationScores, Job, JobId, JobStatus,
        OrderIndex, PersistedApplicationData, PersistedJobData, PersistedStageData,
        PersistedTransitionData, Stage, StageId, StageName, StagePlan, StageTransition,
        TransitionId,
    },
    ports::{
        ApplicationRepository, PipelineRepositoryError, PipelineRepositoryResult, StageRepository,
    },
};
use crate::tenant::{CompanyId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::HashSet;

/// `PostgreSQL` connection pool type used by pipeline adapters.
pub type PipelinePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed pipeline repository.
#[derive(Debug, Clone)]
pub struct PostgresPipelineRepository {
    pool: PipelinePgPool,
}

impl PostgresPipelineRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PipelinePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> PipelineRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> PipelineRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(PipelineRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(PipelineRepositoryError::persistence)?
    }
}

#[async_trait]
impl StageRepository for PostgresPipelineRepository {
    async fn create_job(&self, job: &Job) -> PipelineRepositoryResult<()> {
        let job_id = job.id();
        let new_row = job_to_new_row(job);

        self.run_blocking(move |connection| {
            diesel::insert_into(jobs::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        PipelineRepositoryError::JobExists(job_id)
                    }
                    _ => PipelineRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_job(
        &self,
        company: CompanyId,
        job: JobId,
    ) -> PipelineRepositoryResult<Option<Job>> {
        self.run_blocking(move |connection| {
            let row = jobs::table
                .filter(jobs::id.eq(job.into_inner()))
                .filter(jobs::company_id.eq(company.into_inner()))
                .select(JobRow::as_select())
                .first::<JobRow>(connection)
                .optional()
                .map_err(PipelineRepositoryError::persistence)?;
            row.map(row_to_job).transpose()
        })
        .await
    }

    async fn find_stage(
        &self,
        job: JobId,
        stage: StageId,
    ) -> PipelineRepositoryResult<Option<Stage>> {
        self.run_blocking(move |connection| {
            let row = job_stages::table
                .filter(job_stages::id.eq(stage.into_inner()))
                .filter(job_stages::job_id.eq(job.into_inner()))
                .select(StageRow::as_select())
                .first::<StageRow>(connection)
                .optional()
                .map_err(PipelineRepositoryError::persistence)?;
            row.map(row_to_stage).transpose()
        })
        .await
    }

    async fn list_stages(&self, job: JobId) -> PipelineRepositoryResult<Vec<Stage>> {
        self.run_blocking(move |connection| load_stages_ordered(connection, job))
            .await
    }

    async fn rewrite_stages(
        &self,
        job: JobId,
        plan: &StagePlan,
        now: DateTime<Utc>,
    ) -> PipelineRepositoryResult<Vec<Stage>> {
        let rewrite_plan = plan.clone();
        self.run_blocking(move |connection| {
            connection.transaction::<Vec<Stage>, PipelineRepositoryError, _>(|conn| {
                apply_stage_plan(conn, job, &rewrite_plan, now)
            })
        })
        .await
    }
}

#[async_trait]
impl ApplicationRepository for PostgresPipelineRepository {
    async fn create_application(
        &self,
        application: &Application,
    ) -> PipelineRepositoryResult<()> {
        let application_id = application.id();
        let job_id = application.job_id();
        let new_row = application_to_new_row(application);

        self.run_blocking(move |connection| {
            diesel::insert_into(applications::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        PipelineRepositoryError::ApplicationExists(application_id)
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        PipelineRepositoryError::UnknownJob(job_id)
                    }
                    _ => PipelineRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_in_job(
        &self,
        company: CompanyId,
        job: JobId,
        application: ApplicationId,
    ) -> PipelineRepositoryResult<Option<Application>> {
        self.run_blocking(move |connection| {
            let row = applications::table
                .filter(applications::id.eq(application.into_inner()))
                .filter(applications::job_id.eq(job.into_inner()))
                .filter(applications::company_id.eq(company.into_inner()))
                .select(ApplicationRow::as_select())
                .first::<ApplicationRow>(connection)
                .optional()
                .map_err(PipelineRepositoryError::persistence)?;
            Ok(row.map(row_to_application))
        })
        .await
    }

    async fn find_in_company(
        &self,
        company: CompanyId,
        application: ApplicationId,
    ) -> PipelineRepositoryResult<Option<Application>> {
        self.run_blocking(move |connection| {
            let row = applications::table
                .filter(applications::id.eq(application.into_inner()))
                .filter(applications::company_id.eq(company.into_inner()))
                .select(ApplicationRow::as_select())
                .first::<ApplicationRow>(connection)
                .optional()
                .map_err(PipelineRepositoryError::persistence)?;
            Ok(row.map(row_to_application))
        })
        .await
    }

    async fn record_evaluation(
        &self,
        application: &Application,
    ) -> PipelineRepositoryResult<()> {
        let application_id = application.id();
        let evaluation = application.evaluation().clone();
        let updated_at = application.updated_at();

        self.run_blocking(move |connection| {
            let updated = diesel::update(
                applications::table.filter(applications::id.eq(application_id.into_inner())),
            )
            .set((
                applications::ai_score.eq(evaluation.ai_score),
                applications::overall_score.eq(evaluation.overall_score),
                applications::evaluation_details.eq(evaluation.details.clone()),
                applications::updated_at.eq(updated_at),
            ))
            .execute(connection)
            .map_err(PipelineRepositoryError::persistence)?;
            if updated == 0 {
                return Err(PipelineRepositoryError::UnknownApplication(application_id));
            }
            Ok(())
        })
        .await
    }

    async fn commit_transition(
        &self,
        transition: &StageTransition,
        expected_from: Option<StageId>,
        now: DateTime<Utc>,
    ) -> PipelineRepositoryResult<()> {
        let new_row = transition_to_new_row(transition);
        let application_id = transition.application_id();
        let to_stage = transition.to_stage_id();

        self.run_blocking(move |connection| {
            connection.transaction::<(), PipelineRepositoryError, _>(|conn| {
                let swapped =
                    swap_stage_pointer(conn, application_id, expected_from, to_stage, now)?;
                if swapped == 0 {
                    let exists: i64 = applications::table
                        .filter(applications::id.eq(application_id.into_inner()))
                        .count()
                        .get_result(conn)?;
                    return Err(if exists == 0 {
                        PipelineRepositoryError::UnknownApplication(application_id)
                    } else {
                        PipelineRepositoryError::StaleStage(application_id)
                    });
                }
                diesel::insert_into(application_stage_history::table)
                    .values(&new_row)
                    .execute(conn)?;
                Ok(())
            })
        })
        .await
    }

    async fn history(
        &self,
        company: CompanyId,
        job: JobId,
        application: ApplicationId,
    ) -> PipelineRepositoryResult<Vec<StageTransition>> {
        self.run_blocking(move |connection| {
            let rows = application_stage_history::table
                .filter(application_stage_history::application_id.eq(application.into_inner()))
                .filter(application_stage_history::job_id.eq(job.into_inner()))
                .filter(application_stage_history::company_id.eq(company.into_inner()))
                .order(application_stage_history::created_at.asc())
                .select(TransitionRow::as_select())
                .load::<TransitionRow>(connection)
                .map_err(PipelineRepositoryError::persistence)?;
            Ok(rows.into_iter().map(row_to_transition).collect())
        })
        .await
    }

    async fn list_by_stage(
        &self,
        company: CompanyId,
        job: JobId,
        stage: StageId,
    ) -> PipelineRepositoryResult<Vec<Application>> {
        self.run_blocking(move |connection| {
            let rows = applications::table
                .filter(applications::company_id.eq(company.into_inner()))
                .filter(applications::job_id.eq(job.into_inner()))
                .filter(applications::current_stage_id.eq(stage.into_inner()))
                .select(ApplicationRow::as_select())
                .load::<ApplicationRow>(connection)
                .map_err(PipelineRepositoryError::persistence)?;
            Ok(rows.into_iter().map(row_to_application).collect())
        })
        .await
    }
}

/// Applies the compare-and-swap pointer update and reports affected rows.
fn swap_stage_pointer(
    connection: &mut PgConnection,
    application: ApplicationId,
    expected_from: Option<StageId>,
    to_stage: StageId,
    now: DateTime<Utc>,
) -> PipelineRepositoryResult<usize> {
    let changes = (
        applications::current_stage_id.eq(Some(to_stage.into_inner())),
        applications::updated_at.eq(now),
    );
    let affected = match expected_from {
        Some(stage) => diesel::update(
            applications::table
                .filter(applications::id.eq(application.into_inner()))
                .filter(applications::current_stage_id.eq(stage.into_inner())),
        )
        .set(changes)
        .execute(connection)?,
        None => diesel::update(
            applications::table
                .filter(applications::id.eq(application.into_inner()))
                .filter(applications::current_stage_id.is_null()),
        )
        .set(changes)
        .execute(connection)?,
    };
    Ok(affected)
}

/// Replaces a job's stage list inside the surrounding transaction.
fn apply_stage_plan(
    connection: &mut PgConnection,
    job: JobId,
    plan: &StagePlan,
    now: DateTime<Utc>,
) -> PipelineRepositoryResult<Vec<Stage>> {
    let job_known: i64 = jobs::table
        .filter(jobs::id.eq(job.into_inner()))
        .count()
        .get_result(connection)?;
    if job_known == 0 {
        return Err(PipelineRepositoryError::UnknownJob(job));
    }

    let existing = load_stages_ordered(connection, job)?;
    let existing_ids: HashSet<StageId> = existing.iter().map(Stage::id).collect();
    for entry in plan.entries() {
        if let Some(id) = entry.id
            && !existing_ids.contains(&id)
        {
            return Err(PipelineRepositoryError::UnknownStage(id));
        }
    }

    let retained = plan.retained_stage_ids();
    let held = held_stage_ids(connection, job)?;
    if let Some(in_use) = existing_ids
        .iter()
        .copied()
        .find(|id| !retained.contains(id) && held.contains(id))
    {
        return Err(PipelineRepositoryError::StageInUse(in_use));
    }

    let in_ledger = ledger_stage_ids(connection, job)?;
    for stage in &existing {
        if retained.contains(&stage.id()) {
            continue;
        }
        if in_ledger.contains(&stage.id()) {
            diesel::update(job_stages::table.filter(job_stages::id.eq(stage.id().into_inner())))
                .set((
                    job_stages::is_active.eq(false),
                    job_stages::updated_at.eq(now),
                ))
                .execute(connection)?;
        } else {
            diesel::delete(
                job_stages::table.filter(job_stages::id.eq(stage.id().into_inner())),
            )
            .execute(connection)?;
        }
    }

    for entry in plan.entries() {
        let order_index = persisted_order_index(entry.order_index)?;
        match entry.id {
            Some(id) => {
                diesel::update(job_stages::table.filter(job_stages::id.eq(id.into_inner())))
                    .set((
                        job_stages::name.eq(entry.name.as_str().to_owned()),
                        job_stages::description.eq(entry.description.clone()),
                        job_stages::order_index.eq(order_index),
                        job_stages::is_active.eq(entry.is_active),
                        job_stages::updated_at.eq(now),
                    ))
                    .execute(connection)?;
            }
            None => {
                let new_row = NewStageRow {
                    id: StageId::new().into_inner(),
                    job_id: job.into_inner(),
                    name: entry.name.as_str().to_owned(),
                    description: entry.description.clone(),
                    order_index,
                    is_active: entry.is_active,
                    created_at: now,
                    updated_at: now,
                };
                diesel::insert_into(job_stages::table)
                    .values(&new_row)
                    .execute(connection)?;
            }
        }
    }

    load_stages_ordered(connection, job)
}

fn load_stages_ordered(
    connection: &mut PgConnection,
    job: JobId,
) -> PipelineRepositoryResult<Vec<Stage>> {
    let rows = job_stages::table
        .filter(job_stages::job_id.eq(job.into_inner()))
        .order(job_stages::order_index.asc())
        .select(StageRow::as_select())
        .load::<StageRow>(connection)
        .map_err(PipelineRepositoryError::persistence)?;
    rows.into_iter().map(row_to_stage).collect()
}

/// Stage identifiers holding an application's current pointer.
fn held_stage_ids(
    connection: &mut PgConnection,
    job: JobId,
) -> PipelineRepositoryResult<HashSet<StageId>> {
    let held: Vec<Option<uuid::Uuid>> = applications::table
        .filter(applications::job_id.eq(job.into_inner()))
        .filter(applications::current_stage_id.is_not_null())
        .select(applications::current_stage_id)
        .distinct()
        .load(connection)?;
    Ok(held.into_iter().flatten().map(StageId::from_uuid).collect())
}

/// Stage identifiers appearing anywhere in the job's ledger.
fn ledger_stage_ids(
    connection: &mut PgConnection,
    job: JobId,
) -> PipelineRepositoryResult<HashSet<StageId>> {
    let to_refs: Vec<uuid::Uuid> = application_stage_history::table
        .filter(application_stage_history::job_id.eq(job.into_inner()))
        .select(application_stage_history::to_stage_id)
        .distinct()
        .load(connection)?;
    let from_refs: Vec<Option<uuid::Uuid>> = application_stage_history::table
        .filter(application_stage_history::job_id.eq(job.into_inner()))
        .select(application_stage_history::from_stage_id)
        .distinct()
        .load(connection)?;
    Ok(to_refs
        .into_iter()
        .chain(from_refs.into_iter().flatten())
        .map(StageId::from_uuid)
        .collect())
}

fn persisted_order_index(order_index: OrderIndex) -> PipelineRepositoryResult<i32> {
    i32::try_from(order_index.value()).map_err(PipelineRepositoryError::persistence)
}

fn job_to_new_row(job: &Job) -> NewJobRow {
    NewJobRow {
        id: job.id().into_inner(),
        company_id: job.company_id().into_inner(),
        status: job.status().as_str().to_owned(),
        created_at: job.created_at(),
        updated_at: job.updated_at(),
    }
}

fn row_to_job(row: JobRow) -> PipelineRepositoryResult<Job> {
    let status =
        JobStatus::try_from(row.status.as_str()).map_err(PipelineRepositoryError::persistence)?;
    Ok(Job::from_persisted(PersistedJobData {
        id: JobId::from_uuid(row.id),
        company_id: CompanyId::from_uuid(row.company_id),
        status,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn row_to_stage(row: StageRow) -> PipelineRepositoryResult<Stage> {
    let raw_index =
        u32::try_from(row.order_index).map_err(PipelineRepositoryError::persistence)?;
    let order_index =
        OrderIndex::new(raw_index).map_err(PipelineRepositoryError::persistence)?;
    let name = StageName::new(row.name).map_err(PipelineRepositoryError::persistence)?;
    Ok(Stage::from_persisted(PersistedStageData {
        id: StageId::from_uuid(row.id),
        job_id: JobId::from_uuid(row.job_id),
        name,
        description: row.description,
        order_index,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn application_to_new_row(application: &Application) -> NewApplicationRow {
    NewApplicationRow {
        id: application.id().into_inner(),
        job_id: application.job_id().into_inner(),
        company_id: application.company_id().into_inner(),
        first_name: application.candidate().first_name.clone(),
        last_name: application.candidate().last_name.clone(),
        email: application.candidate().email.clone(),
        current_stage_id: application.current_stage_id().map(StageId::into_inner),
        ai_score: application.evaluation().ai_score,
        overall_score: application.evaluation().overall_score,
        evaluation_details: application.evaluation().details.clone(),
        submitted_at: application.submitted_at(),
        updated_at: application.updated_at(),
    }
}

fn row_to_application(row: ApplicationRow) -> Application {
    let candidate = CandidateProfile {
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
    };
    let evaluation = EvaluationScores {
        ai_score: row.ai_score,
        overall_score: row.overall_score,
        details: row.evaluation_details,
    };
    Application::from_persisted(PersistedApplicationData {
        id: ApplicationId::from_uuid(row.id),
        job_id: JobId::from_uuid(row.job_id),
        company_id: CompanyId::from_uuid(row.company_id),
        candidate,
        current_stage_id: row.current_stage_id.map(StageId::from_uuid),
        evaluation,
        submitted_at: row.submitted_at,
        updated_at: row.updated_at,
    })
}

fn transition_to_new_row(transition: &StageTransition) -> NewTransitionRow {
    NewTransitionRow {
        id: transition.id().into_inner(),
        application_id: transition.application_id().into_inner(),
        job_id: transition.job_id().into_inner(),
        company_id: transition.company_id().into_inner(),
        from_stage_id: transition.from_stage_id().map(StageId::into_inner),
        to_stage_id: transition.to_stage_id().into_inner(),
        changed_by: transition.changed_by().into_inner(),
        notes: transition.notes().map(ToOwned::to_owned),
        created_at: transition.created_at(),
    }
}

fn row_to_transition(row: TransitionRow) -> StageTransition {
    StageTransition::from_persisted(PersistedTransitionData {
        id: TransitionId::from_uuid(row.id),
        application_id: ApplicationId::from_uuid(row.application_id),
        job_id: JobId::from_uuid(row.job_id),
        company_id: CompanyId::from_uuid(row.company_id),
        from_stage_id: row.from_stage_id.map(StageId::from_uuid),
        to_stage_id: StageId::from_uuid(row.to_stage_id),
        changed_by: UserId::from_uuid(row.changed_by),
        notes: row.notes,
        created_at: row.created_at,
    })
}
