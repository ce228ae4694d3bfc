//! In-memory repository for pipeline tests and embedded use.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::pipeline::{
    domain::{
        Application, ApplicationId, Job, JobId, PersistedApplicationData, PersistedStageData,
        Stage, StageDraft, StageId, StagePlan, StageTransition,
    },
    ports::{
        ApplicationRepository, PipelineRepositoryError, PipelineRepositoryResult, StageRepository,
    },
};
use crate::tenant::CompanyId;

/// Thread-safe in-memory pipeline repository.
///
/// Implements both [`StageRepository`] and [`ApplicationRepository`] over
/// one shared state so that the rewrite guard and the transition
/// compare-and-swap observe the same applications a database would.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPipelineRepository {
    state: Arc<RwLock<InMemoryPipelineState>>,
}

#[derive(Debug, Default)]
struct InMemoryPipelineState {
    jobs: HashMap<JobId, Job>,
    stages: HashMap<StageId, Stage>,
    applications: HashMap<ApplicationId, Application>,
    ledger: Vec<StageTransition>,
}

impl InMemoryPipelineRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned<T>(err: std::sync::PoisonError<T>) -> PipelineRepositoryError {
    PipelineRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

/// Stage identifiers currently holding an application of `job`.
fn current_stage_references(state: &InMemoryPipelineState, job: JobId) -> HashSet<StageId> {
    state
        .applications
        .values()
        .filter(|application| application.job_id() == job)
        .filter_map(Application::current_stage_id)
        .collect()
}

/// Stage identifiers appearing anywhere in the ledger of `job`.
fn ledger_stage_references(state: &InMemoryPipelineState, job: JobId) -> HashSet<StageId> {
    let mut referenced = HashSet::new();
    for transition in state.ledger.iter().filter(|row| row.job_id() == job) {
        if let Some(from) = transition.from_stage_id() {
            referenced.insert(from);
        }
        referenced.insert(transition.to_stage_id());
    }
    referenced
}

/// Rebuilds a stored stage with a draft's fields applied.
fn stage_with_draft(existing: &Stage, draft: &StageDraft, now: DateTime<Utc>) -> Stage {
    Stage::from_persisted(PersistedStageData {
        id: existing.id(),
        job_id: existing.job_id(),
        name: draft.name.clone(),
        description: draft.description.clone(),
        order_index: draft.order_index,
        is_active: draft.is_active,
        created_at: existing.created_at(),
        updated_at: now,
    })
}

/// Rebuilds a stored stage as inactive.
fn stage_deactivated(existing: &Stage, now: DateTime<Utc>) -> Stage {
    Stage::from_persisted(PersistedStageData {
        id: existing.id(),
        job_id: existing.job_id(),
        name: existing.name().clone(),
        description: existing.description().map(ToOwned::to_owned),
        order_index: existing.order_index(),
        is_active: false,
        created_at: existing.created_at(),
        updated_at: now,
    })
}

#[async_trait]
impl StageRepository for InMemoryPipelineRepository {
    async fn create_job(&self, job: &Job) -> PipelineRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        if state.jobs.contains_key(&job.id()) {
            return Err(PipelineRepositoryError::JobExists(job.id()));
        }
        state.jobs.insert(job.id(), job.clone());
        Ok(())
    }

    async fn find_job(
        &self,
        company: CompanyId,
        job: JobId,
    ) -> PipelineRepositoryResult<Option<Job>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .jobs
            .get(&job)
            .filter(|stored| stored.company_id() == company)
            .cloned())
    }

    async fn find_stage(
        &self,
        job: JobId,
        stage: StageId,
    ) -> PipelineRepositoryResult<Option<Stage>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .stages
            .get(&stage)
            .filter(|stored| stored.job_id() == job)
            .cloned())
    }

    async fn list_stages(&self, job: JobId) -> PipelineRepositoryResult<Vec<Stage>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        let mut stages: Vec<Stage> = state
            .stages
            .values()
            .filter(|stage| stage.job_id() == job)
            .cloned()
            .collect();
        stages.sort_by_key(Stage::order_index);
        Ok(stages)
    }

    async fn rewrite_stages(
        &self,
        job: JobId,
        plan: &StagePlan,
        now: DateTime<Utc>,
    ) -> PipelineRepositoryResult<Vec<Stage>> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        if !state.jobs.contains_key(&job) {
            return Err(PipelineRepositoryError::UnknownJob(job));
        }

        let existing: HashMap<StageId, Stage> = state
            .stages
            .values()
            .filter(|stage| stage.job_id() == job)
            .map(|stage| (stage.id(), stage.clone()))
            .collect();

        for entry in plan.entries() {
            if let Some(id) = entry.id
                && !existing.contains_key(&id)
            {
                return Err(PipelineRepositoryError::UnknownStage(id));
            }
        }

        let retained = plan.retained_stage_ids();
        let held = current_stage_references(&state, job);
        if let Some(in_use) = existing
            .keys()
            .copied()
            .find(|id| !retained.contains(id) && held.contains(id))
        {
            return Err(PipelineRepositoryError::StageInUse(in_use));
        }

        let in_ledger = ledger_stage_references(&state, job);
        for (id, stage) in &existing {
            if retained.contains(id) {
                continue;
            }
            if in_ledger.contains(id) {
                state.stages.insert(*id, stage_deactivated(stage, now));
            } else {
                state.stages.remove(id);
            }
        }

        let mut written = Vec::with_capacity(plan.entries().len());
        for entry in plan.entries() {
            let stage = entry.id.and_then(|id| existing.get(&id)).map_or_else(
                || {
                    Stage::from_persisted(PersistedStageData {
                        id: StageId::new(),
                        job_id: job,
                        name: entry.name.clone(),
                        description: entry.description.clone(),
                        order_index: entry.order_index,
                        is_active: entry.is_active,
                        created_at: now,
                        updated_at: now,
                    })
                },
                |stored| stage_with_draft(stored, entry, now),
            );
            state.stages.insert(stage.id(), stage.clone());
            written.push(stage);
        }
        written.sort_by_key(Stage::order_index);
        Ok(written)
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryPipelineRepository {
    async fn create_application(
        &self,
        application: &Application,
    ) -> PipelineRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        if state.applications.contains_key(&application.id()) {
            return Err(PipelineRepositoryError::ApplicationExists(application.id()));
        }
        if !state.jobs.contains_key(&application.job_id()) {
            return Err(PipelineRepositoryError::UnknownJob(application.job_id()));
        }
        state
            .applications
            .insert(application.id(), application.clone());
        Ok(())
    }

    async fn find_in_job(
        &self,
        company: CompanyId,
        job: JobId,
        application: ApplicationId,
    ) -> PipelineRepositoryResult<Option<Application>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .applications
            .get(&application)
            .filter(|stored| stored.company_id() == company && stored.job_id() == job)
            .cloned())
    }

    async fn find_in_company(
        &self,
        company: CompanyId,
        application: ApplicationId,
    ) -> PipelineRepositoryResult<Option<Application>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .applications
            .get(&application)
            .filter(|stored| stored.company_id() == company)
            .cloned())
    }

    async fn record_evaluation(
        &self,
        application: &Application,
    ) -> PipelineRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        let stored = state
            .applications
            .get(&application.id())
            .ok_or(PipelineRepositoryError::UnknownApplication(application.id()))?;
        let updated = Application::from_persisted(PersistedApplicationData {
            id: stored.id(),
            job_id: stored.job_id(),
            company_id: stored.company_id(),
            candidate: stored.candidate().clone(),
            current_stage_id: stored.current_stage_id(),
            evaluation: application.evaluation().clone(),
            submitted_at: stored.submitted_at(),
            updated_at: application.updated_at(),
        });
        state.applications.insert(updated.id(), updated);
        Ok(())
    }

    async fn commit_transition(
        &self,
        transition: &StageTransition,
        expected_from: Option<StageId>,
        now: DateTime<Utc>,
    ) -> PipelineRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        let stored = state
            .applications
            .get(&transition.application_id())
            .ok_or(PipelineRepositoryError::UnknownApplication(
                transition.application_id(),
            ))?;
        if stored.current_stage_id() != expected_from {
            return Err(PipelineRepositoryError::StaleStage(
                transition.application_id(),
            ));
        }
        let mut moved = stored.clone();
        moved.advance_to(transition.to_stage_id(), now);
        state.applications.insert(moved.id(), moved);
        state.ledger.push(transition.clone());
        Ok(())
    }

    async fn history(
        &self,
        company: CompanyId,
        job: JobId,
        application: ApplicationId,
    ) -> PipelineRepositoryResult<Vec<StageTransition>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .ledger
            .iter()
            .filter(|row| {
                row.company_id() == company
                    && row.job_id() == job
                    && row.application_id() == application
            })
            .cloned()
            .collect())
    }

    async fn list_by_stage(
        &self,
        company: CompanyId,
        job: JobId,
        stage: StageId,
    ) -> PipelineRepositoryResult<Vec<Application>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .applications
            .values()
            .filter(|application| {
                application.company_id() == company
                    && application.job_id() == job
                    && application.current_stage_id() == Some(stage)
            })
            .cloned()
            .collect())
    }
}
