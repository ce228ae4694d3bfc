//! Concurrency behaviour across parallel recruiter actions.

use super::helpers::{TestBed, seed_application, seed_job, stage_named, testbed};
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;
use talentflow::pipeline::services::{
    MoveApplicationRequest, StageTransitionService, TransitionError,
};
use talentflow::tagging::services::{CreateTagRequest, TagAnnotationService};

/// Runs one move on a spawned task so both moves race on the runtime.
///
/// Each task gets its own service instance over the shared store, like
/// independent request handlers would.
fn spawn_move(
    bed: &TestBed,
    request: MoveApplicationRequest,
) -> tokio::task::JoinHandle<Result<bool, TransitionError>> {
    let transitions =
        StageTransitionService::new(Arc::clone(&bed.pipeline), Arc::new(DefaultClock));
    let ctx = bed.ctx;
    tokio::spawn(async move {
        transitions
            .move_application(&ctx, request)
            .await
            .map(|outcome| outcome.changed())
    })
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn racing_recruiters_cannot_fork_an_application(testbed: TestBed) {
    let (job, stages) = seed_job(&testbed, &testbed.ctx).await;
    let application = seed_application(&testbed, &testbed.ctx, job).await;
    let triagem = stage_named(&stages, "Triagem");
    let entrevista = stage_named(&stages, "Entrevista");
    let contratacao = stage_named(&stages, "Contratação");
    testbed
        .transitions
        .move_application(
            &testbed.ctx,
            MoveApplicationRequest::new(job, application.id(), triagem),
        )
        .await
        .expect("placement should succeed");

    let left = spawn_move(
        &testbed,
        MoveApplicationRequest::new(job, application.id(), entrevista),
    );
    let right = spawn_move(
        &testbed,
        MoveApplicationRequest::new(job, application.id(), contratacao),
    );
    let (left, right) = tokio::join!(left, right);
    let outcomes = [
        left.expect("task should not panic"),
        right.expect("task should not panic"),
    ];

    let successes = outcomes.iter().filter(|result| result.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter(|result| matches!(result, Err(TransitionError::Conflict(_))))
        .count();
    assert!(successes >= 1, "at least one move must win");
    assert_eq!(
        successes + conflicts,
        2,
        "every racer either wins or observes a conflict"
    );

    let report = testbed
        .transitions
        .audit_replay(&testbed.ctx, job, application.id())
        .await
        .expect("replay should run");
    assert!(report.is_consistent());

    let history = testbed
        .transitions
        .stage_history(&testbed.ctx, job, application.id())
        .await
        .expect("history should load");
    assert_eq!(history.len(), 1 + successes);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn parallel_duplicate_attaches_collapse_to_one_association(testbed: TestBed) {
    let (job, _) = seed_job(&testbed, &testbed.ctx).await;
    let application = seed_application(&testbed, &testbed.ctx, job).await;
    let tag = testbed
        .catalog
        .create_tag(&testbed.ctx, CreateTagRequest::new("Finalista"))
        .await
        .expect("tag creation should succeed");

    let mut handles = Vec::new();
    for _ in 0..4 {
        let annotations = TagAnnotationService::new(
            Arc::clone(&testbed.tags),
            Arc::clone(&testbed.pipeline),
            Arc::new(DefaultClock),
        );
        let ctx = testbed.ctx;
        let application_id = application.id();
        let tag_id = tag.id();
        handles.push(tokio::spawn(async move {
            annotations.add_tag(&ctx, application_id, tag_id).await
        }));
    }
    for handle in handles {
        handle
            .await
            .expect("task should not panic")
            .expect("every duplicate attach should succeed");
    }

    let applied = testbed
        .annotations
        .list_tags(&testbed.ctx, application.id())
        .await
        .expect("listing should succeed");
    assert_eq!(applied.len(), 1);
}
