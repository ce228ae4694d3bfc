//! End-to-end board flow: placement, moves, no-op retries, and columns.

use super::helpers::{TestBed, seed_application, seed_job, stage_named, testbed};
use mockable::DefaultClock;
use rstest::rstest;
use talentflow::pipeline::{
    domain::{BoardSort, EvaluationScores, replay_current_stage},
    ports::ApplicationRepository,
    services::{MoveApplicationRequest, TransitionError},
};
use talentflow::tenant::{CompanyId, TenantContext, UserId};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn candidate_walks_the_default_pipeline(testbed: TestBed) {
    let (job, stages) = seed_job(&testbed, &testbed.ctx).await;
    let application = seed_application(&testbed, &testbed.ctx, job).await;
    let triagem = stage_named(&stages, "Triagem");
    let entrevista = stage_named(&stages, "Entrevista");

    let placed = testbed
        .transitions
        .move_application(
            &testbed.ctx,
            MoveApplicationRequest::new(job, application.id(), triagem),
        )
        .await
        .expect("placement should succeed");
    assert_eq!(placed.application().current_stage_id(), Some(triagem));

    let interviewed = testbed
        .transitions
        .move_application(
            &testbed.ctx,
            MoveApplicationRequest::new(job, application.id(), entrevista),
        )
        .await
        .expect("move should succeed");
    assert_eq!(interviewed.application().current_stage_id(), Some(entrevista));

    // A retried drop onto the same column must not grow the ledger.
    let retried = testbed
        .transitions
        .move_application(
            &testbed.ctx,
            MoveApplicationRequest::new(job, application.id(), entrevista),
        )
        .await
        .expect("redundant move should succeed");
    assert!(!retried.changed());

    let history = testbed
        .transitions
        .stage_history(&testbed.ctx, job, application.id())
        .await
        .expect("history should load");
    assert_eq!(history.len(), 2);
    assert_eq!(
        history
            .iter()
            .map(|row| (row.from_stage_id(), row.to_stage_id()))
            .collect::<Vec<_>>(),
        [(None, triagem), (Some(triagem), entrevista)]
    );
    assert_eq!(
        replay_current_stage(&history),
        Ok(Some(entrevista)),
        "folding the ledger must reproduce the live pointer"
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn board_columns_follow_the_caller_supplied_sort(testbed: TestBed) {
    let clock = DefaultClock;
    let (job, stages) = seed_job(&testbed, &testbed.ctx).await;
    let triagem = stage_named(&stages, "Triagem");

    let mut scored = Vec::new();
    for score in [Some(55.0), Some(91.0), None] {
        let mut application = seed_application(&testbed, &testbed.ctx, job).await;
        application.record_evaluation(
            EvaluationScores {
                ai_score: None,
                overall_score: score,
                details: None,
            },
            &clock,
        );
        testbed
            .pipeline
            .record_evaluation(&application)
            .await
            .expect("evaluation should persist");
        testbed
            .transitions
            .move_application(
                &testbed.ctx,
                MoveApplicationRequest::new(job, application.id(), triagem),
            )
            .await
            .expect("placement should succeed");
        scored.push(application.id());
    }

    let column = testbed
        .transitions
        .board_column(&testbed.ctx, job, triagem, BoardSort::OverallScoreDesc)
        .await
        .expect("column should load");

    let scores: Vec<Option<f64>> = column
        .iter()
        .map(|application| application.evaluation().overall_score)
        .collect();
    assert_eq!(scores, [Some(91.0), Some(55.0), None]);
    assert_eq!(column.len(), scored.len());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn no_operation_leaks_across_tenants(testbed: TestBed) {
    let (job, stages) = seed_job(&testbed, &testbed.ctx).await;
    let application = seed_application(&testbed, &testbed.ctx, job).await;
    let triagem = stage_named(&stages, "Triagem");
    testbed
        .transitions
        .move_application(
            &testbed.ctx,
            MoveApplicationRequest::new(job, application.id(), triagem),
        )
        .await
        .expect("placement should succeed");

    let intruder = TenantContext::new(CompanyId::new(), UserId::new());
    let moved = testbed
        .transitions
        .move_application(
            &intruder,
            MoveApplicationRequest::new(job, application.id(), triagem),
        )
        .await;
    let history = testbed
        .transitions
        .stage_history(&intruder, job, application.id())
        .await;
    let column = testbed
        .transitions
        .board_column(&intruder, job, triagem, BoardSort::SubmittedAtDesc)
        .await;

    assert!(matches!(
        moved,
        Err(TransitionError::ApplicationNotFound(_))
    ));
    assert!(matches!(
        history,
        Err(TransitionError::ApplicationNotFound(_))
    ));
    assert!(matches!(column, Err(TransitionError::JobNotFound(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn evaluation_scores_round_trip_through_the_store(testbed: TestBed) {
    let clock = DefaultClock;
    let (job, _) = seed_job(&testbed, &testbed.ctx).await;
    let mut application = seed_application(&testbed, &testbed.ctx, job).await;

    application.record_evaluation(
        EvaluationScores {
            ai_score: Some(72.0),
            overall_score: Some(80.5),
            details: Some(serde_json::json!({"experience_score": 90})),
        },
        &clock,
    );
    testbed
        .pipeline
        .record_evaluation(&application)
        .await
        .expect("evaluation should persist");

    let stored = testbed
        .pipeline
        .find_in_company(testbed.ctx.company_id(), application.id())
        .await
        .expect("lookup should succeed")
        .expect("application should exist");
    assert_eq!(stored.evaluation(), application.evaluation());
    assert_eq!(stored.updated_at(), application.updated_at());
}
