//! End-to-end tag flow: catalog authoring and badge annotations.

use super::helpers::{TestBed, seed_application, seed_job, testbed};
use rstest::rstest;
use talentflow::tagging::domain::AppliedTag;
use talentflow::tagging::services::{AnnotationError, CatalogError, CreateTagRequest};
use talentflow::tenant::{CompanyId, TenantContext, UserId};

/// Asserts exactly one badge with the expected label is attached.
///
/// # Errors
///
/// Returns an error if the badge set does not contain exactly one badge
/// carrying `expected`.
fn assert_single_badge(applied: &[AppliedTag], expected: &str) -> Result<(), eyre::Report> {
    eyre::ensure!(
        applied.len() == 1,
        "expected exactly one badge, found {}",
        applied.len()
    );
    let badge = applied
        .first()
        .ok_or_else(|| eyre::eyre!("expected at least one badge"))?;
    eyre::ensure!(badge.label.as_str() == expected, "badge label mismatch");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn finalist_badge_flows_from_catalog_to_application(testbed: TestBed) {
    let (job, _) = seed_job(&testbed, &testbed.ctx).await;
    let application = seed_application(&testbed, &testbed.ctx, job).await;
    let tag = testbed
        .catalog
        .create_tag(&testbed.ctx, CreateTagRequest::new("Finalista"))
        .await
        .expect("tag creation should succeed");

    testbed
        .annotations
        .add_tag(&testbed.ctx, application.id(), tag.id())
        .await
        .expect("attach should succeed");

    let applied = testbed
        .annotations
        .list_tags(&testbed.ctx, application.id())
        .await
        .expect("listing should succeed");
    assert_single_badge(&applied, "Finalista").expect("single Finalista badge");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_tag_never_crosses_company_boundaries(testbed: TestBed) {
    // Company C1 owns the tag; company C2 owns the application.
    let c1 = testbed.ctx;
    let c2 = TenantContext::new(CompanyId::new(), UserId::new());
    let tag = testbed
        .catalog
        .create_tag(&c1, CreateTagRequest::new("Finalista"))
        .await
        .expect("tag creation should succeed");
    let (c1_job, _) = seed_job(&testbed, &c1).await;
    let c1_application = seed_application(&testbed, &c1, c1_job).await;
    let (c2_job, _) = seed_job(&testbed, &c2).await;
    let c2_application = seed_application(&testbed, &c2, c2_job).await;

    let same_company = testbed
        .annotations
        .add_tag(&c1, c1_application.id(), tag.id())
        .await;
    assert!(same_company.is_ok());

    let foreign_tag = testbed
        .annotations
        .add_tag(&c2, c2_application.id(), tag.id())
        .await;
    assert!(matches!(
        foreign_tag,
        Err(AnnotationError::InvalidTag(id)) if id == tag.id()
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_labels_are_rejected_per_company_only(testbed: TestBed) {
    testbed
        .catalog
        .create_tag(&testbed.ctx, CreateTagRequest::new("Urgente"))
        .await
        .expect("creation should succeed");

    let duplicate = testbed
        .catalog
        .create_tag(&testbed.ctx, CreateTagRequest::new("Urgente"))
        .await;
    assert!(matches!(
        duplicate,
        Err(CatalogError::DuplicateLabel { .. })
    ));

    let other_company = TenantContext::new(CompanyId::new(), UserId::new());
    let elsewhere = testbed
        .catalog
        .create_tag(&other_company, CreateTagRequest::new("Urgente"))
        .await;
    assert!(elsewhere.is_ok());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn removing_a_never_attached_tag_changes_nothing(testbed: TestBed) {
    let (job, _) = seed_job(&testbed, &testbed.ctx).await;
    let application = seed_application(&testbed, &testbed.ctx, job).await;
    let tag = testbed
        .catalog
        .create_tag(&testbed.ctx, CreateTagRequest::new("Finalista"))
        .await
        .expect("tag creation should succeed");

    testbed
        .annotations
        .remove_tag(&testbed.ctx, application.id(), tag.id())
        .await
        .expect("silent no-op expected");

    let applied = testbed
        .annotations
        .list_tags(&testbed.ctx, application.id())
        .await
        .expect("listing should succeed");
    assert!(applied.is_empty());
}
