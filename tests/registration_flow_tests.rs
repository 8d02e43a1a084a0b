//! End-to-end registration flow tests against the in-memory repository.
//!
//! Exercises the full pipeline the way the HTTP layer drives it: entity
//! lookup, window evaluation, duplicate policy, issuance, results, and
//! re-application.

mod support;

use chrono::Utc;
use erms_rust::api::{EntityKind, REGISTRATION_CODE_LEN};
use erms_rust::db::repositories::LocalRepository;
use erms_rust::db::repository::{RegistrationRepository, ResultRepository};
use erms_rust::engine::{self, DuplicateReason, EngineError};
use erms_rust::models::ExamResult;

use support::{admin, open_entity, past_entity, seed_entity, student};

#[tokio::test]
async fn test_full_registration_lifecycle() {
    let repo = LocalRepository::new();
    let entity_id = seed_entity(&repo, &open_entity(EntityKind::Exam)).await;
    let alice = student(100);

    // Issue
    let registration = engine::issue(&repo, &alice, EntityKind::Exam, entity_id)
        .await
        .unwrap();
    assert_eq!(registration.code.as_str().len(), REGISTRATION_CODE_LEN);
    assert_eq!(registration.candidate_id, alice.id);

    // Receipt before any result
    let receipt = engine::receipt(&repo, &registration.code).await.unwrap();
    assert_eq!(receipt.registration.code, registration.code);
    assert_eq!(receipt.entity.id, entity_id);
    assert!(receipt.result.is_none());

    // Cancel
    let removed = engine::cancel(&repo, &alice, &registration.code)
        .await
        .unwrap();
    assert_eq!(removed.code, registration.code);

    // The receipt is gone with the registration
    let err = engine::receipt(&repo, &registration.code).await.unwrap_err();
    assert!(matches!(err, EngineError::RegistrationNotFound(_)));
}

#[tokio::test]
async fn test_second_attempt_without_result_is_denied() {
    let repo = LocalRepository::new();
    let entity_id = seed_entity(&repo, &open_entity(EntityKind::Course)).await;
    let alice = student(100);

    engine::issue(&repo, &alice, EntityKind::Course, entity_id)
        .await
        .unwrap();

    let err = engine::issue(&repo, &alice, EntityKind::Course, entity_id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Duplicate(DuplicateReason::AlreadyApplied)
    ));
}

#[tokio::test]
async fn test_failed_result_permits_reapplication() {
    let repo = LocalRepository::new();
    let entity_id = seed_entity(&repo, &open_entity(EntityKind::Exam)).await;
    let alice = student(100);

    let first = engine::issue(&repo, &alice, EntityKind::Exam, entity_id)
        .await
        .unwrap();

    // Score below the entity's passing score of 60
    repo.store_result(&ExamResult {
        registration_code: first.code.clone(),
        score: Some(40),
        passing_score: None,
        created_at: Utc::now(),
    })
    .await
    .unwrap();

    let second = engine::issue(&repo, &alice, EntityKind::Exam, entity_id)
        .await
        .unwrap();
    assert_ne!(second.code, first.code);

    // The failed attempt is no longer live; only the fresh one counts.
    let prior = repo
        .registrations_for(alice.id, EntityKind::Exam, entity_id)
        .await
        .unwrap();
    assert_eq!(prior.len(), 1);
    assert_eq!(prior[0].registration.code, second.code);
}

#[tokio::test]
async fn test_passed_result_blocks_reapplication() {
    let repo = LocalRepository::new();
    let entity_id = seed_entity(&repo, &open_entity(EntityKind::Exam)).await;
    let alice = student(100);

    let first = engine::issue(&repo, &alice, EntityKind::Exam, entity_id)
        .await
        .unwrap();

    repo.store_result(&ExamResult {
        registration_code: first.code.clone(),
        score: Some(85),
        passing_score: None,
        created_at: Utc::now(),
    })
    .await
    .unwrap();

    let err = engine::issue(&repo, &alice, EntityKind::Exam, entity_id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Duplicate(DuplicateReason::AlreadyPassed)
    ));
}

#[tokio::test]
async fn test_sitting_passing_score_overrides_entity_default() {
    let repo = LocalRepository::new();
    // Entity default is 60, but this sitting required 90.
    let entity_id = seed_entity(&repo, &open_entity(EntityKind::Exam)).await;
    let alice = student(100);

    let first = engine::issue(&repo, &alice, EntityKind::Exam, entity_id)
        .await
        .unwrap();

    repo.store_result(&ExamResult {
        registration_code: first.code.clone(),
        score: Some(70),
        passing_score: Some(90),
        created_at: Utc::now(),
    })
    .await
    .unwrap();

    // 70 clears the entity default but not the sitting's bar, so the
    // attempt counts as failed and re-application is allowed.
    assert!(engine::issue(&repo, &alice, EntityKind::Exam, entity_id)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_closed_window_denies_even_with_clean_history() {
    let repo = LocalRepository::new();
    let entity_id = seed_entity(&repo, &past_entity(EntityKind::Program)).await;
    let alice = student(100);

    let err = engine::issue(&repo, &alice, EntityKind::Program, entity_id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::WindowNotOpen { .. }));
    assert!(err.is_denial());
}

#[tokio::test]
async fn test_kinds_are_independent_histories() {
    let repo = LocalRepository::new();
    let course_id = seed_entity(&repo, &open_entity(EntityKind::Course)).await;
    let exam_id = seed_entity(&repo, &open_entity(EntityKind::Exam)).await;
    let alice = student(100);

    // Registering for a course does not block the exam, even if ids collide.
    engine::issue(&repo, &alice, EntityKind::Course, course_id)
        .await
        .unwrap();
    engine::issue(&repo, &alice, EntityKind::Exam, exam_id)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_admin_can_cancel_on_behalf() {
    let repo = LocalRepository::new();
    let entity_id = seed_entity(&repo, &open_entity(EntityKind::Course)).await;
    let alice = student(100);

    let registration = engine::issue(&repo, &alice, EntityKind::Course, entity_id)
        .await
        .unwrap();

    let removed = engine::cancel(&repo, &admin(999), &registration.code)
        .await
        .unwrap();
    assert_eq!(removed.candidate_id, alice.id);
}

#[tokio::test]
async fn test_cancel_then_reapply_is_allowed() {
    let repo = LocalRepository::new();
    let entity_id = seed_entity(&repo, &open_entity(EntityKind::Exam)).await;
    let alice = student(100);

    let first = engine::issue(&repo, &alice, EntityKind::Exam, entity_id)
        .await
        .unwrap();
    engine::cancel(&repo, &alice, &first.code).await.unwrap();

    // Cancellation removes the row entirely, so history is clean again.
    assert!(engine::issue(&repo, &alice, EntityKind::Exam, entity_id)
        .await
        .is_ok());
}
