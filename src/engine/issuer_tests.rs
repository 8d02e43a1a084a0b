use chrono::{Duration, Utc};

use super::{generate_code, issue};
use crate::api::{CandidateId, EntityId, EntityKind, OrganizationId, WindowState};
use crate::db::repositories::LocalRepository;
use crate::db::repository::{RegistrationRepository, ResultRepository};
use crate::engine::error::{DuplicateReason, EngineError};
use crate::models::{Caller, ExamResult, SchedulableEntity};

fn open_entity(kind: EntityKind, id: i64) -> SchedulableEntity {
    let now = Utc::now();
    SchedulableEntity {
        id: EntityId::new(id),
        kind,
        organization_id: OrganizationId::new(1),
        name: format!("{} {}", kind, id),
        registration_opens_at: Some(now - Duration::days(1)),
        registration_closes_at: Some(now + Duration::days(1)),
        activity_starts_at: None,
        activity_ends_at: None,
        passing_score: Some(50),
        is_active: true,
        created_at: now,
    }
}

async fn seeded_repo(entity: &SchedulableEntity) -> LocalRepository {
    let repo = LocalRepository::new();
    crate::db::repository::EntityRepository::store_entity(&repo, entity)
        .await
        .unwrap();
    repo
}

fn student() -> Caller {
    Caller::student(CandidateId::new(100), OrganizationId::new(1))
}

#[tokio::test]
async fn test_issue_success_allocates_ten_char_code() {
    let entity = open_entity(EntityKind::Exam, 1);
    let repo = seeded_repo(&entity).await;

    let registration = issue(&repo, &student(), EntityKind::Exam, entity.id)
        .await
        .unwrap();

    assert_eq!(registration.code.as_str().len(), 10);
    assert!(registration
        .code
        .as_str()
        .chars()
        .all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(registration.candidate_id, CandidateId::new(100));
    assert!(registration.is_live());
}

#[tokio::test]
async fn test_second_issue_is_already_applied() {
    let entity = open_entity(EntityKind::Course, 2);
    let repo = seeded_repo(&entity).await;
    let caller = student();

    issue(&repo, &caller, EntityKind::Course, entity.id)
        .await
        .unwrap();
    let denied = issue(&repo, &caller, EntityKind::Course, entity.id)
        .await
        .unwrap_err();

    assert!(matches!(
        denied,
        EngineError::Duplicate(DuplicateReason::AlreadyApplied)
    ));
}

#[tokio::test]
async fn test_window_not_open_denials_are_distinct() {
    let now = Utc::now();

    let mut early = open_entity(EntityKind::Exam, 3);
    early.registration_opens_at = Some(now + Duration::days(1));
    early.registration_closes_at = Some(now + Duration::days(2));
    let repo = seeded_repo(&early).await;
    let err = issue(&repo, &student(), EntityKind::Exam, early.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::WindowNotOpen {
            state: WindowState::NotYetOpen
        }
    ));

    let mut late = open_entity(EntityKind::Exam, 4);
    late.registration_opens_at = Some(now - Duration::days(2));
    late.registration_closes_at = Some(now - Duration::days(1));
    let repo = seeded_repo(&late).await;
    let err = issue(&repo, &student(), EntityKind::Exam, late.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::WindowNotOpen {
            state: WindowState::Closed
        }
    ));
}

#[tokio::test]
async fn test_inactive_or_foreign_entity_reads_not_found() {
    let mut inactive = open_entity(EntityKind::Program, 5);
    inactive.is_active = false;
    let repo = seeded_repo(&inactive).await;
    assert!(matches!(
        issue(&repo, &student(), EntityKind::Program, inactive.id)
            .await
            .unwrap_err(),
        EngineError::EntityNotFound { .. }
    ));

    let mut foreign = open_entity(EntityKind::Program, 6);
    foreign.organization_id = OrganizationId::new(9);
    let repo = seeded_repo(&foreign).await;
    assert!(matches!(
        issue(&repo, &student(), EntityKind::Program, foreign.id)
            .await
            .unwrap_err(),
        EngineError::EntityNotFound { .. }
    ));

    let repo = LocalRepository::new();
    assert!(matches!(
        issue(&repo, &student(), EntityKind::Program, EntityId::new(77))
            .await
            .unwrap_err(),
        EngineError::EntityNotFound { .. }
    ));
}

#[tokio::test]
async fn test_reissue_after_failure_supersedes_prior() {
    let entity = open_entity(EntityKind::Exam, 7);
    let repo = seeded_repo(&entity).await;
    let caller = student();

    let first = issue(&repo, &caller, EntityKind::Exam, entity.id)
        .await
        .unwrap();
    repo.store_result(&ExamResult {
        registration_code: first.code.clone(),
        score: Some(40),
        passing_score: Some(50),
        created_at: Utc::now(),
    })
    .await
    .unwrap();

    let second = issue(&repo, &caller, EntityKind::Exam, entity.id)
        .await
        .unwrap();
    assert_ne!(second.code, first.code);

    let old = repo.find_registration(&first.code).await.unwrap().unwrap();
    assert!(old.superseded);
    let fresh = repo.find_registration(&second.code).await.unwrap().unwrap();
    assert!(fresh.is_live());
}

#[tokio::test]
async fn test_no_reissue_after_pass() {
    let entity = open_entity(EntityKind::Exam, 8);
    let repo = seeded_repo(&entity).await;
    let caller = student();

    let first = issue(&repo, &caller, EntityKind::Exam, entity.id)
        .await
        .unwrap();
    repo.store_result(&ExamResult {
        registration_code: first.code.clone(),
        score: Some(60),
        passing_score: Some(50),
        created_at: Utc::now(),
    })
    .await
    .unwrap();

    let denied = issue(&repo, &caller, EntityKind::Exam, entity.id)
        .await
        .unwrap_err();
    assert!(matches!(
        denied,
        EngineError::Duplicate(DuplicateReason::AlreadyPassed)
    ));
}

#[test]
fn test_generated_codes_are_well_formed() {
    for _ in 0..100 {
        let code = generate_code();
        assert_eq!(code.as_str().len(), 10);
        assert!(code.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
