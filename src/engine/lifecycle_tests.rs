use chrono::{Duration, Utc};

use super::cancel;
use crate::api::{CandidateId, EntityId, EntityKind, OrganizationId, RegistrationCode};
use crate::db::repositories::LocalRepository;
use crate::db::repository::{DirectoryRepository, EntityRepository, RegistrationRepository};
use crate::engine::error::EngineError;
use crate::engine::issuer::issue;
use crate::models::{Caller, Registration, SchedulableEntity};

fn open_entity(id: i64) -> SchedulableEntity {
    let now = Utc::now();
    SchedulableEntity {
        id: EntityId::new(id),
        kind: EntityKind::Course,
        organization_id: OrganizationId::new(1),
        name: "Geometry".to_string(),
        registration_opens_at: Some(now - Duration::days(1)),
        registration_closes_at: Some(now + Duration::days(1)),
        activity_starts_at: None,
        activity_ends_at: None,
        passing_score: None,
        is_active: true,
        created_at: now,
    }
}

async fn registered(repo: &LocalRepository, candidate: i64) -> Registration {
    let caller = Caller::student(CandidateId::new(candidate), OrganizationId::new(1));
    issue(repo, &caller, EntityKind::Course, EntityId::new(1))
        .await
        .unwrap()
}

async fn fixture() -> (LocalRepository, Registration) {
    let repo = LocalRepository::new();
    repo.store_entity(&open_entity(1)).await.unwrap();
    let registration = registered(&repo, 100).await;
    (repo, registration)
}

#[tokio::test]
async fn test_owner_can_cancel() {
    let (repo, registration) = fixture().await;
    let owner = Caller::student(CandidateId::new(100), OrganizationId::new(1));

    let cancelled = cancel(&repo, &owner, &registration.code).await.unwrap();
    assert_eq!(cancelled.code, registration.code);
    assert!(repo
        .find_registration(&registration.code)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_stranger_cannot_cancel_and_row_survives() {
    let (repo, registration) = fixture().await;
    let stranger = Caller::student(CandidateId::new(200), OrganizationId::new(1));

    let err = cancel(&repo, &stranger, &registration.code)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized));
    assert!(repo
        .find_registration(&registration.code)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_unassigned_teacher_cannot_cancel() {
    let (repo, registration) = fixture().await;
    let teacher = Caller::teacher(CandidateId::new(300), OrganizationId::new(1));

    let err = cancel(&repo, &teacher, &registration.code)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized));
}

#[tokio::test]
async fn test_assigned_teacher_can_cancel() {
    let (repo, registration) = fixture().await;
    repo.assign_teacher(CandidateId::new(300), CandidateId::new(100))
        .await
        .unwrap();
    let teacher = Caller::teacher(CandidateId::new(300), OrganizationId::new(1));

    assert!(cancel(&repo, &teacher, &registration.code).await.is_ok());
}

#[tokio::test]
async fn test_assigned_teacher_cannot_cancel_program_registration() {
    let (repo, _) = fixture().await;
    repo.store_entity(&SchedulableEntity {
        id: EntityId::new(2),
        kind: EntityKind::Program,
        name: "Evening Diploma".to_string(),
        ..open_entity(2)
    })
    .await
    .unwrap();
    let owner = Caller::student(CandidateId::new(100), OrganizationId::new(1));
    let registration = issue(&repo, &owner, EntityKind::Program, EntityId::new(2))
        .await
        .unwrap();

    repo.assign_teacher(CandidateId::new(300), CandidateId::new(100))
        .await
        .unwrap();
    let teacher = Caller::teacher(CandidateId::new(300), OrganizationId::new(1));

    let err = cancel(&repo, &teacher, &registration.code)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized));
    assert!(repo
        .find_registration(&registration.code)
        .await
        .unwrap()
        .is_some());

    // The owner's own grant is untouched.
    assert!(cancel(&repo, &owner, &registration.code).await.is_ok());
}

#[tokio::test]
async fn test_admin_can_cancel() {
    let (repo, registration) = fixture().await;
    let admin = Caller::teacher(CandidateId::new(999), OrganizationId::new(1)).with_admin();

    assert!(cancel(&repo, &admin, &registration.code).await.is_ok());
}

#[tokio::test]
async fn test_cross_organization_owner_id_is_rejected() {
    let (repo, registration) = fixture().await;
    // Same numeric id, different organization: not the owner.
    let impostor = Caller::student(CandidateId::new(100), OrganizationId::new(2));

    let err = cancel(&repo, &impostor, &registration.code)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized));
}

#[tokio::test]
async fn test_missing_registration_is_not_found() {
    let (repo, _) = fixture().await;
    let owner = Caller::student(CandidateId::new(100), OrganizationId::new(1));

    let err = cancel(&repo, &owner, &RegistrationCode::new("NOPE000000"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::RegistrationNotFound(_)));
}
