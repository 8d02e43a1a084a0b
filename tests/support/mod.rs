//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use erms_rust::api::{CandidateId, EntityId, EntityKind, OrganizationId};
use erms_rust::db::repository::{EntityRepository, FullRepository};
use erms_rust::models::{Caller, SchedulableEntity};

pub const ORG: i64 = 1;
pub const OTHER_ORG: i64 = 2;

/// Entity whose registration window is currently open.
pub fn open_entity(kind: EntityKind) -> SchedulableEntity {
    let now = Utc::now();
    SchedulableEntity {
        id: EntityId::new(0),
        kind,
        organization_id: OrganizationId::new(ORG),
        name: format!("{} fixture", kind),
        registration_opens_at: Some(now - Duration::hours(1)),
        registration_closes_at: Some(now + Duration::hours(1)),
        activity_starts_at: Some(now + Duration::days(7)),
        activity_ends_at: Some(now + Duration::days(8)),
        passing_score: Some(60),
        is_active: true,
        created_at: now,
    }
}

/// Entity whose registration window has not yet opened.
pub fn future_entity(kind: EntityKind) -> SchedulableEntity {
    let now = Utc::now();
    SchedulableEntity {
        registration_opens_at: Some(now + Duration::hours(1)),
        registration_closes_at: Some(now + Duration::hours(2)),
        ..open_entity(kind)
    }
}

/// Entity whose registration window has already closed.
pub fn past_entity(kind: EntityKind) -> SchedulableEntity {
    let now = Utc::now();
    SchedulableEntity {
        registration_opens_at: Some(now - Duration::hours(2)),
        registration_closes_at: Some(now - Duration::hours(1)),
        ..open_entity(kind)
    }
}

/// Store an entity and return the allocated id.
pub async fn seed_entity(repo: &dyn FullRepository, entity: &SchedulableEntity) -> EntityId {
    repo.store_entity(entity).await.unwrap()
}

pub fn student(id: i64) -> Caller {
    Caller::student(CandidateId::new(id), OrganizationId::new(ORG))
}

pub fn teacher(id: i64) -> Caller {
    Caller::teacher(CandidateId::new(id), OrganizationId::new(ORG))
}

pub fn admin(id: i64) -> Caller {
    student(id).with_admin()
}
