use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{entities, exam_results, registrations, teacher_assignments};
use crate::api::{CandidateId, EntityId, EntityKind, OrganizationId, RegistrationCode};
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::models::{ExamResult, Registration, SchedulableEntity};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = entities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EntityRow {
    pub entity_id: i64,
    pub kind: String,
    pub organization_id: i64,
    pub name: String,
    pub registration_opens_at: Option<DateTime<Utc>>,
    pub registration_closes_at: Option<DateTime<Utc>>,
    pub activity_starts_at: Option<DateTime<Utc>>,
    pub activity_ends_at: Option<DateTime<Utc>>,
    pub passing_score: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = entities)]
pub struct NewEntityRow {
    pub kind: String,
    pub organization_id: i64,
    pub name: String,
    pub registration_opens_at: Option<DateTime<Utc>>,
    pub registration_closes_at: Option<DateTime<Utc>>,
    pub activity_starts_at: Option<DateTime<Utc>>,
    pub activity_ends_at: Option<DateTime<Utc>>,
    pub passing_score: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl EntityRow {
    pub fn into_domain(self) -> RepositoryResult<SchedulableEntity> {
        let kind: EntityKind = self
            .kind
            .parse()
            .map_err(|e: String| RepositoryError::internal(e))?;
        Ok(SchedulableEntity {
            id: EntityId::new(self.entity_id),
            kind,
            organization_id: OrganizationId::new(self.organization_id),
            name: self.name,
            registration_opens_at: self.registration_opens_at,
            registration_closes_at: self.registration_closes_at,
            activity_starts_at: self.activity_starts_at,
            activity_ends_at: self.activity_ends_at,
            passing_score: self.passing_score,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

impl NewEntityRow {
    pub fn from_domain(entity: &SchedulableEntity) -> Self {
        Self {
            kind: entity.kind.as_str().to_string(),
            organization_id: entity.organization_id.value(),
            name: entity.name.clone(),
            registration_opens_at: entity.registration_opens_at,
            registration_closes_at: entity.registration_closes_at,
            activity_starts_at: entity.activity_starts_at,
            activity_ends_at: entity.activity_ends_at,
            passing_score: entity.passing_score,
            is_active: entity.is_active,
            created_at: entity.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = registrations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RegistrationRow {
    pub registration_code: String,
    pub candidate_id: i64,
    pub entity_id: i64,
    pub entity_kind: String,
    pub organization_id: i64,
    pub superseded: bool,
    pub created_at: DateTime<Utc>,
}

impl RegistrationRow {
    pub fn into_domain(self) -> RepositoryResult<Registration> {
        let kind: EntityKind = self
            .entity_kind
            .parse()
            .map_err(|e: String| RepositoryError::internal(e))?;
        Ok(Registration {
            code: RegistrationCode::new(self.registration_code),
            candidate_id: CandidateId::new(self.candidate_id),
            entity_id: EntityId::new(self.entity_id),
            kind,
            organization_id: OrganizationId::new(self.organization_id),
            superseded: self.superseded,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = exam_results)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ExamResultRow {
    pub registration_code: String,
    pub score: Option<i32>,
    pub passing_score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl ExamResultRow {
    pub fn into_domain(self) -> ExamResult {
        ExamResult {
            registration_code: RegistrationCode::new(self.registration_code),
            score: self.score,
            passing_score: self.passing_score,
            created_at: self.created_at,
        }
    }

    pub fn from_domain(result: &ExamResult) -> Self {
        Self {
            registration_code: result.registration_code.as_str().to_string(),
            score: result.score,
            passing_score: result.passing_score,
            created_at: result.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = teacher_assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TeacherAssignmentRow {
    pub teacher_id: i64,
    pub student_id: i64,
    pub created_at: DateTime<Utc>,
}
