//! In-memory repository for unit testing and local development.
//!
//! Emulates the Postgres constraints — unique codes, at most one live
//! registration per (candidate, entity, kind) — under a single write lock,
//! so check + supersede + insert is atomic exactly like the database's
//! partial unique index makes it in production.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::api::{CandidateId, EntityId, EntityKind, RegistrationCode};
use crate::db::repository::{
    DirectoryRepository, EntityRepository, ErrorContext, FullRepository, RegistrationRepository,
    RepositoryError, RepositoryResult, ResultRepository, CODE_CONSTRAINT, LIVE_PAIR_CONSTRAINT,
};
use crate::models::{
    ExamResult, NewRegistration, PriorRegistration, Registration, SchedulableEntity,
};

#[derive(Default)]
struct Inner {
    entities: HashMap<(EntityKind, EntityId), SchedulableEntity>,
    next_entity_id: i64,
    registrations: HashMap<RegistrationCode, Registration>,
    results: HashMap<RegistrationCode, ExamResult>,
    /// (teacher, student) pairs.
    assignments: HashSet<(CandidateId, CandidateId)>,
}

/// In-memory implementation of [`FullRepository`].
#[derive(Default)]
pub struct LocalRepository {
    inner: RwLock<Inner>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_entity_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Number of stored registration rows, live and superseded. Test helper.
    pub fn registration_count(&self) -> usize {
        self.inner.read().registrations.len()
    }
}

#[async_trait]
impl EntityRepository for LocalRepository {
    async fn store_entity(&self, entity: &SchedulableEntity) -> RepositoryResult<EntityId> {
        entity.validate_window().map_err(|msg| {
            RepositoryError::validation_with_context(
                msg,
                ErrorContext::new("store_entity").with_entity("entity"),
            )
        })?;

        let mut inner = self.inner.write();
        let id = if entity.id.value() == 0 {
            let id = EntityId::new(inner.next_entity_id);
            inner.next_entity_id += 1;
            id
        } else {
            inner.next_entity_id = inner.next_entity_id.max(entity.id.value() + 1);
            entity.id
        };

        let mut stored = entity.clone();
        stored.id = id;
        inner.entities.insert((stored.kind, id), stored);
        Ok(id)
    }

    async fn fetch_entity(
        &self,
        kind: EntityKind,
        id: EntityId,
    ) -> RepositoryResult<Option<SchedulableEntity>> {
        Ok(self.inner.read().entities.get(&(kind, id)).cloned())
    }

    async fn list_entities(&self, kind: EntityKind) -> RepositoryResult<Vec<SchedulableEntity>> {
        let inner = self.inner.read();
        let mut entities: Vec<SchedulableEntity> = inner
            .entities
            .values()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect();
        entities.sort_by_key(|e| e.id);
        Ok(entities)
    }

    async fn deactivate_entity(&self, kind: EntityKind, id: EntityId) -> RepositoryResult<bool> {
        let mut inner = self.inner.write();
        match inner.entities.get_mut(&(kind, id)) {
            Some(entity) => {
                entity.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl RegistrationRepository for LocalRepository {
    async fn insert_registration(&self, new: &NewRegistration) -> RepositoryResult<Registration> {
        // Everything below happens under one write lock; this is the local
        // equivalent of the database's constraint-checked insert.
        let mut inner = self.inner.write();

        if inner.registrations.contains_key(&new.code) {
            return Err(RepositoryError::conflict(
                format!("registration code {} already exists", new.code),
                CODE_CONSTRAINT,
            )
            .with_operation("insert_registration"));
        }

        let live_other = inner.registrations.values().any(|r| {
            r.is_live()
                && r.candidate_id == new.candidate_id
                && r.entity_id == new.entity_id
                && r.kind == new.kind
                && Some(&r.code) != new.supersedes.as_ref()
        });
        if live_other {
            return Err(RepositoryError::conflict(
                format!(
                    "live registration already exists for candidate {} on {} {}",
                    new.candidate_id, new.kind, new.entity_id
                ),
                LIVE_PAIR_CONSTRAINT,
            )
            .with_operation("insert_registration"));
        }

        if let Some(superseded_code) = &new.supersedes {
            if let Some(old) = inner.registrations.get_mut(superseded_code) {
                old.superseded = true;
            }
        }

        let registration = Registration {
            code: new.code.clone(),
            candidate_id: new.candidate_id,
            entity_id: new.entity_id,
            kind: new.kind,
            organization_id: new.organization_id,
            superseded: false,
            created_at: new.created_at,
        };
        inner
            .registrations
            .insert(registration.code.clone(), registration.clone());
        Ok(registration)
    }

    async fn registrations_for(
        &self,
        candidate: CandidateId,
        kind: EntityKind,
        entity: EntityId,
    ) -> RepositoryResult<Vec<PriorRegistration>> {
        let inner = self.inner.read();
        let mut rows: Vec<PriorRegistration> = inner
            .registrations
            .values()
            .filter(|r| {
                r.is_live()
                    && r.candidate_id == candidate
                    && r.kind == kind
                    && r.entity_id == entity
            })
            .map(|r| PriorRegistration {
                registration: r.clone(),
                result: inner.results.get(&r.code).cloned(),
            })
            .collect();
        rows.sort_by(|a, b| {
            (a.registration.created_at, &a.registration.code)
                .cmp(&(b.registration.created_at, &b.registration.code))
        });
        Ok(rows)
    }

    async fn find_registration(
        &self,
        code: &RegistrationCode,
    ) -> RepositoryResult<Option<Registration>> {
        Ok(self.inner.read().registrations.get(code).cloned())
    }

    async fn delete_registration(&self, code: &RegistrationCode) -> RepositoryResult<bool> {
        Ok(self.inner.write().registrations.remove(code).is_some())
    }

    async fn registration_code_exists(&self, code: &RegistrationCode) -> RepositoryResult<bool> {
        Ok(self.inner.read().registrations.contains_key(code))
    }
}

#[async_trait]
impl ResultRepository for LocalRepository {
    async fn store_result(&self, result: &ExamResult) -> RepositoryResult<()> {
        let mut inner = self.inner.write();
        if !inner.registrations.contains_key(&result.registration_code) {
            return Err(RepositoryError::not_found_with_context(
                format!("registration {} not found", result.registration_code),
                ErrorContext::new("store_result").with_entity("registration"),
            ));
        }
        inner
            .results
            .insert(result.registration_code.clone(), result.clone());
        Ok(())
    }

    async fn result_for(&self, code: &RegistrationCode) -> RepositoryResult<Option<ExamResult>> {
        Ok(self.inner.read().results.get(code).cloned())
    }
}

#[async_trait]
impl DirectoryRepository for LocalRepository {
    async fn assign_teacher(
        &self,
        teacher: CandidateId,
        student: CandidateId,
    ) -> RepositoryResult<()> {
        self.inner.write().assignments.insert((teacher, student));
        Ok(())
    }

    async fn is_teacher_assigned(
        &self,
        teacher: CandidateId,
        student: CandidateId,
    ) -> RepositoryResult<bool> {
        Ok(self.inner.read().assignments.contains(&(teacher, student)))
    }
}

#[async_trait]
impl FullRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}
