//! Repository trait definitions.
//!
//! The engine talks to storage exclusively through these traits, split per
//! concern and unified under [`FullRepository`]. Implementations live in
//! `db::repositories` (in-memory local, Diesel/Postgres).

use async_trait::async_trait;

use crate::api::{CandidateId, EntityId, EntityKind, RegistrationCode};
use crate::models::{ExamResult, NewRegistration, PriorRegistration, Registration, SchedulableEntity};

mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// Constraint name reported when a second live registration for the same
/// (candidate, entity, kind) triple is attempted. Matches the partial unique
/// index in the Postgres schema; the local repository reports the same name.
pub const LIVE_PAIR_CONSTRAINT: &str = "uq_registrations_live";

/// Constraint name reported on a registration code collision.
pub const CODE_CONSTRAINT: &str = "registrations_pkey";

/// Repository trait for schedulable entities (courses, exams, programs).
///
/// Entities are created and mutated by admin actions only; the engine reads
/// them fresh on every decision (no caching of window bounds, so a stale
/// "open" can never be observed).
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// Store a new entity and return its id.
    ///
    /// Implementations must reject an entity whose registration window is
    /// inverted (`opens_at > closes_at`) with a validation error.
    async fn store_entity(&self, entity: &SchedulableEntity) -> RepositoryResult<EntityId>;

    /// Fetch one entity by kind and id. `Ok(None)` when absent.
    async fn fetch_entity(
        &self,
        kind: EntityKind,
        id: EntityId,
    ) -> RepositoryResult<Option<SchedulableEntity>>;

    /// List all entities of one kind.
    async fn list_entities(&self, kind: EntityKind) -> RepositoryResult<Vec<SchedulableEntity>>;

    /// Deactivate an entity. Deactivation is the supported removal path;
    /// rows referenced by registrations are never hard-deleted.
    ///
    /// Returns `true` if the entity existed.
    async fn deactivate_entity(&self, kind: EntityKind, id: EntityId) -> RepositoryResult<bool>;
}

/// Repository trait for registration rows.
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Insert a registration atomically with respect to concurrent inserts
    /// for the same (candidate, entity, kind) triple.
    ///
    /// Semantics:
    /// - If `new.supersedes` is set and names the only live row for the
    ///   triple, that row is marked superseded and the new row inserted, as
    ///   one atomic step.
    /// - If any other live row exists for the triple, the insert fails with
    ///   [`RepositoryError::Conflict`] naming `uq_registrations_live`.
    /// - A code collision fails with a conflict naming `registrations_pkey`.
    ///
    /// This is the serialization point that upholds the one-live-row
    /// invariant under concurrent registration attempts.
    async fn insert_registration(&self, new: &NewRegistration) -> RepositoryResult<Registration>;

    /// Live (non-superseded) registrations of one candidate for one entity,
    /// each joined with its graded result when one exists.
    async fn registrations_for(
        &self,
        candidate: CandidateId,
        kind: EntityKind,
        entity: EntityId,
    ) -> RepositoryResult<Vec<PriorRegistration>>;

    /// Look up a registration by code. `Ok(None)` when absent.
    async fn find_registration(
        &self,
        code: &RegistrationCode,
    ) -> RepositoryResult<Option<Registration>>;

    /// Delete a registration row. Returns `true` if a row was deleted.
    /// Linked results and the entity are untouched.
    async fn delete_registration(&self, code: &RegistrationCode) -> RepositoryResult<bool>;

    /// Whether a registration code is already taken (live or superseded).
    async fn registration_code_exists(&self, code: &RegistrationCode) -> RepositoryResult<bool>;
}

/// Repository trait for graded exam results.
///
/// Results are written by the external grading workflow and read by the
/// re-application policy.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Record (or overwrite) the result for a registration.
    async fn store_result(&self, result: &ExamResult) -> RepositoryResult<()>;

    /// Fetch the result for a registration. `Ok(None)` when ungraded.
    async fn result_for(&self, code: &RegistrationCode) -> RepositoryResult<Option<ExamResult>>;
}

/// Repository trait for the teacher/student directory.
///
/// Only the assignment relation is modeled here; it backs the lifecycle
/// manager's "assigned teacher may cancel" rule.
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// Record that a teacher is assigned to a student.
    async fn assign_teacher(
        &self,
        teacher: CandidateId,
        student: CandidateId,
    ) -> RepositoryResult<()>;

    /// Whether the teacher is currently assigned to the student.
    async fn is_teacher_assigned(
        &self,
        teacher: CandidateId,
        student: CandidateId,
    ) -> RepositoryResult<bool>;
}

/// Umbrella trait implemented by complete storage backends.
#[async_trait]
pub trait FullRepository:
    EntityRepository + RegistrationRepository + ResultRepository + DirectoryRepository
{
    /// Verify the backend is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;
}
