//! Registration lifecycle manager: cancellation.

use crate::api::{EntityKind, RegistrationCode};
use crate::db::repository::FullRepository;
use crate::models::{Caller, Registration, Role};

use super::error::{EngineError, EngineResult};

/// Cancel (delete) a registration.
///
/// Allowed for the registering candidate, an admin, or a teacher currently
/// assigned to that candidate. The assigned-teacher grant covers course and
/// exam registrations only; program enrolment is between the candidate and
/// the organization, so a teacher cannot withdraw it. Anyone else gets
/// `Unauthorized` and the row stays. An absent registration is a distinct
/// not-found outcome, mapped to one consistent HTTP status by the API layer.
///
/// Only the registration row is deleted; the entity and any linked result
/// are untouched.
pub async fn cancel(
    repo: &dyn FullRepository,
    caller: &Caller,
    code: &RegistrationCode,
) -> EngineResult<Registration> {
    let registration = repo
        .find_registration(code)
        .await?
        .ok_or_else(|| EngineError::RegistrationNotFound(code.clone()))?;

    if !may_cancel(repo, caller, &registration).await? {
        return Err(EngineError::Unauthorized);
    }

    let deleted = repo.delete_registration(code).await?;
    if !deleted {
        // Raced with another delete between lookup and removal.
        return Err(EngineError::RegistrationNotFound(code.clone()));
    }

    Ok(registration)
}

async fn may_cancel(
    repo: &dyn FullRepository,
    caller: &Caller,
    registration: &Registration,
) -> EngineResult<bool> {
    if caller.is_admin() {
        return Ok(true);
    }
    if caller.organization_id != registration.organization_id {
        return Ok(false);
    }
    if caller.id == registration.candidate_id {
        return Ok(true);
    }
    if caller.role == Role::Teacher && registration.kind != EntityKind::Program {
        let assigned = repo
            .is_teacher_assigned(caller.id, registration.candidate_id)
            .await?;
        return Ok(assigned);
    }
    Ok(false)
}

#[cfg(all(test, feature = "local-repo"))]
#[path = "lifecycle_tests.rs"]
mod lifecycle_tests;
