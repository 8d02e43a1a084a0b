//! Registration issuer.
//!
//! Runs the full decision pipeline for one registration attempt: entity
//! lookup, window evaluation, duplicate/re-application policy, code
//! allocation, and the final atomic insert. Each step short-circuits the
//! next on denial; the insert is the single, final write, so a denied or
//! timed-out attempt leaves no partial state.

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::api::{EntityId, EntityKind, RegistrationCode, REGISTRATION_CODE_LEN};
use crate::db::repository::{FullRepository, RepositoryError, CODE_CONSTRAINT};
use crate::models::{Caller, NewRegistration, Registration, SchedulableEntity};

use super::error::{DuplicateReason, EngineError, EngineResult};
use super::policy::{self, PolicyDecision};
use super::window::evaluate_window;

/// Upper bound on code generation attempts before giving up.
///
/// With 62^10 possible codes a single collision is already unlikely; hitting
/// the bound indicates something is badly wrong with the store or the RNG.
pub const MAX_CODE_ATTEMPTS: u32 = 8;

/// Generate one candidate registration code.
///
/// `thread_rng` is a CSPRNG, which keeps codes unguessable enough to serve
/// as receipt/lookup keys.
pub fn generate_code() -> RegistrationCode {
    let code: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REGISTRATION_CODE_LEN)
        .map(char::from)
        .collect();
    RegistrationCode::new(code)
}

/// Register `caller` for the given entity.
///
/// Returns the persisted registration, or a typed denial. Store-level
/// duplicate conflicts (the lost side of a race) surface as
/// [`EngineError::Duplicate`], never as faults.
pub async fn issue(
    repo: &dyn FullRepository,
    caller: &Caller,
    kind: EntityKind,
    entity_id: EntityId,
) -> EngineResult<Registration> {
    // One clock sample per attempt; every window comparison sees it.
    let now = Utc::now();

    let entity = fetch_registrable_entity(repo, caller, kind, entity_id).await?;

    let state = evaluate_window(&entity, now);
    if !state.is_open() {
        return Err(EngineError::WindowNotOpen { state });
    }

    let prior = repo.registrations_for(caller.id, kind, entity_id).await?;
    let supersedes = match policy::decide(&prior, entity.passing_score) {
        PolicyDecision::Deny(reason) => return Err(EngineError::Duplicate(reason)),
        PolicyDecision::Allow { supersedes } => supersedes,
    };

    // Allocate a fresh code and insert. A code conflict regenerates within
    // the bounded loop; a live-pair conflict means a concurrent attempt won
    // the race and reads as a duplicate denial.
    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code = generate_code();
        if repo.registration_code_exists(&code).await? {
            log::warn!(
                "registration code collision on attempt {}/{}",
                attempt,
                MAX_CODE_ATTEMPTS
            );
            continue;
        }

        let new = NewRegistration {
            code,
            candidate_id: caller.id,
            entity_id,
            kind,
            organization_id: caller.organization_id,
            supersedes: supersedes.clone(),
            created_at: now,
        };

        match repo.insert_registration(&new).await {
            Ok(registration) => return Ok(registration),
            Err(err @ RepositoryError::Conflict { .. }) => {
                match err.conflict_constraint() {
                    Some(CODE_CONSTRAINT) => continue,
                    _ => return Err(EngineError::Duplicate(DuplicateReason::AlreadyApplied)),
                }
            }
            Err(other) => return Err(other.into()),
        }
    }

    Err(EngineError::CodeExhausted {
        attempts: MAX_CODE_ATTEMPTS,
    })
}

/// Fetch the target entity, mapping absence, inactivity, and organization
/// mismatch to one uniform not-found outcome.
pub(crate) async fn fetch_registrable_entity(
    repo: &dyn FullRepository,
    caller: &Caller,
    kind: EntityKind,
    entity_id: EntityId,
) -> EngineResult<SchedulableEntity> {
    let entity = repo
        .fetch_entity(kind, entity_id)
        .await?
        .filter(|e| e.is_active && e.organization_id == caller.organization_id)
        .ok_or(EngineError::EntityNotFound {
            kind,
            id: entity_id,
        })?;
    Ok(entity)
}

#[cfg(all(test, feature = "local-repo"))]
#[path = "issuer_tests.rs"]
mod issuer_tests;
