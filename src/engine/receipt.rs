//! Receipt/lookup projection.
//!
//! The engine only assembles the data snapshot; rendering it into a PDF/QR
//! document is an external collaborator's job.

use serde::{Deserialize, Serialize};

use crate::api::RegistrationCode;
use crate::db::repository::FullRepository;
use crate::models::{ExamResult, Registration, SchedulableEntity};

use super::error::{EngineError, EngineResult};

/// Snapshot of one registration with its entity and, for graded exam
/// registrations, the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub registration: Registration,
    pub entity: SchedulableEntity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExamResult>,
}

/// Assemble the receipt data for a registration code.
///
/// A registration whose entity vanished (admin deactivation does not count;
/// the snapshot still renders) maps to a not-found outcome rather than a
/// half-empty receipt.
pub async fn receipt(
    repo: &dyn FullRepository,
    code: &RegistrationCode,
) -> EngineResult<Receipt> {
    let registration = repo
        .find_registration(code)
        .await?
        .ok_or_else(|| EngineError::RegistrationNotFound(code.clone()))?;

    let entity = repo
        .fetch_entity(registration.kind, registration.entity_id)
        .await?
        .ok_or(EngineError::EntityNotFound {
            kind: registration.kind,
            id: registration.entity_id,
        })?;

    let result = repo.result_for(code).await?;

    Ok(Receipt {
        registration,
        entity,
        result,
    })
}
