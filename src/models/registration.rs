//! Registration and result models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{CandidateId, EntityId, EntityKind, OrganizationId, RegistrationCode};

/// One candidate's claim on one schedulable entity.
///
/// A registration is never mutated in place; re-application after a failed
/// exam marks the old row superseded and inserts a fresh one. At most one
/// live (non-superseded) registration exists per (candidate, entity, kind).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub code: RegistrationCode,
    pub candidate_id: CandidateId,
    pub entity_id: EntityId,
    pub kind: EntityKind,
    pub organization_id: OrganizationId,
    pub superseded: bool,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    /// Whether this row is the live registration for its pair.
    pub fn is_live(&self) -> bool {
        !self.superseded
    }
}

/// Insert request handed to the repository by the issuer.
///
/// `supersedes` names the specific prior registration the re-application
/// policy decided to replace. The repository treats supersede + insert as one
/// atomic step; any other live row for the pair fails the insert with a
/// conflict.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub code: RegistrationCode,
    pub candidate_id: CandidateId,
    pub entity_id: EntityId,
    pub kind: EntityKind,
    pub organization_id: OrganizationId,
    pub supersedes: Option<RegistrationCode>,
    pub created_at: DateTime<Utc>,
}

/// Graded outcome for an exam registration.
///
/// Owned by the external grading workflow; the engine only reads it. A row
/// with `score` or `passing_score` absent is not decisive and keeps the
/// registration in the "already applied" state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamResult {
    pub registration_code: RegistrationCode,
    pub score: Option<i32>,
    pub passing_score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl ExamResult {
    /// Passing score for this result, falling back to the entity's own.
    pub fn effective_passing_score(&self, entity_passing_score: Option<i32>) -> Option<i32> {
        self.passing_score.or(entity_passing_score)
    }

    /// Decisive outcome, if both score and a passing threshold are known.
    /// `Some(true)` means passed.
    pub fn outcome(&self, entity_passing_score: Option<i32>) -> Option<bool> {
        match (self.score, self.effective_passing_score(entity_passing_score)) {
            (Some(score), Some(passing)) => Some(score >= passing),
            _ => None,
        }
    }
}

/// A prior registration together with its graded result, if any.
/// Input row for the duplicate/re-application policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorRegistration {
    pub registration: Registration,
    pub result: Option<ExamResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(score: Option<i32>, passing: Option<i32>) -> ExamResult {
        ExamResult {
            registration_code: RegistrationCode::new("ABCDEFGH12"),
            score,
            passing_score: passing,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_outcome_passed() {
        assert_eq!(result(Some(60), Some(50)).outcome(None), Some(true));
        assert_eq!(result(Some(50), Some(50)).outcome(None), Some(true));
    }

    #[test]
    fn test_outcome_failed() {
        assert_eq!(result(Some(40), Some(50)).outcome(None), Some(false));
    }

    #[test]
    fn test_outcome_indecisive_without_score_or_threshold() {
        assert_eq!(result(None, Some(50)).outcome(None), None);
        assert_eq!(result(Some(40), None).outcome(None), None);
    }

    #[test]
    fn test_entity_passing_score_fallback() {
        // Result carries no threshold of its own; the entity's applies.
        assert_eq!(result(Some(70), None).outcome(Some(65)), Some(true));
        assert_eq!(result(Some(60), None).outcome(Some(65)), Some(false));
        // A result-level threshold wins over the entity's.
        assert_eq!(result(Some(60), Some(55)).outcome(Some(65)), Some(true));
    }
}
