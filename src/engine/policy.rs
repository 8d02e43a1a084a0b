//! Duplicate & re-application policy.
//!
//! This is where the business intent lives: passing an exam closes the door,
//! failing re-opens it, and a registration with no decisive result is an
//! in-flight application that blocks duplicates.

use crate::api::RegistrationCode;
use crate::models::PriorRegistration;

use super::error::DuplicateReason;

/// Outcome of the duplicate/re-application check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Registration may proceed. When re-applying after a failure,
    /// `supersedes` names the prior registration the new one replaces.
    Allow {
        supersedes: Option<RegistrationCode>,
    },
    /// Registration is denied for the given reason.
    Deny(DuplicateReason),
}

impl PolicyDecision {
    pub fn is_allow(&self) -> bool {
        matches!(self, PolicyDecision::Allow { .. })
    }
}

/// Decide whether a candidate may register given their live prior
/// registrations for the target entity.
///
/// When several priors exist, the most relevant one is the most recently
/// created; ties on `created_at` break towards the lexicographically
/// greatest code, keeping the order deterministic.
pub fn decide(prior: &[PriorRegistration], entity_passing_score: Option<i32>) -> PolicyDecision {
    let most_relevant = prior
        .iter()
        .max_by_key(|p| (p.registration.created_at, p.registration.code.clone()));

    let prior = match most_relevant {
        Some(p) => p,
        None => {
            return PolicyDecision::Allow { supersedes: None };
        }
    };

    match prior.result.as_ref().and_then(|r| r.outcome(entity_passing_score)) {
        Some(true) => PolicyDecision::Deny(DuplicateReason::AlreadyPassed),
        Some(false) => PolicyDecision::Allow {
            supersedes: Some(prior.registration.code.clone()),
        },
        // No result row, or score/passing score undefined: the application
        // is still in flight and blocks a second one.
        None => PolicyDecision::Deny(DuplicateReason::AlreadyApplied),
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod policy_tests;
