use chrono::{DateTime, Utc};

use super::{decide, PolicyDecision};
use crate::api::{CandidateId, EntityId, EntityKind, OrganizationId, RegistrationCode};
use crate::engine::error::DuplicateReason;
use crate::models::{ExamResult, PriorRegistration, Registration};

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn prior(code: &str, created: &str, result: Option<(Option<i32>, Option<i32>)>) -> PriorRegistration {
    PriorRegistration {
        registration: Registration {
            code: RegistrationCode::new(code),
            candidate_id: CandidateId::new(1),
            entity_id: EntityId::new(10),
            kind: EntityKind::Exam,
            organization_id: OrganizationId::new(1),
            superseded: false,
            created_at: ts(created),
        },
        result: result.map(|(score, passing)| ExamResult {
            registration_code: RegistrationCode::new(code),
            score,
            passing_score: passing,
            created_at: ts(created),
        }),
    }
}

#[test]
fn test_empty_prior_set_allows() {
    assert_eq!(
        decide(&[], Some(50)),
        PolicyDecision::Allow { supersedes: None }
    );
}

#[test]
fn test_ungraded_prior_denies_already_applied() {
    let priors = vec![prior("AAAA111111", "2025-01-10T00:00:00Z", None)];
    assert_eq!(
        decide(&priors, Some(50)),
        PolicyDecision::Deny(DuplicateReason::AlreadyApplied)
    );
}

#[test]
fn test_indecisive_result_denies_already_applied() {
    // Result row present but score undefined: still in flight.
    let priors = vec![prior(
        "AAAA111111",
        "2025-01-10T00:00:00Z",
        Some((None, Some(50))),
    )];
    assert_eq!(
        decide(&priors, Some(50)),
        PolicyDecision::Deny(DuplicateReason::AlreadyApplied)
    );

    // Score present but no passing threshold anywhere.
    let priors = vec![prior(
        "AAAA111111",
        "2025-01-10T00:00:00Z",
        Some((Some(40), None)),
    )];
    assert_eq!(
        decide(&priors, None),
        PolicyDecision::Deny(DuplicateReason::AlreadyApplied)
    );
}

#[test]
fn test_passed_prior_denies_already_passed() {
    let priors = vec![prior(
        "AAAA111111",
        "2025-01-10T00:00:00Z",
        Some((Some(60), Some(50))),
    )];
    assert_eq!(
        decide(&priors, None),
        PolicyDecision::Deny(DuplicateReason::AlreadyPassed)
    );
}

#[test]
fn test_exact_passing_score_counts_as_passed() {
    let priors = vec![prior(
        "AAAA111111",
        "2025-01-10T00:00:00Z",
        Some((Some(50), Some(50))),
    )];
    assert_eq!(
        decide(&priors, None),
        PolicyDecision::Deny(DuplicateReason::AlreadyPassed)
    );
}

#[test]
fn test_failed_prior_allows_reapplication() {
    let priors = vec![prior(
        "AAAA111111",
        "2025-01-10T00:00:00Z",
        Some((Some(40), Some(50))),
    )];
    assert_eq!(
        decide(&priors, None),
        PolicyDecision::Allow {
            supersedes: Some(RegistrationCode::new("AAAA111111"))
        }
    );
}

#[test]
fn test_entity_passing_score_fallback() {
    // Result carries no threshold; entity's 50 applies.
    let priors = vec![prior(
        "AAAA111111",
        "2025-01-10T00:00:00Z",
        Some((Some(40), None)),
    )];
    assert_eq!(
        decide(&priors, Some(50)),
        PolicyDecision::Allow {
            supersedes: Some(RegistrationCode::new("AAAA111111"))
        }
    );
}

#[test]
fn test_most_recent_prior_wins() {
    // Older failed registration would allow, but the newest is ungraded.
    let priors = vec![
        prior("AAAA111111", "2025-01-10T00:00:00Z", Some((Some(40), Some(50)))),
        prior("BBBB222222", "2025-02-10T00:00:00Z", None),
    ];
    assert_eq!(
        decide(&priors, None),
        PolicyDecision::Deny(DuplicateReason::AlreadyApplied)
    );
}

#[test]
fn test_created_at_tie_breaks_by_code() {
    // Same instant: the lexicographically greatest code is the relevant one.
    let priors = vec![
        prior("AAAA111111", "2025-01-10T00:00:00Z", Some((Some(40), Some(50)))),
        prior("ZZZZ999999", "2025-01-10T00:00:00Z", Some((Some(90), Some(50)))),
    ];
    assert_eq!(
        decide(&priors, None),
        PolicyDecision::Deny(DuplicateReason::AlreadyPassed)
    );
}
