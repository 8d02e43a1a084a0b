//! Typed outcomes for engine operations.
//!
//! Business-rule denials are values, never exceptions used for control flow.
//! Every denial carries a stable machine-readable code for the API boundary;
//! only genuinely unexpected failures (store unreachable, code-space
//! exhaustion) surface as faults.

use crate::api::{EntityId, EntityKind, RegistrationCode, WindowState};
use crate::db::repository::RepositoryError;

/// Why a duplicate registration attempt was denied.
///
/// The two reasons are semantically different and are never collapsed:
/// passing an exam closes the door for good, while an in-flight (ungraded)
/// application merely blocks a second one.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DuplicateReason {
    /// A live registration exists with no decisive result yet.
    AlreadyApplied,
    /// The prior registration was graded at or above the passing score.
    AlreadyPassed,
}

impl DuplicateReason {
    pub fn code(&self) -> &'static str {
        match self {
            DuplicateReason::AlreadyApplied => "ALREADY_APPLIED",
            DuplicateReason::AlreadyPassed => "ALREADY_PASSED",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            DuplicateReason::AlreadyApplied => "already applied",
            DuplicateReason::AlreadyPassed => "already passed, cannot reapply",
        }
    }
}

/// Error type for engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Missing or malformed input; no store access was attempted.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Target entity does not exist, is inactive, or belongs to another
    /// organization. All three read the same from outside.
    #[error("{kind} {id} not found or inactive")]
    EntityNotFound { kind: EntityKind, id: EntityId },

    /// Registration window is not open; carries which side was missed.
    #[error("registration window is {state}")]
    WindowNotOpen { state: WindowState },

    /// Duplicate/re-application policy denial.
    #[error("registration denied: {}", .0.message())]
    Duplicate(DuplicateReason),

    /// Referenced registration does not exist.
    #[error("registration {0} not found")]
    RegistrationNotFound(RegistrationCode),

    /// Caller may not cancel this registration.
    #[error("caller is not allowed to act on this registration")]
    Unauthorized,

    /// Could not allocate a unique registration code. At expected table
    /// sizes the collision probability is negligible; hitting this is fatal.
    #[error("failed to allocate a unique registration code after {attempts} attempts")]
    CodeExhausted { attempts: u32 },

    /// Storage-layer fault.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl EngineError {
    /// Stable machine-readable code for the API boundary.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "VALIDATION",
            EngineError::EntityNotFound { .. } => "ENTITY_NOT_FOUND",
            EngineError::WindowNotOpen {
                state: WindowState::NotYetOpen,
            } => "WINDOW_NOT_YET_OPEN",
            EngineError::WindowNotOpen { .. } => "WINDOW_CLOSED",
            EngineError::Duplicate(reason) => reason.code(),
            EngineError::RegistrationNotFound(_) => "REGISTRATION_NOT_FOUND",
            EngineError::Unauthorized => "UNAUTHORIZED",
            EngineError::CodeExhausted { .. } => "CODE_EXHAUSTED",
            EngineError::Repository(_) => "REPOSITORY_ERROR",
        }
    }

    /// Whether this is a business-rule denial (as opposed to a fault).
    pub fn is_denial(&self) -> bool {
        !matches!(
            self,
            EngineError::CodeExhausted { .. } | EngineError::Repository(_)
        )
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
