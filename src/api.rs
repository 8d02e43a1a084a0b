//! Public API surface for the registration backend.
//!
//! This file consolidates the typed identifiers and small value enums shared
//! by the engine, repository, and HTTP layers. All types derive
//! Serialize/Deserialize for JSON serialization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of a generated registration code, in ASCII alphanumeric characters.
pub const REGISTRATION_CODE_LEN: usize = 10;

/// Schedulable entity identifier (database primary key).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub i64);

/// Candidate identifier (student, or teacher acting for a student).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub i64);

/// Organization identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationId(pub i64);

impl EntityId {
    pub fn new(value: i64) -> Self {
        EntityId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl CandidateId {
    pub fn new(value: i64) -> Self {
        CandidateId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl OrganizationId {
    pub fn new(value: i64) -> Self {
        OrganizationId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<EntityId> for i64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl From<CandidateId> for i64 {
    fn from(id: CandidateId) -> Self {
        id.0
    }
}

impl From<OrganizationId> for i64 {
    fn from(id: OrganizationId) -> Self {
        id.0
    }
}

/// Kind of entity that accepts time-boxed registrations.
///
/// The whole eligibility engine is parameterized by this tag; there is one
/// decision pipeline, not one per kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Course,
    Exam,
    Program,
}

impl EntityKind {
    /// Stable lowercase tag used in storage and URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Course => "course",
            EntityKind::Exam => "exam",
            EntityKind::Program => "program",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "course" => Ok(EntityKind::Course),
            "exam" => Ok(EntityKind::Exam),
            "program" => Ok(EntityKind::Program),
            other => Err(format!("Unknown entity kind: {}", other)),
        }
    }
}

/// State of an entity's registration window at a given instant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    NotYetOpen,
    Open,
    Closed,
}

impl WindowState {
    pub fn is_open(&self) -> bool {
        matches!(self, WindowState::Open)
    }

    /// Stable machine-readable tag for API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowState::NotYetOpen => "not_yet_open",
            WindowState::Open => "open",
            WindowState::Closed => "closed",
        }
    }
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generated registration code: the human-readable receipt/lookup key.
///
/// Globally unique and immutable once assigned. Always
/// [`REGISTRATION_CODE_LEN`] ASCII alphanumeric characters when produced by
/// the issuer; foreign values are accepted for lookups without validation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegistrationCode(String);

impl RegistrationCode {
    pub fn new(value: impl Into<String>) -> Self {
        RegistrationCode(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RegistrationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RegistrationCode {
    fn from(value: String) -> Self {
        RegistrationCode(value)
    }
}

impl From<&str> for RegistrationCode {
    fn from(value: &str) -> Self {
        RegistrationCode(value.to_string())
    }
}
