//! Resolved caller identity.
//!
//! Authentication is an external collaborator: something upstream verifies
//! the bearer credential and resolves it to exactly one student or teacher
//! plus an admin flag. The engine only ever sees this typed value and checks
//! roles itself; it never reconstructs identity from loose request fields.

use serde::{Deserialize, Serialize};

use crate::api::{CandidateId, OrganizationId};

/// Role the credential resolved to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Caller identity as supplied by the identity resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: CandidateId,
    pub organization_id: OrganizationId,
    pub role: Role,
    pub admin: bool,
}

impl Caller {
    pub fn student(id: CandidateId, organization_id: OrganizationId) -> Self {
        Self {
            id,
            organization_id,
            role: Role::Student,
            admin: false,
        }
    }

    pub fn teacher(id: CandidateId, organization_id: OrganizationId) -> Self {
        Self {
            id,
            organization_id,
            role: Role::Teacher,
            admin: false,
        }
    }

    pub fn with_admin(mut self) -> Self {
        self.admin = true;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }
}
