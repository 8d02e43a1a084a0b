//! Data Transfer Objects for the HTTP API.
//!
//! Request/response shapes for the REST surface. Domain types that already
//! derive Serialize (registrations, receipts, entities) are returned as-is;
//! the DTOs here cover request bodies and the thin response wrappers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::api::{EntityKind, WindowState};
pub use crate::engine::Receipt;
pub use crate::models::{Registration, SchedulableEntity};

/// Request body for creating a registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// What kind of entity the candidate is registering for
    pub entity_kind: EntityKind,
    /// Target entity id
    pub entity_id: i64,
}

/// Response for successful registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Issued registration code, the candidate's proof of registration
    pub code: String,
    pub entity_kind: EntityKind,
    pub entity_id: i64,
    pub candidate_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Registration> for RegisterResponse {
    fn from(r: Registration) -> Self {
        Self {
            code: r.code.into_string(),
            entity_kind: r.kind,
            entity_id: r.entity_id.value(),
            candidate_id: r.candidate_id.value(),
            created_at: r.created_at,
        }
    }
}

/// Response for a cancelled registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    /// Code of the registration that was removed
    pub code: String,
    pub cancelled: bool,
}

/// Request body for creating a schedulable entity (admin only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEntityRequest {
    pub kind: EntityKind,
    pub name: String,
    #[serde(default)]
    pub registration_opens_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub registration_closes_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub activity_starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub activity_ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub passing_score: Option<i32>,
}

/// Response for entity creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEntityResponse {
    pub entity_id: i64,
    pub kind: EntityKind,
}

/// Request body for recording an exam result (admin only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResultRequest {
    pub registration_code: String,
    #[serde(default)]
    pub score: Option<i32>,
    /// Per-sitting passing score; falls back to the entity's when absent
    #[serde(default)]
    pub passing_score: Option<i32>,
}

/// Window evaluation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowResponse {
    pub entity_id: i64,
    pub entity_kind: EntityKind,
    pub state: WindowState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_opens_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_closes_at: Option<DateTime<Utc>>,
    /// Instant the evaluation was made at
    pub evaluated_at: DateTime<Utc>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}
