//! Schedulable entity model: a course, exam, or program instance that
//! accepts time-boxed registrations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{EntityId, EntityKind, OrganizationId};

/// A course, exam, or program open for registration during a time window.
///
/// `registration_opens_at`/`registration_closes_at` bound the registration
/// window; either being absent means the entity is never open (the window
/// evaluator fails closed). `activity_starts_at`/`activity_ends_at` carry the
/// secondary validity window (program start/end dates, exam start/end time).
/// `passing_score` is only meaningful for exam-kind entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulableEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub organization_id: OrganizationId,
    pub name: String,
    pub registration_opens_at: Option<DateTime<Utc>>,
    pub registration_closes_at: Option<DateTime<Utc>>,
    pub activity_starts_at: Option<DateTime<Utc>>,
    pub activity_ends_at: Option<DateTime<Utc>>,
    pub passing_score: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl SchedulableEntity {
    /// Validate the invariant `registration_opens_at <= registration_closes_at`.
    ///
    /// Both bounds absent is accepted (a never-open entity); a single absent
    /// bound is accepted too and also reads as never open.
    pub fn validate_window(&self) -> Result<(), String> {
        if let (Some(opens), Some(closes)) = (self.registration_opens_at, self.registration_closes_at)
        {
            if opens > closes {
                return Err(format!(
                    "registration window opens ({}) after it closes ({})",
                    opens, closes
                ));
            }
        }
        Ok(())
    }

    /// Whether both registration window bounds are present.
    pub fn has_registration_window(&self) -> bool {
        self.registration_opens_at.is_some() && self.registration_closes_at.is_some()
    }
}
