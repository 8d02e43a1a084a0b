//! Eligibility window evaluator.
//!
//! Pure function of (entity, now). The caller captures `now` once per
//! decision and threads it through; the evaluator never re-samples the
//! clock, so the open/close comparisons always see the same instant.

use chrono::{DateTime, Utc};

use crate::api::WindowState;
use crate::models::SchedulableEntity;

/// Evaluate the registration window of an entity at `now`.
///
/// - A missing `opens_at` or `closes_at` reads as never open (fails closed).
/// - Both boundaries are inclusive: `now == opens_at` and `now == closes_at`
///   are both `Open`.
/// - When the entity carries a secondary activity window end (program end
///   date, exam end time), registration additionally requires the activity
///   not to have concluded: `now > activity_ends_at` reads as `Closed`.
///   The activity start never gates registration; it only gates display.
pub fn evaluate_window(entity: &SchedulableEntity, now: DateTime<Utc>) -> WindowState {
    let (opens_at, closes_at) = match (entity.registration_opens_at, entity.registration_closes_at)
    {
        (Some(opens), Some(closes)) => (opens, closes),
        _ => return WindowState::Closed,
    };

    if now < opens_at {
        return WindowState::NotYetOpen;
    }
    if now > closes_at {
        return WindowState::Closed;
    }
    if let Some(activity_end) = entity.activity_ends_at {
        if now > activity_end {
            return WindowState::Closed;
        }
    }

    WindowState::Open
}

#[cfg(test)]
#[path = "window_tests.rs"]
mod window_tests;
