//! Caller identity extraction.
//!
//! The service trusts an upstream gateway to authenticate requests and to
//! forward the caller's identity in headers. This extractor turns those
//! headers into a [`Caller`] value; a missing or malformed header is a 401.
//!
//! Headers:
//! - `x-caller-id`: numeric candidate id (required)
//! - `x-caller-org`: numeric organization id (required)
//! - `x-caller-role`: `student` or `teacher` (defaults to `student`)
//! - `x-caller-admin`: `true` to grant admin scope (defaults to false)

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::error::AppError;
use crate::api::{CandidateId, OrganizationId};
use crate::models::{Caller, Role};

const CALLER_ID_HEADER: &str = "x-caller-id";
const CALLER_ORG_HEADER: &str = "x-caller-org";
const CALLER_ROLE_HEADER: &str = "x-caller-role";
const CALLER_ADMIN_HEADER: &str = "x-caller-admin";

fn header_str<'a>(parts: &'a Parts, name: &str) -> Result<Option<&'a str>, AppError> {
    match parts.headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| AppError::Unauthenticated(format!("{} is not valid UTF-8", name))),
    }
}

fn required_i64(parts: &Parts, name: &str) -> Result<i64, AppError> {
    let raw = header_str(parts, name)?
        .ok_or_else(|| AppError::Unauthenticated(format!("missing {} header", name)))?;
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::Unauthenticated(format!("{} must be an integer", name)))
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = required_i64(parts, CALLER_ID_HEADER)?;
        let org = required_i64(parts, CALLER_ORG_HEADER)?;

        let role = match header_str(parts, CALLER_ROLE_HEADER)? {
            None => Role::Student,
            Some(raw) => raw.trim().parse::<Role>().map_err(|_| {
                AppError::Unauthenticated(format!("unknown role in {}", CALLER_ROLE_HEADER))
            })?,
        };

        let admin = matches!(
            header_str(parts, CALLER_ADMIN_HEADER)?,
            Some(raw) if raw.trim().eq_ignore_ascii_case("true")
        );

        Ok(Caller {
            id: CandidateId::new(id),
            organization_id: OrganizationId::new(org),
            role,
            admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRequestParts;
    use axum::http::Request;

    async fn extract(builder: axum::http::request::Builder) -> Result<Caller, AppError> {
        let request = builder.body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        Caller::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn extracts_full_identity() {
        let caller = extract(
            Request::builder()
                .header("x-caller-id", "42")
                .header("x-caller-org", "7")
                .header("x-caller-role", "teacher")
                .header("x-caller-admin", "true"),
        )
        .await
        .unwrap();

        assert_eq!(caller.id.value(), 42);
        assert_eq!(caller.organization_id.value(), 7);
        assert_eq!(caller.role, Role::Teacher);
        assert!(caller.admin);
    }

    #[tokio::test]
    async fn role_defaults_to_student() {
        let caller = extract(
            Request::builder()
                .header("x-caller-id", "1")
                .header("x-caller-org", "1"),
        )
        .await
        .unwrap();

        assert_eq!(caller.role, Role::Student);
        assert!(!caller.admin);
    }

    #[tokio::test]
    async fn missing_id_is_rejected() {
        let err = extract(Request::builder().header("x-caller-org", "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn non_numeric_id_is_rejected() {
        let err = extract(
            Request::builder()
                .header("x-caller-id", "alice")
                .header("x-caller-org", "1"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() {
        let err = extract(
            Request::builder()
                .header("x-caller-id", "1")
                .header("x-caller-org", "1")
                .header("x-caller-role", "wizard"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }
}
