//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the engine
//! layer for business logic. Handlers never touch the repository for anything
//! the engine already decides; they only translate between HTTP and domain
//! types.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use super::dto::{
    CancelResponse, CreateEntityRequest, CreateEntityResponse, HealthResponse, RecordResultRequest,
    RegisterRequest, RegisterResponse, WindowResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{EntityId, EntityKind, RegistrationCode};
use crate::engine;
use crate::models::{Caller, ExamResult, SchedulableEntity};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

fn parse_kind(raw: &str) -> Result<EntityKind, AppError> {
    raw.parse::<EntityKind>()
        .map_err(|_| AppError::BadRequest(format!("unknown entity kind: {}", raw)))
}

fn require_admin(caller: &Caller) -> Result<(), AppError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::Engine(engine::EngineError::Unauthorized))
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Verifies the service is running and the database is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Registrations
// =============================================================================

/// POST /v1/registrations
///
/// Issue a registration for the calling candidate. Runs the full gauntlet:
/// entity lookup, window evaluation, duplicate policy, code issuance.
pub async fn create_registration(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let registration = engine::issue(
        state.repository.as_ref(),
        &caller,
        request.entity_kind,
        EntityId::new(request.entity_id),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(registration.into())))
}

/// GET /v1/registrations/{code}
///
/// Fetch the receipt for a registration. Visible to the registration's owner
/// and to admins.
pub async fn get_receipt(
    State(state): State<AppState>,
    caller: Caller,
    Path(code): Path<String>,
) -> HandlerResult<engine::Receipt> {
    let code = RegistrationCode::from(code);
    let receipt = engine::receipt(state.repository.as_ref(), &code).await?;

    if !caller.is_admin() && receipt.registration.candidate_id != caller.id {
        return Err(AppError::Engine(engine::EngineError::Unauthorized));
    }

    Ok(Json(receipt))
}

/// DELETE /v1/registrations/{code}
///
/// Cancel a registration. Permitted for the owner, an assigned teacher in the
/// same organization, or an admin.
pub async fn cancel_registration(
    State(state): State<AppState>,
    caller: Caller,
    Path(code): Path<String>,
) -> HandlerResult<CancelResponse> {
    let code = RegistrationCode::from(code);
    let removed = engine::cancel(state.repository.as_ref(), &caller, &code).await?;

    Ok(Json(CancelResponse {
        code: removed.code.into_string(),
        cancelled: true,
    }))
}

// =============================================================================
// Entities
// =============================================================================

/// GET /v1/entities/{kind}/{id}
///
/// Fetch an active entity in the caller's organization.
pub async fn get_entity(
    State(state): State<AppState>,
    caller: Caller,
    Path((kind, id)): Path<(String, i64)>,
) -> HandlerResult<SchedulableEntity> {
    let kind = parse_kind(&kind)?;
    let entity =
        engine::fetch_registrable_entity(state.repository.as_ref(), &caller, kind, EntityId::new(id))
            .await?;

    Ok(Json(entity))
}

/// GET /v1/entities/{kind}
///
/// List active entities of a kind in the caller's organization.
pub async fn list_entities(
    State(state): State<AppState>,
    caller: Caller,
    Path(kind): Path<String>,
) -> HandlerResult<Vec<SchedulableEntity>> {
    let kind = parse_kind(&kind)?;
    let entities = state
        .repository
        .list_entities(kind)
        .await
        .map_err(engine::EngineError::Repository)?
        .into_iter()
        .filter(|e| e.is_active && e.organization_id == caller.organization_id)
        .collect();

    Ok(Json(entities))
}

/// GET /v1/entities/{kind}/{id}/window
///
/// Evaluate the registration window of an entity as of now.
pub async fn get_window(
    State(state): State<AppState>,
    caller: Caller,
    Path((kind, id)): Path<(String, i64)>,
) -> HandlerResult<WindowResponse> {
    let kind = parse_kind(&kind)?;
    let entity =
        engine::fetch_registrable_entity(state.repository.as_ref(), &caller, kind, EntityId::new(id))
            .await?;

    let now = Utc::now();
    Ok(Json(WindowResponse {
        entity_id: entity.id.value(),
        entity_kind: entity.kind,
        state: engine::evaluate_window(&entity, now),
        registration_opens_at: entity.registration_opens_at,
        registration_closes_at: entity.registration_closes_at,
        evaluated_at: now,
    }))
}

/// POST /v1/entities
///
/// Create a schedulable entity in the caller's organization (admin only).
pub async fn create_entity(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateEntityRequest>,
) -> Result<(StatusCode, Json<CreateEntityResponse>), AppError> {
    require_admin(&caller)?;

    if request.name.trim().is_empty() {
        return Err(AppError::Engine(engine::EngineError::Validation(
            "entity name must not be empty".into(),
        )));
    }

    let entity = SchedulableEntity {
        id: EntityId::new(0),
        kind: request.kind,
        organization_id: caller.organization_id,
        name: request.name,
        registration_opens_at: request.registration_opens_at,
        registration_closes_at: request.registration_closes_at,
        activity_starts_at: request.activity_starts_at,
        activity_ends_at: request.activity_ends_at,
        passing_score: request.passing_score,
        is_active: true,
        created_at: Utc::now(),
    };

    let id = state
        .repository
        .store_entity(&entity)
        .await
        .map_err(engine::EngineError::Repository)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateEntityResponse {
            entity_id: id.value(),
            kind: request.kind,
        }),
    ))
}

/// DELETE /v1/entities/{kind}/{id}
///
/// Deactivate an entity (admin only). Existing registrations are untouched;
/// the entity just stops accepting new ones.
pub async fn deactivate_entity(
    State(state): State<AppState>,
    caller: Caller,
    Path((kind, id)): Path<(String, i64)>,
) -> HandlerResult<serde_json::Value> {
    require_admin(&caller)?;
    let kind = parse_kind(&kind)?;

    let id = EntityId::new(id);
    // Scope the admin to their own organization before touching the row.
    engine::fetch_registrable_entity(state.repository.as_ref(), &caller, kind, id).await?;

    let deactivated = state
        .repository
        .deactivate_entity(kind, id)
        .await
        .map_err(engine::EngineError::Repository)?;

    if !deactivated {
        return Err(AppError::Engine(engine::EngineError::EntityNotFound {
            kind,
            id,
        }));
    }

    Ok(Json(serde_json::json!({ "deactivated": true })))
}

// =============================================================================
// Results
// =============================================================================

/// POST /v1/results
///
/// Record an exam result against a registration (admin only). Upserts, so a
/// corrected score replaces the previous one.
pub async fn record_result(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<RecordResultRequest>,
) -> Result<(StatusCode, Json<ExamResult>), AppError> {
    require_admin(&caller)?;

    let code = RegistrationCode::from(request.registration_code);
    let registration = state
        .repository
        .find_registration(&code)
        .await
        .map_err(engine::EngineError::Repository)?
        .ok_or_else(|| engine::EngineError::RegistrationNotFound(code.clone()))?;

    if registration.organization_id != caller.organization_id {
        return Err(AppError::Engine(engine::EngineError::Unauthorized));
    }

    let result = ExamResult {
        registration_code: code,
        score: request.score,
        passing_score: request.passing_score,
        created_at: Utc::now(),
    };
    state
        .repository
        .store_result(&result)
        .await
        .map_err(engine::EngineError::Repository)?;

    Ok((StatusCode::CREATED, Json(result)))
}
