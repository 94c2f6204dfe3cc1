use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use gd_core::domain::{
    decide, AccessError, AccessView, ApiKey, DepartmentDirectory, GeoPoint, GrievanceDraft,
    IntakeDecision, PortalError, Profile, ProfileId, ProfileRegistry, Status,
};
use gd_store::{GrievanceRecord, GrievanceStore, StoreError};

use crate::classifier::ClassifierClient;

// ---------------------------------------------------------------------------
// AppState — shared state for all handlers
// ---------------------------------------------------------------------------

pub struct AppState {
    pub registry: ProfileRegistry,
    pub directory: DepartmentDirectory,
    pub classifier: ClassifierClient,
    pub store: Arc<dyn GrievanceStore>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/v1/grievances",
            post(submit_grievance).get(list_grievances),
        )
        .route("/v1/grievances/{id}", get(get_grievance))
        .route("/v1/grievances/{id}/history", get(get_history))
        .route("/v1/grievances/{id}/status", patch(update_status))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub description: String,
    pub location: Option<GeoPoint>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: Status,
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Error helpers
// ---------------------------------------------------------------------------

type ApiError = (StatusCode, Json<Value>);

fn json_error(status: StatusCode, error_type: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(json!({"error": {"type": error_type, "message": message.into()}})),
    )
}

/// Map a domain error onto an HTTP status and wire error type.
fn portal_error_to_response(err: PortalError) -> ApiError {
    let (status, error_type) = match &err {
        PortalError::Access(AccessError::InvalidApiKey) => {
            (StatusCode::UNAUTHORIZED, "authentication_error")
        }
        PortalError::Access(AccessError::InactiveProfile { .. }) => {
            (StatusCode::FORBIDDEN, "account_inactive")
        }
        PortalError::Access(_) => (StatusCode::FORBIDDEN, "permission_error"),
        PortalError::Transition(_) => (StatusCode::CONFLICT, "conflict"),
        PortalError::Classify(_) => (StatusCode::SERVICE_UNAVAILABLE, "classifier_unavailable"),
        PortalError::Routing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };
    json_error(status, error_type, err.to_string())
}

fn store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
        StoreError::Transition(t) => portal_error_to_response(t.into()),
        StoreError::Database(_) => {
            tracing::error!(error = %err, "store failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "storage failure",
            )
        }
    }
}

fn join_error(err: tokio::task::JoinError) -> ApiError {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        format!("failed to join store task: {err}"),
    )
}

// ---------------------------------------------------------------------------
// Authentication helpers
// ---------------------------------------------------------------------------

fn extract_api_key(headers: &HeaderMap) -> Result<ApiKey, ApiError> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            json_error(
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "missing Authorization header",
            )
        })?;

    let token = value.strip_prefix("Bearer ").ok_or_else(|| {
        json_error(
            StatusCode::UNAUTHORIZED,
            "authentication_error",
            "expected a Bearer token",
        )
    })?;

    Ok(ApiKey::new(token))
}

fn authenticate<'a>(state: &'a AppState, headers: &HeaderMap) -> Result<&'a Profile, ApiError> {
    let key = extract_api_key(headers)?;
    state
        .registry
        .validate(&key)
        .map_err(|e| portal_error_to_response(e.into()))
}

/// Visibility rule shared by the read surfaces: admins see everything,
/// reporters see their own filings, officers see their department.
fn can_view(view: &AccessView, profile: &Profile, record: &GrievanceRecord) -> bool {
    if !view.is_active() {
        return false;
    }
    view.can_access_admin()
        || record.reporter == profile.id
        || (view.can_access_officer()
            && profile.department.as_ref() == Some(&record.department))
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

pub async fn submit_grievance(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    // 1. Authenticate and check filing rights
    let profile = authenticate(&state, &headers)?;
    let view = AccessView::from_profile(profile);
    if !view.can_file() {
        return Err(portal_error_to_response(
            AccessError::InactiveProfile {
                profile: profile.id.clone(),
            }
            .into(),
        ));
    }
    let reporter: ProfileId = profile.id.clone();

    // 2. Validate the draft
    let description = body.description.trim().to_owned();
    if description.is_empty() {
        return Err(json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "description must not be empty",
        ));
    }
    let draft = GrievanceDraft {
        description,
        location: body.location,
        photo_url: body.photo_url,
    };

    // 3. Classify (one outbound call, no retry)
    let outcome = state.classifier.classify(&draft.description).await;
    if let Err(e) = &outcome {
        tracing::warn!(reporter = %reporter, error = %e, "classification failed");
    }

    // 4. Intake decision
    match decide(draft, outcome, &state.directory) {
        IntakeDecision::Accepted(new) => {
            let store = Arc::clone(&state.store);
            let record = tokio::task::spawn_blocking(move || {
                store.insert_grievance(&reporter, &new)
            })
            .await
            .map_err(join_error)?
            .map_err(store_error)?;

            tracing::info!(
                id = %record.id,
                category = %record.category,
                department = %record.department,
                "grievance accepted"
            );

            let value = serde_json::to_value(&record).map_err(|e| {
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    format!("failed to serialize record: {e}"),
                )
            })?;
            Ok((StatusCode::CREATED, Json(value)))
        }
        IntakeDecision::Rejected { reason } => {
            tracing::info!(reporter = %reporter, "grievance rejected as irrelevant");
            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"decision": "rejected", "reason": reason})),
            ))
        }
        IntakeDecision::Unavailable => Err(json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "classifier_unavailable",
            "classification is unavailable; try again or submit without assistance",
        )),
    }
}

// ---------------------------------------------------------------------------
// Read surfaces
// ---------------------------------------------------------------------------

pub async fn list_grievances(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let profile = authenticate(&state, &headers)?;
    let view = AccessView::from_profile(profile);
    if !view.is_active() {
        return Err(portal_error_to_response(
            AccessError::InactiveProfile {
                profile: profile.id.clone(),
            }
            .into(),
        ));
    }

    let officer_department = view
        .can_access_officer()
        .then(|| profile.department.clone())
        .flatten();

    let store = Arc::clone(&state.store);
    let records = if view.can_access_admin() {
        tokio::task::spawn_blocking(move || store.list_all())
    } else if let Some(department) = officer_department {
        tokio::task::spawn_blocking(move || store.list_for_department(&department))
    } else {
        let reporter = profile.id.clone();
        tokio::task::spawn_blocking(move || store.list_for_reporter(&reporter))
    }
    .await
    .map_err(join_error)?
    .map_err(store_error)?;

    Ok(Json(json!({"grievances": records})))
}

pub async fn get_grievance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let profile = authenticate(&state, &headers)?;
    let view = AccessView::from_profile(profile);

    let record = fetch_record(&state, id).await?;
    if !can_view(&view, profile, &record) {
        // Invisible records read as absent rather than forbidden.
        return Err(json_error(StatusCode::NOT_FOUND, "not_found", "no such grievance"));
    }

    Ok(Json(json!(record)))
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let profile = authenticate(&state, &headers)?;
    let view = AccessView::from_profile(profile);

    let record = fetch_record(&state, id).await?;
    if !can_view(&view, profile, &record) {
        return Err(json_error(StatusCode::NOT_FOUND, "not_found", "no such grievance"));
    }

    let store = Arc::clone(&state.store);
    let history = tokio::task::spawn_blocking(move || store.history(&id))
        .await
        .map_err(join_error)?
        .map_err(store_error)?;

    Ok(Json(json!({"history": history})))
}

async fn fetch_record(state: &AppState, id: Uuid) -> Result<GrievanceRecord, ApiError> {
    let store = Arc::clone(&state.store);
    let record = tokio::task::spawn_blocking(move || store.get_grievance(&id))
        .await
        .map_err(join_error)?
        .map_err(store_error)?;
    record.ok_or_else(|| json_error(StatusCode::NOT_FOUND, "not_found", "no such grievance"))
}

// ---------------------------------------------------------------------------
// Status updates
// ---------------------------------------------------------------------------

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<Json<Value>, ApiError> {
    // 1. Authenticate
    let profile = authenticate(&state, &headers)?;
    let view = AccessView::from_profile(profile);

    // 2. Load the target and check department scope
    let record = fetch_record(&state, id).await?;
    if !view.can_update_grievance(&record.department) {
        return Err(portal_error_to_response(
            AccessError::DepartmentScope {
                profile: profile.id.clone(),
                department: record.department.clone(),
            }
            .into(),
        ));
    }

    // 3. Apply the transition; the store enforces the lifecycle
    let store = Arc::clone(&state.store);
    let updated = tokio::task::spawn_blocking(move || {
        store.record_transition(&id, body.status, body.note)
    })
    .await
    .map_err(join_error)?
    .map_err(store_error)?;

    tracing::info!(
        id = %updated.id,
        status = %updated.status,
        updated_by = %profile.id,
        "grievance status updated"
    );

    Ok(Json(json!(updated)))
}

// ---------------------------------------------------------------------------
// Liveness
// ---------------------------------------------------------------------------

pub async fn healthz() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
