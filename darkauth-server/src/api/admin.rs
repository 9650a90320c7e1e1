//! Thin admin CRUD surface: users, admins, clients, settings, the audit
//! log, RBAC permission resolution, and signing-key rotation. Every
//! mutation requires an admin session with [`AdminRole::Write`]; plain
//! reads are reachable by any admin session.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
};
use darkauth_types::{
    client::NewClientRequest,
    user::{NewAdmin, NewUser},
};
use log::info;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::ApiResult,
    ops,
    principal::{Principal, Requirement, authorize},
    state::AppState,
};

async fn require(
    state: &AppState,
    headers: &HeaderMap,
    req: Requirement,
) -> ApiResult<Principal> {
    let principal = Principal::from_session_cookie(state, headers).await?;
    let key = match &principal {
        Principal::Admin { sub, .. } => format!("admin:{sub}"),
        Principal::User { sub } => format!("admin:{sub}"),
        Principal::Client { client_id, .. } => format!("admin:{client_id}"),
    };
    state.rate_limiter.check(&key)?;
    authorize(state, principal, req).await
}

/// GET /admin/users
pub async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    info!("GET /admin/users");
    require(&state, &headers, Requirement::AnyAdmin).await?;
    Ok(Json(ops::admin::list_users(&state).await?))
}

/// POST /admin/users
pub async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewUser>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /admin/users");
    require(&state, &headers, Requirement::AdminWrite).await?;
    Ok(Json(ops::admin::create_user(&state, &req).await?))
}

/// GET /admin/users/{sub}
pub async fn get_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(sub): Path<String>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /admin/users/{sub}");
    require(&state, &headers, Requirement::AnyAdmin).await?;
    Ok(Json(ops::admin::get_user(&state, &sub).await?))
}

/// DELETE /admin/users/{sub}
pub async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(sub): Path<String>,
) -> ApiResult<impl IntoResponse> {
    info!("DELETE /admin/users/{sub}");
    require(&state, &headers, Requirement::AdminWrite).await?;
    ops::admin::delete_user(&state, &sub).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct PermissionsQuery {
    organization_id: Option<Uuid>,
}

/// GET /admin/users/{sub}/permissions
pub async fn resolve_user_permissions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(sub): Path<String>,
    Query(query): Query<PermissionsQuery>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /admin/users/{sub}/permissions");
    require(&state, &headers, Requirement::AnyAdmin).await?;
    let resolved =
        ops::admin::resolve_user_permissions(&state, &sub, query.organization_id).await?;
    Ok(Json(resolved))
}

/// GET /admin/admins
pub async fn list_admins(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    info!("GET /admin/admins");
    require(&state, &headers, Requirement::AnyAdmin).await?;
    Ok(Json(ops::admin::list_admins(&state).await?))
}

/// POST /admin/admins
pub async fn create_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewAdmin>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /admin/admins");
    require(&state, &headers, Requirement::AdminWrite).await?;
    Ok(Json(ops::admin::create_admin(&state, &req).await?))
}

/// GET /admin/clients
pub async fn list_clients(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    info!("GET /admin/clients");
    require(&state, &headers, Requirement::AnyAdmin).await?;
    Ok(Json(ops::admin::list_clients(&state).await?))
}

/// POST /admin/clients
pub async fn create_client(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewClientRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /admin/clients client_id={}", req.client_id);
    require(&state, &headers, Requirement::AdminWrite).await?;
    Ok(Json(ops::admin::create_client(&state, &req).await?))
}

/// GET /admin/clients/{client_id}
pub async fn get_client(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(client_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /admin/clients/{client_id}");
    require(&state, &headers, Requirement::AnyAdmin).await?;
    Ok(Json(ops::admin::get_client(&state, &client_id).await?))
}

/// DELETE /admin/clients/{client_id}
pub async fn delete_client(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(client_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    info!("DELETE /admin/clients/{client_id}");
    require(&state, &headers, Requirement::AdminWrite).await?;
    ops::admin::delete_client(&state, &client_id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// GET /admin/settings
pub async fn list_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    info!("GET /admin/settings");
    require(&state, &headers, Requirement::AnyAdmin).await?;
    Ok(Json(ops::admin::list_settings(&state).await?))
}

#[derive(Deserialize, Debug)]
pub struct SettingBody {
    pub value: serde_json::Value,
}

/// PUT /admin/settings/{key}
pub async fn put_setting(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
    Json(body): Json<SettingBody>,
) -> ApiResult<impl IntoResponse> {
    info!("PUT /admin/settings/{key}");
    require(&state, &headers, Requirement::AdminWrite).await?;
    ops::admin::put_setting(&state, &key, &body.value).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct AuditQuery {
    limit: Option<i64>,
}

/// GET /admin/audit-log
pub async fn list_audit_log(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AuditQuery>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /admin/audit-log");
    require(&state, &headers, Requirement::AnyAdmin).await?;
    Ok(Json(ops::admin::list_audit_log(&state, query.limit.unwrap_or(100)).await?))
}

/// POST /admin/signing-keys/rotate
pub async fn rotate_signing_keys(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    info!("POST /admin/signing-keys/rotate");
    require(&state, &headers, Requirement::AdminWrite).await?;
    ops::admin::rotate_signing_keys(&state).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
