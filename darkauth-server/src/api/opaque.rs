//! OPAQUE registration and login for the user cohort. Self-registration is
//! gated behind the `self_registration_enabled` setting; admin accounts are
//! never created through this surface (see `api::install` and
//! `api::admin::admins`).

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
};
use darkauth_types::{
    auth::{
        OpaqueLoginFinishRequest, OpaqueLoginStartRequest, OpaqueRegisterFinishRequest,
        OpaqueRegisterStartRequest, SessionCohort,
    },
    settings,
    user::NewUser,
};
use log::info;

use crate::{
    error::{ApiError, ApiResult},
    ops, queries, session,
    state::AppState,
};

/// POST /opaque/register/start
pub async fn register_start(
    State(state): State<AppState>,
    Json(req): Json<OpaqueRegisterStartRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /opaque/register/start");
    state.rate_limiter.check(&format!(
        "opaque_register:{}",
        req.email.as_deref().unwrap_or("unknown"),
    ))?;
    let enabled = queries::settings::get(&state.db_pool, settings::keys::SELF_REGISTRATION_ENABLED)
        .await?
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if !enabled {
        return Err(ApiError::Forbidden("self-registration is disabled".into()));
    }
    let response = ops::opaque::register_start(&state, &req).await?;
    Ok(Json(response))
}

/// POST /opaque/register/finish. Reserves the `users` row before handing
/// the upload to the OPAQUE engine, per the registration contract in
/// `ops::opaque::register_finish_user`.
pub async fn register_finish(
    State(state): State<AppState>,
    Json(req): Json<OpaqueRegisterFinishRequestWithIdentity>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /opaque/register/finish email={:?}", req.email);
    state.rate_limiter.check(&format!(
        "opaque_register:{}",
        req.email.as_deref().unwrap_or("unknown"),
    ))?;
    let enabled = queries::settings::get(&state.db_pool, settings::keys::SELF_REGISTRATION_ENABLED)
        .await?
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if !enabled {
        return Err(ApiError::Forbidden("self-registration is disabled".into()));
    }
    if let Some(email) = &req.email {
        if queries::users::get_by_email(&state.db_pool, email).await?.is_some() {
            return Err(ApiError::InvalidRequest("email already registered".into()));
        }
    }
    let user = ops::admin::create_user(
        &state,
        &NewUser {
            email: req.email.clone(),
            name: req.name.clone(),
        },
    )
    .await?;
    let finish = OpaqueRegisterFinishRequest {
        registration_id: req.registration_id,
        record: req.record,
    };
    let response = ops::opaque::register_finish_user(&state, &user.sub, &finish).await?;
    Ok(Json(response))
}

/// Body of `POST /opaque/register/finish`: the OPAQUE upload plus the
/// identity fields needed to reserve the `users` row it will be bound to.
#[derive(Clone, serde::Deserialize, Debug)]
pub struct OpaqueRegisterFinishRequestWithIdentity {
    pub email: Option<String>,
    pub name: Option<String>,
    pub registration_id: String,
    pub record: String,
}

/// POST /opaque/login/start
pub async fn login_start(
    State(state): State<AppState>,
    Json(req): Json<OpaqueLoginStartRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /opaque/login/start");
    let response = ops::opaque::login_start(&state, SessionCohort::User, &req).await?;
    Ok(Json(response))
}

/// POST /opaque/login/finish. On success, establishes a browser session and
/// sets the session cookie.
pub async fn login_finish(
    State(state): State<AppState>,
    Json(req): Json<OpaqueLoginFinishRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /opaque/login/finish");
    finish_and_start_session(&state, &req).await
}

/// POST /admin/opaque/login/start. Same engine and rate-limit bucket as the
/// user cohort, distinguished only by which table `login_start` looks the
/// identifier up in.
pub async fn admin_login_start(
    State(state): State<AppState>,
    Json(req): Json<OpaqueLoginStartRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /admin/opaque/login/start");
    let response = ops::opaque::login_start(&state, SessionCohort::Admin, &req).await?;
    Ok(Json(response))
}

/// POST /admin/opaque/login/finish
pub async fn admin_login_finish(
    State(state): State<AppState>,
    Json(req): Json<OpaqueLoginFinishRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /admin/opaque/login/finish");
    finish_and_start_session(&state, &req).await
}

async fn finish_and_start_session(
    state: &AppState,
    req: &OpaqueLoginFinishRequest,
) -> ApiResult<impl IntoResponse> {
    let outcome = ops::opaque::login_finish(state, req).await?;
    let (email, name) = match outcome.cohort {
        SessionCohort::User => {
            let user = queries::users::get(&state.db_pool, &outcome.sub).await?;
            (user.email, user.name)
        }
        SessionCohort::Admin => {
            let admin = queries::admins::get(&state.db_pool, &outcome.sub).await?;
            (admin.email, admin.name)
        }
    };
    let new_session = session::create(
        &state.db_pool,
        &state.config,
        outcome.cohort,
        &outcome.sub,
        email.as_deref(),
        name.as_deref(),
    )
    .await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::SET_COOKIE,
        session::set_cookie_header(&state.config, &new_session),
    );
    Ok((headers, Json(darkauth_types::auth::OpaqueLoginFinishResponse { sub: outcome.sub })))
}
