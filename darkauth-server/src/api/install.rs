//! First-run installation surface. Every endpoint but `/install/status`
//! first checks `installed` and then validates the caller's install token,
//! so a server that finished installing answers `already_initialized`
//! everywhere else in this module (testable property 8).

use axum::{Json, extract::State, response::IntoResponse};
use darkauth_types::{
    auth::OpaqueRegisterFinishRequest,
    install::{
        InstallBootstrapRequest, InstallFinalizeRequest, InstallRegisterFinishRequest,
        InstallRegisterStartRequest, InstallStartRequest, InstallStartResponse,
        InstallStatusResponse,
    },
    user::{AdminRole, NewAdmin},
};
use log::info;
use time::Duration;

use crate::{
    error::{ApiError, ApiResult},
    install::{self, BootstrapRequest, InstallToken},
    ops, queries,
    state::AppState,
};

async fn require_uninstalled(state: &AppState) -> ApiResult<()> {
    state.rate_limiter.check("install")?;
    if install::is_installed(&state.db_pool).await? {
        return Err(ApiError::AlreadyInstalled);
    }
    Ok(())
}

async fn verify_token(state: &AppState, provided: &str) -> ApiResult<()> {
    let guard = state.install_token.read().await;
    let token = guard
        .as_ref()
        .ok_or_else(|| ApiError::InvalidRequest("no install in progress".into()))?;
    token.verify(provided)
}

/// GET /install/status
pub async fn status(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    info!("GET /install/status");
    let installed = install::is_installed(&state.db_pool).await?;
    Ok(Json(InstallStatusResponse { installed }))
}

/// POST /install/start
pub async fn start(
    State(state): State<AppState>,
    Json(_req): Json<InstallStartRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /install/start");
    require_uninstalled(&state).await?;
    let lifetime = Duration::seconds(state.config.install_token_lifetime_seconds);
    let token = InstallToken::new(lifetime);
    let response = InstallStartResponse {
        install_token: token.token.clone(),
        expires_in: state.config.install_token_lifetime_seconds,
    };
    *state.install_token.write().await = Some(token);
    Ok(Json(response))
}

/// POST /install/bootstrap
pub async fn bootstrap(
    State(state): State<AppState>,
    Json(req): Json<InstallBootstrapRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /install/bootstrap");
    require_uninstalled(&state).await?;
    verify_token(&state, &req.install_token).await?;

    let crypto = install::bootstrap(
        &state.db_pool,
        &BootstrapRequest {
            passphrase: req.passphrase,
            issuer: req.issuer,
        },
    )
    .await?;
    *state.crypto.write().await = Some(crypto);
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// POST /install/register/start. Begins the first admin's OPAQUE
/// registration against the engine `/install/bootstrap` just produced.
pub async fn register_start(
    State(state): State<AppState>,
    Json(req): Json<InstallRegisterStartRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /install/register/start email={}", req.email);
    require_uninstalled(&state).await?;
    verify_token(&state, &req.install_token).await?;

    let response = ops::opaque::register_start(
        &state,
        &darkauth_types::auth::OpaqueRegisterStartRequest {
            email: Some(req.email),
            name: None,
            request: req.request,
        },
    )
    .await?;
    Ok(Json(darkauth_types::install::InstallRegisterStartResponse {
        registration_id: response.registration_id,
        response: response.response,
    }))
}

/// POST /install/register/finish. Reserves the `admins` row, then finishes
/// the OPAQUE upload against it.
pub async fn register_finish(
    State(state): State<AppState>,
    Json(req): Json<InstallRegisterFinishRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /install/register/finish email={}", req.email);
    require_uninstalled(&state).await?;
    verify_token(&state, &req.install_token).await?;

    if queries::admins::get_by_email(&state.db_pool, &req.email).await?.is_some() {
        return Err(ApiError::InvalidRequest("admin already registered".into()));
    }
    let admin = ops::admin::create_admin(
        &state,
        &NewAdmin {
            email: Some(req.email.clone()),
            name: req.name.clone(),
            admin_role: AdminRole::Write,
        },
    )
    .await?;

    let finish = OpaqueRegisterFinishRequest {
        registration_id: req.registration_id,
        record: req.record,
    };
    let response = ops::opaque::register_finish_user(&state, &admin.sub, &finish).await?;
    Ok(Json(response))
}

/// POST /install/finalize. The only endpoint that flips `installed`; after
/// it succeeds, every other handler in this module fails closed via
/// `require_uninstalled`.
pub async fn finalize(
    State(state): State<AppState>,
    Json(req): Json<InstallFinalizeRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /install/finalize");
    require_uninstalled(&state).await?;
    verify_token(&state, &req.install_token).await?;

    if ops::admin::admin_count(&state).await? == 0 {
        return Err(ApiError::InvalidRequest(
            "cannot finalize installation with no registered admin".into(),
        ));
    }

    install::finalize(&state.db_pool, &req.admin_email).await?;
    *state.install_token.write().await = None;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
