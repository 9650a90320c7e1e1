//! TOTP enrollment and verification for the caller's own session. Not part
//! of the core OIDC surface, but exposed so a client can actually drive the
//! second factor `ops::otp` implements.

use axum::{Json, extract::State, http::HeaderMap, response::IntoResponse};
use darkauth_types::{
    auth::Session,
    otp::{OtpRecoveryVerifyRequest, OtpVerifyRequest},
};
use log::info;

use crate::{error::ApiResult, ops, state::AppState};

async fn caller_session(state: &AppState, headers: &HeaderMap) -> ApiResult<Session> {
    crate::session::load_from_headers(&state.db_pool, &state.config, headers).await
}

/// POST /otp/enroll
pub async fn enroll(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    info!("POST /otp/enroll");
    let session = caller_session(&state, &headers).await?;
    let account = session.email.clone().unwrap_or_else(|| session.sub.clone());
    let response = ops::otp::enroll(&state, &session.sub, &account).await?;
    Ok(Json(response))
}

/// POST /otp/verify. On success, marks the caller's *browser session* (not
/// just the TOTP credential row) verified, so a subsequent
/// `/authorize/finalize` binds `otp` into the issued ID token's `amr`.
pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<OtpVerifyRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /otp/verify");
    let session = caller_session(&state, &headers).await?;
    state.rate_limiter.check(&format!("otp:{}", session.sub))?;
    let account = session.email.clone().unwrap_or_else(|| session.sub.clone());
    let ok = ops::otp::verify(&state, &session.sub, &account, &req.code).await?;
    if ok {
        crate::queries::sessions::mark_otp_verified(&state.db_pool, &session.id).await?;
    }
    Ok(Json(serde_json::json!({ "verified": ok })))
}

/// POST /otp/verify-recovery. Fallback path when the caller has lost their
/// TOTP device: redeems one single-use recovery code instead of a 6-digit
/// guess, same throttling as `/otp/verify`.
pub async fn verify_recovery(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<OtpRecoveryVerifyRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /otp/verify-recovery");
    let session = caller_session(&state, &headers).await?;
    state.rate_limiter.check(&format!("otp:{}", session.sub))?;
    let ok = ops::otp::verify_recovery_code(&state, &session.sub, &req.recovery_code).await?;
    if ok {
        crate::queries::sessions::mark_otp_verified(&state.db_pool, &session.id).await?;
    }
    Ok(Json(serde_json::json!({ "verified": ok })))
}
