//! OPAQUE registration and login flows, shared between the user and admin
//! cohorts. A login session persists the server's PAKE state between
//! `/login/start` and `/login/finish` since the two calls happen on
//! separate HTTP requests.

use darkauth_types::auth::{
    OpaqueLoginSession, OpaqueLoginStartRequest, OpaqueLoginStartResponse,
    OpaqueRegisterFinishRequest, OpaqueRegisterFinishResponse, OpaqueRegisterStartRequest,
    OpaqueRegisterStartResponse, SessionCohort, expires_at,
};
use time::Duration;

use crate::{codes, error::{ApiError, ApiResult}, queries, state::AppState};

pub async fn register_start(
    state: &AppState,
    req: &OpaqueRegisterStartRequest,
) -> ApiResult<OpaqueRegisterStartResponse> {
    let identifier = req
        .email
        .as_deref()
        .ok_or_else(|| ApiError::InvalidRequest("missing email".into()))?;
    let crypto = state.require_crypto().await?;
    let response = crypto.opaque.registration_start(identifier, &req.request)?;
    Ok(OpaqueRegisterStartResponse {
        registration_id: codes::new_registration_id(),
        response,
    })
}

/// Finalizes registration for a brand-new user. The caller is responsible
/// for having already reserved `sub` (e.g. by inserting the `users` row in
/// the same transaction as sign-up) so this only has to persist the
/// envelope.
pub async fn register_finish_user(
    state: &AppState,
    sub: &str,
    req: &OpaqueRegisterFinishRequest,
) -> ApiResult<OpaqueRegisterFinishResponse> {
    let crypto = state.require_crypto().await?;
    let envelope = crypto.opaque.registration_finish(&req.record)?;
    queries::opaque::put_record(&state.db_pool, sub, &envelope).await?;
    Ok(OpaqueRegisterFinishResponse { sub: sub.to_string() })
}

pub async fn login_start(
    state: &AppState,
    cohort: SessionCohort,
    req: &darkauth_types::auth::OpaqueLoginStartRequest,
) -> ApiResult<OpaqueLoginStartResponse> {
    login_start_impl(state, cohort, req).await
}

async fn login_start_impl(
    state: &AppState,
    cohort: SessionCohort,
    req: &darkauth_types::auth::OpaqueLoginStartRequest,
) -> ApiResult<OpaqueLoginStartResponse> {
    state.rate_limiter.check(&format!("login:{}", req.email))?;

    let sub = match cohort {
        SessionCohort::User => queries::users::get_by_email(&state.db_pool, &req.email)
            .await?
            .map(|u| u.sub),
        SessionCohort::Admin => queries::admins::get_by_email(&state.db_pool, &req.email)
            .await?
            .map(|a| a.sub),
    };
    let envelope = match &sub {
        Some(sub) => queries::opaque::get_envelope(&state.db_pool, sub).await?,
        None => None,
    };

    let crypto = state.require_crypto().await?;
    let (response, server_state) =
        crypto
            .opaque
            .login_start(&req.email, envelope.as_deref(), &req.request)?;

    let login_session_id = codes::new_login_session_id();
    let session = OpaqueLoginSession {
        id: login_session_id.clone(),
        server_state,
        identity_u_enc: crypto.kek.wrap(req.email.as_bytes())?,
        identity_s_enc: crypto.kek.wrap(sub.unwrap_or_default().as_bytes())?,
        cohort: cohort.as_str().to_string(),
        expires_at: expires_at(Duration::seconds(state.config.login_session_lifetime_seconds)),
    };
    queries::opaque::insert_login_session(&state.db_pool, &session).await?;

    Ok(OpaqueLoginStartResponse {
        login_session_id,
        response,
    })
}

pub struct LoginOutcome {
    pub sub: String,
    pub email: String,
    pub cohort: SessionCohort,
}

pub async fn login_finish(
    state: &AppState,
    req: &darkauth_types::auth::OpaqueLoginFinishRequest,
) -> ApiResult<LoginOutcome> {
    let session = queries::opaque::take_login_session(&state.db_pool, &req.login_session_id)
        .await?
        .ok_or_else(|| ApiError::AuthenticationFailed)?;

    if session.expires_at <= time::OffsetDateTime::now_utc() {
        return Err(ApiError::AuthenticationFailed);
    }

    let crypto = state.require_crypto().await?;
    let email = String::from_utf8(crypto.kek.unwrap(&session.identity_u_enc)?)
        .map_err(|_| ApiError::Internal("corrupt login session identity".into()))?;
    let sub = String::from_utf8(crypto.kek.unwrap(&session.identity_s_enc)?)
        .map_err(|_| ApiError::Internal("corrupt login session identity".into()))?;

    let rate_limit_key = format!("login:{email}");
    match crypto.opaque.login_finish(&session.server_state, &req.finish) {
        Ok(()) => {
            state.rate_limiter.reset(&rate_limit_key);
        }
        Err(e) => {
            crate::audit::record(
                &state.db_pool,
                darkauth_types::audit::events::LOGIN_FAILURE,
                None,
                Some(&session.cohort),
                Some(&email),
                None,
            )
            .await?;
            return Err(e);
        }
    }

    if sub.is_empty() {
        return Err(ApiError::AuthenticationFailed);
    }

    let cohort = if session.cohort == SessionCohort::Admin.as_str() {
        SessionCohort::Admin
    } else {
        SessionCohort::User
    };

    crate::audit::record(
        &state.db_pool,
        darkauth_types::audit::events::LOGIN_SUCCESS,
        Some(&sub),
        Some(&session.cohort),
        None,
        None,
    )
    .await?;

    Ok(LoginOutcome { sub, email, cohort })
}
