//! `/authorize` and `/authorize/finalize`: the browser-facing half of the
//! authorization-code grant. `start` is unauthenticated (it only stages a
//! pending request and redirects to the login UI); `finalize` requires the
//! caller to already hold a user session.

use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect},
};
use darkauth_types::auth::{
    AuthorizeFinalizeRequest, AuthorizeFinalizeResponse, AuthorizeQuery, SessionCohort,
};
use log::info;

use crate::{
    error::{ApiError, ApiResult},
    ops,
    state::AppState,
};

/// GET /authorize
pub async fn start(
    State(state): State<AppState>,
    Query(query): Query<AuthorizeQuery>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /authorize client_id={} redirect_uri={}", query.client_id, query.redirect_uri);
    let result = ops::authorize::start(&state, &query).await?;
    Ok(Redirect::to(&result.redirect_target))
}

/// POST /authorize/finalize
pub async fn finalize(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AuthorizeFinalizeRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /authorize/finalize request_id={}", req.request_id);
    let session =
        crate::session::load_from_headers(&state.db_pool, &state.config, &headers).await?;
    if session.cohort != SessionCohort::User.as_str() {
        return Err(ApiError::Unauthenticated(
            "authorize/finalize requires a user session".into(),
        ));
    }
    let result = ops::authorize::finalize(&state, &session, &req).await?;
    Ok(Json(AuthorizeFinalizeResponse {
        redirect_uri: result.redirect_uri,
    }))
}
