use axum::{
    Json,
    extract::{Form, State},
    http::HeaderMap,
    response::IntoResponse,
};
use darkauth_types::auth::LogoutRequest;
use log::info;

use crate::{error::ApiResult, ops, session, state::AppState};

/// POST /logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(req): Form<LogoutRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /logout");
    let current = session::load_from_headers(&state.db_pool, &state.config, &headers).await?;
    let redirect = ops::logout::logout(&state, &current, &req).await?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        axum::http::header::SET_COOKIE,
        session::clear_cookie_header(&state.config),
    );
    Ok((response_headers, Json(serde_json::json!({ "redirect_uri": redirect }))))
}
