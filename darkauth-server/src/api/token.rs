//! `POST /token`. Confidential clients may authenticate either by putting
//! `client_id`/`client_secret` in the form body or via HTTP Basic -- the
//! latter is decoded here and folded into the same `TokenRequest` the `ops`
//! layer already knows how to validate, so `ops::token` never has to care
//! which transport carried the credential.

use axum::{
    Json,
    extract::{Form, State},
    http::HeaderMap,
};
use base64::Engine as _;
use darkauth_types::auth::TokenRequest;
use log::info;

use crate::{error::ApiResult, ops, state::AppState};

pub async fn token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(mut req): Form<TokenRequest>,
) -> ApiResult<Json<darkauth_types::auth::TokenResponse>> {
    info!("POST /token grant_type={}", req.grant_type);

    if req.client_id.is_none() || req.client_secret.is_none() {
        if let Some((client_id, client_secret)) = basic_auth_credentials(&headers) {
            req.client_id.get_or_insert(client_id);
            req.client_secret.get_or_insert(client_secret);
        }
    }

    let response = ops::token::handle(&state, &req).await?;
    Ok(Json(response))
}

fn basic_auth_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let raw = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = raw.strip_prefix("Basic ")?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (user, pass) = text.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}
