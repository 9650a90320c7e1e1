//! `/crypto/*`: per-user client-side key material blobs. All four owned
//! blobs require the caller's own user session; `user-enc-pub/{sub}` is the
//! one read that may be reachable without one, gated by the
//! `encryption_public_jwk_visible` setting.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
};
use darkauth_types::crypto::{CryptoBlobRequest, CryptoBlobResponse};
use log::info;

use crate::{
    error::ApiResult,
    ops,
    principal::Principal,
    state::AppState,
};

async fn caller_sub(state: &AppState, headers: &HeaderMap) -> ApiResult<String> {
    match Principal::from_session_cookie(state, headers).await? {
        Principal::User { sub } | Principal::Admin { sub, .. } => Ok(sub),
        Principal::Client { client_id, .. } => Ok(client_id),
    }
}

pub async fn get_wrapped_drk(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    info!("GET /crypto/wrapped-drk");
    let sub = caller_sub(&state, &headers).await?;
    let value = ops::crypto::get_wrapped_drk(&state, &sub).await?;
    Ok(Json(CryptoBlobResponse { value }))
}

pub async fn put_wrapped_drk(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CryptoBlobRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("PUT /crypto/wrapped-drk");
    let sub = caller_sub(&state, &headers).await?;
    ops::crypto::put_wrapped_drk(&state, &sub, req.value).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

pub async fn get_wrapped_enc_priv(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    info!("GET /crypto/wrapped-enc-priv");
    let sub = caller_sub(&state, &headers).await?;
    let value = ops::crypto::get_wrapped_enc_priv(&state, &sub).await?;
    Ok(Json(CryptoBlobResponse { value }))
}

pub async fn put_wrapped_enc_priv(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CryptoBlobRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("PUT /crypto/wrapped-enc-priv");
    let sub = caller_sub(&state, &headers).await?;
    ops::crypto::put_wrapped_enc_priv(&state, &sub, req.value).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

pub async fn get_enc_pub(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    info!("GET /crypto/enc-pub");
    let sub = caller_sub(&state, &headers).await?;
    let value = ops::crypto::get_enc_pub(&state, &sub).await?;
    Ok(Json(CryptoBlobResponse { value }))
}

pub async fn put_enc_pub(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CryptoBlobRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("PUT /crypto/enc-pub");
    let sub = caller_sub(&state, &headers).await?;
    ops::crypto::put_enc_pub(&state, &sub, req.value).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

pub async fn get_user_enc_pub(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(target_sub): Path<String>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /crypto/user-enc-pub/{target_sub}");
    let authenticated = Principal::from_session_cookie(&state, &headers).await.is_ok();
    let value = ops::crypto::get_user_enc_pub(&state, &target_sub, authenticated).await?;
    Ok(Json(CryptoBlobResponse { value }))
}
