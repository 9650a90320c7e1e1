//! The four `/crypto/*` blobs (spec: "JSON base64url blobs, <=10 KiB; per-
//! user client-side key material; opaque to server"). This module never
//! parses a blob's contents -- only its size -- and the `*_enc_pub` pair's
//! visibility is gated by the `encryption_public_jwk_visible` setting
//! (§6's "follow the setting strictly": when the setting is `false`, even a
//! read of someone else's public key requires an authenticated caller).

use darkauth_types::{crypto::MAX_BLOB_BYTES, settings};

use crate::{error::{ApiError, ApiResult}, queries, state::AppState};

fn check_size(value: &serde_json::Value) -> ApiResult<()> {
    let size = serde_json::to_vec(value)
        .map_err(|e| ApiError::InvalidRequest(format!("unserializable blob: {e}")))?
        .len();
    if size > MAX_BLOB_BYTES {
        return Err(ApiError::Validation(format!(
            "blob is {size} bytes, exceeding the {MAX_BLOB_BYTES}-byte limit"
        )));
    }
    Ok(())
}

pub async fn get_wrapped_drk(state: &AppState, user_sub: &str) -> ApiResult<serde_json::Value> {
    queries::crypto::get_wrapped_drk(&state.db_pool, user_sub)
        .await?
        .ok_or(ApiError::NotFound)
}

pub async fn put_wrapped_drk(
    state: &AppState,
    user_sub: &str,
    value: serde_json::Value,
) -> ApiResult<()> {
    check_size(&value)?;
    queries::crypto::put_wrapped_drk(&state.db_pool, user_sub, &value).await
}

pub async fn get_wrapped_enc_priv(state: &AppState, user_sub: &str) -> ApiResult<serde_json::Value> {
    queries::crypto::get_wrapped_enc_priv(&state.db_pool, user_sub)
        .await?
        .ok_or(ApiError::NotFound)
}

pub async fn put_wrapped_enc_priv(
    state: &AppState,
    user_sub: &str,
    value: serde_json::Value,
) -> ApiResult<()> {
    check_size(&value)?;
    queries::crypto::put_wrapped_enc_priv(&state.db_pool, user_sub, &value).await
}

/// The caller's own public encryption JWK. Always readable/writable by the
/// owning user regardless of the visibility setting -- that setting only
/// governs looking up *someone else's* key via `user-enc-pub`.
pub async fn get_enc_pub(state: &AppState, user_sub: &str) -> ApiResult<serde_json::Value> {
    queries::crypto::get_enc_pub(&state.db_pool, user_sub)
        .await?
        .ok_or(ApiError::NotFound)
}

pub async fn put_enc_pub(
    state: &AppState,
    user_sub: &str,
    value: serde_json::Value,
) -> ApiResult<()> {
    check_size(&value)?;
    queries::crypto::put_enc_pub(&state.db_pool, user_sub, &value).await
}

/// Looks up another user's public encryption JWK. Gated by
/// `encryption_public_jwk_visible`: when visible, any caller (including
/// unauthenticated) may read it; when not, the caller must already be
/// authenticated. Authentication itself is enforced by the HTTP layer
/// before this is reached -- this only decides whether to allow the
/// unauthenticated path.
pub async fn get_user_enc_pub(
    state: &AppState,
    target_sub: &str,
    caller_authenticated: bool,
) -> ApiResult<serde_json::Value> {
    let visible = queries::settings::get(
        &state.db_pool,
        settings::keys::ENCRYPTION_PUBLIC_JWK_VISIBLE,
    )
    .await?
    .and_then(|v| v.as_bool())
    .unwrap_or(false);
    if !visible && !caller_authenticated {
        return Err(ApiError::Unauthenticated(
            "encryption public keys are not visible to unauthenticated callers".into(),
        ));
    }
    queries::crypto::get_enc_pub(&state.db_pool, target_sub)
        .await?
        .ok_or(ApiError::NotFound)
}
