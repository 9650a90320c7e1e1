//! The `/authorize` + `/authorize/finalize` pair. Nothing here ever touches
//! a password or a DRK: `start` stages a pending request (and, if Zero-
//! Knowledge delivery is in play, the fingerprint of the client's ephemeral
//! P-256 key); `finalize` binds it to the session the caller authenticated
//! with, mints a one-time authorization code, and deletes the pending row.

use darkauth_types::auth::{
    AuthorizationCode, AuthorizeFinalizeRequest, AuthorizeQuery, PendingAuthorization, Session,
    ZkPublicJwk, expires_at,
};
use time::{Duration, OffsetDateTime};

use crate::{
    codes,
    error::{ApiError, ApiResult},
    queries, state::AppState, zk,
};

pub struct AuthorizeStart {
    pub request_id: String,
    pub redirect_target: String,
}

pub async fn start(state: &AppState, query: &AuthorizeQuery) -> ApiResult<AuthorizeStart> {
    if query.response_type != "code" {
        return Err(ApiError::InvalidRequest(
            "response_type must be `code`".into(),
        ));
    }
    let client = queries::clients::get(&state.db_pool, &query.client_id)
        .await
        .map_err(|_| ApiError::InvalidClient("unknown client_id".into()))?;
    if !client.allows_redirect_uri(&query.redirect_uri) {
        return Err(ApiError::InvalidRequest(
            "redirect_uri is not registered for this client".into(),
        ));
    }
    if !client.supports_grant("authorization_code") {
        return Err(ApiError::UnauthorizedClient(
            "client is not authorized for the authorization_code grant".into(),
        ));
    }

    let code_challenge_method = query
        .code_challenge
        .as_ref()
        .map(|_| query.code_challenge_method.as_deref().unwrap_or("S256"));
    if let Some(method) = code_challenge_method {
        if method != "S256" && method != "plain" {
            return Err(ApiError::InvalidRequest(format!(
                "unsupported code_challenge_method `{method}`"
            )));
        }
    } else if client.require_pkce {
        return Err(ApiError::InvalidRequest(
            "PKCE is required for this client".into(),
        ));
    }

    let (zk_pub_kid, zk_pub_raw) = match &query.zk_pub {
        Some(raw) => {
            let jwk: ZkPublicJwk = serde_json::from_str(raw)
                .map_err(|e| ApiError::InvalidRequest(format!("malformed zk_pub: {e}")))?;
            let kid = zk::validate_and_fingerprint(&jwk)?;
            (Some(kid), Some(raw.clone()))
        }
        None => {
            if client.zk_required {
                return Err(ApiError::InvalidRequest(
                    "zk_pub is required for this client".into(),
                ));
            }
            (None, None)
        }
    };

    let request_id = codes::new_request_id();
    let pending = PendingAuthorization {
        request_id: request_id.clone(),
        client_id: client.client_id.clone(),
        redirect_uri: query.redirect_uri.clone(),
        state: query.state.clone(),
        code_challenge: query.code_challenge.clone(),
        code_challenge_method: code_challenge_method.map(str::to_string),
        nonce: query.nonce.clone(),
        zk_pub_kid,
        zk_pub_raw,
        user_sub: None,
        origin: None,
        expires_at: expires_at(Duration::minutes(5)),
    };
    queries::pending_auth::insert(&state.db_pool, &pending).await?;

    let redirect_target = format!(
        "{}?request_id={request_id}",
        state.config.ui_login_url.trim_end_matches('/')
    );
    Ok(AuthorizeStart {
        request_id,
        redirect_target,
    })
}

pub struct AuthorizeFinalize {
    pub redirect_uri: String,
}

pub async fn finalize(
    state: &AppState,
    session: &Session,
    req: &AuthorizeFinalizeRequest,
) -> ApiResult<AuthorizeFinalize> {
    let pending = queries::pending_auth::consume(&state.db_pool, &req.request_id)
        .await?
        .ok_or_else(|| ApiError::InvalidRequest("unknown or already used request_id".into()))?;

    if pending.expires_at <= OffsetDateTime::now_utc() {
        return Err(ApiError::InvalidRequest("authorization request expired".into()));
    }

    let has_zk = pending.zk_pub_kid.is_some();
    if has_zk && req.drk_hash.is_none() {
        return Err(ApiError::InvalidRequest(
            "drk_hash is required to finalize a Zero-Knowledge authorization".into(),
        ));
    }

    let code = AuthorizationCode {
        code: codes::new_authorization_code(),
        client_id: pending.client_id.clone(),
        sub: session.sub.clone(),
        redirect_uri: pending.redirect_uri.clone(),
        code_challenge: pending.code_challenge.clone(),
        code_challenge_method: pending.code_challenge_method.clone(),
        nonce: pending.nonce.clone(),
        has_zk,
        zk_pub_kid: pending.zk_pub_kid.clone(),
        drk_hash: req.drk_hash.clone(),
        organization_id: session.organization_id,
        otp_verified: session.otp_verified,
        consumed: false,
        expires_at: expires_at(Duration::seconds(60)),
    };
    queries::auth_codes::insert(&state.db_pool, &code).await?;

    let mut redirect_uri = format!("{}?code={}", pending.redirect_uri, code.code);
    if let Some(state_param) = &pending.state {
        redirect_uri.push_str("&state=");
        redirect_uri.push_str(state_param);
    }

    Ok(AuthorizeFinalize { redirect_uri })
}
