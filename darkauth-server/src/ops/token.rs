//! The `/token` endpoint's three-grant state machine: `authorization_code`
//! (with PKCE and optional ZK-DRK hash echo), `refresh_token` (atomic
//! one-winner rotation), and `client_credentials` (machine-to-machine,
//! no user in the loop).

use darkauth_types::{
    auth::{
        ClientAccessClaims, IdTokenClaims, RefreshTokenRecord, TokenRequest, TokenResponse,
        expires_at, random_token_b64,
    },
    client::ClientType,
};
use jsonwebtoken::{Algorithm, Header};
use time::{Duration, OffsetDateTime};

use crate::{
    codes, error::{ApiError, ApiResult}, kek::constant_time_eq, queries, rbac, state::AppState,
};

pub async fn handle(state: &AppState, req: &TokenRequest) -> ApiResult<TokenResponse> {
    let rate_limit_key = format!(
        "token:{}",
        req.client_id.as_deref().unwrap_or("unknown"),
    );
    state.rate_limiter.check(&rate_limit_key)?;

    match req.grant_type.as_str() {
        "authorization_code" => authorization_code(state, req).await,
        "refresh_token" => refresh_token(state, req).await,
        "client_credentials" => client_credentials(state, req).await,
        other => Err(ApiError::InvalidGrant(format!("unsupported grant_type `{other}`"))),
    }
}

async fn authorization_code(state: &AppState, req: &TokenRequest) -> ApiResult<TokenResponse> {
    let client_id = req
        .client_id
        .clone()
        .ok_or_else(|| ApiError::InvalidRequest("missing client_id".into()))?;
    let code = req
        .code
        .clone()
        .ok_or_else(|| ApiError::InvalidRequest("missing code".into()))?;
    let redirect_uri = req
        .redirect_uri
        .clone()
        .ok_or_else(|| ApiError::InvalidRequest("missing redirect_uri".into()))?;

    let client = queries::clients::get(&state.db_pool, &client_id).await?;
    if !client.supports_grant("authorization_code") {
        return Err(ApiError::InvalidGrant("client is not authorized for this grant".into()));
    }
    verify_client_secret_if_confidential(state, &client, req.client_secret.as_deref()).await?;

    // Validate every property of the code read-only first. A wrong
    // `redirect_uri`/`client_id`/PKCE verifier must leave the code
    // unconsumed so the legitimate client can still retry with the
    // correct parameters; only the final atomic `consume` below may burn
    // it, and that is the sole step allowed to race.
    let found = queries::auth_codes::lookup(&state.db_pool, &code)
        .await?
        .ok_or_else(|| ApiError::InvalidGrant("authorization code is invalid or already used".into()))?;

    if found.consumed {
        return Err(ApiError::InvalidGrant("authorization code is invalid or already used".into()));
    }
    if found.expires_at <= OffsetDateTime::now_utc() {
        return Err(ApiError::InvalidGrant("authorization code has expired".into()));
    }
    if found.client_id != client_id {
        return Err(ApiError::InvalidGrant("authorization code was not issued to this client".into()));
    }
    if found.redirect_uri != redirect_uri {
        return Err(ApiError::InvalidGrant("redirect_uri does not match the authorization request".into()));
    }
    if let Some(challenge) = &found.code_challenge {
        let verifier = req
            .code_verifier
            .as_deref()
            .ok_or_else(|| ApiError::InvalidGrant("missing code_verifier".into()))?;
        let method = found.code_challenge_method.as_deref().unwrap_or("plain");
        codes::verify_pkce(challenge, method, verifier)?;
    } else if client.require_pkce {
        return Err(ApiError::InvalidGrant("PKCE is required for this client".into()));
    }

    // Only now, with every field validated, attempt the single-winner
    // consume. Losing this race (another request consumed it first) is
    // `invalid_grant`, identical to the not-found case.
    let consumed = queries::auth_codes::consume(&state.db_pool, &code)
        .await?
        .ok_or_else(|| ApiError::InvalidGrant("authorization code is invalid or already used".into()))?;

    let user = queries::users::get(&state.db_pool, &consumed.sub).await?;
    let resolved = rbac::resolve(&state.db_pool, &consumed.sub, consumed.organization_id).await?;
    let org_slug = org_slug_for(&state.db_pool, consumed.organization_id).await?;

    let lifetime = Duration::seconds(
        client
            .id_token_lifetime_seconds
            .unwrap_or(state.config.id_token_lifetime_seconds),
    );
    let now = OffsetDateTime::now_utc();
    let (amr, acr) = amr_and_acr(consumed.otp_verified);
    let id_claims = IdTokenClaims {
        iss: state.config.issuer.clone(),
        sub: consumed.sub.clone(),
        aud: client_id.clone(),
        iat: now.unix_timestamp(),
        exp: (now + lifetime).unix_timestamp(),
        email: user.email.clone(),
        email_verified: user.email.as_ref().map(|_| true),
        name: user.name.clone(),
        org_id: consumed.organization_id.map(|id| id.to_string()),
        org_slug,
        roles: resolved.roles,
        permissions: resolved.permissions,
        nonce: consumed.nonce.clone(),
        acr,
        amr,
    };

    let crypto = state.require_crypto().await?;
    let signing_keys = crypto.signing.read().await;
    let id_token = jsonwebtoken::encode(
        &eddsa_header(&signing_keys.primary.kid),
        &id_claims,
        &signing_keys.primary.encoding_key,
    )?;
    drop(signing_keys);

    let refresh_lifetime = Duration::seconds(state.config.refresh_token_lifetime_seconds);
    let refresh_record = RefreshTokenRecord {
        refresh_token: random_token_b64(32),
        client_id: client_id.clone(),
        sub: consumed.sub.clone(),
        scope: "openid".into(),
        organization_id: consumed.organization_id,
        revoked: false,
        otp_verified: consumed.otp_verified,
        expires_at: expires_at(refresh_lifetime),
        created_at: now,
    };
    queries::refresh_tokens::insert(&state.db_pool, &refresh_record).await?;

    crate::audit::record(
        &state.db_pool,
        darkauth_types::audit::events::TOKEN_ISSUED,
        Some(&consumed.sub),
        Some("user"),
        Some(&client_id),
        None,
    )
    .await?;

    Ok(TokenResponse {
        id_token: Some(id_token),
        access_token: None,
        token_type: "Bearer".into(),
        expires_in: lifetime.whole_seconds(),
        refresh_token: Some(refresh_record.refresh_token),
        scope: Some("openid".into()),
        zk_drk_hash: consumed.has_zk.then_some(consumed.drk_hash).flatten(),
    })
}

async fn refresh_token(state: &AppState, req: &TokenRequest) -> ApiResult<TokenResponse> {
    let old_token = req
        .refresh_token
        .clone()
        .ok_or_else(|| ApiError::InvalidRequest("missing refresh_token".into()))?;

    // Look up read-only first: authenticate the caller and check the
    // `client_id` binding before touching the row. Rotating first and
    // rejecting after would burn the legitimate refresh token on every
    // wrong-client request (spec.md §4.7.2 step 1, scenario S4).
    let found = queries::refresh_tokens::lookup(&state.db_pool, &old_token)
        .await?
        .ok_or_else(|| ApiError::InvalidGrant("refresh token is invalid, expired, or already used".into()))?;
    if found.revoked || found.expires_at <= OffsetDateTime::now_utc() {
        return Err(ApiError::InvalidGrant("refresh token is invalid, expired, or already used".into()));
    }

    let client_id = req
        .client_id
        .clone()
        .ok_or_else(|| ApiError::InvalidRequest("missing client_id".into()))?;
    if client_id != found.client_id {
        return Err(ApiError::InvalidGrant("refresh token was not issued to this client".into()));
    }
    let client = queries::clients::get(&state.db_pool, &client_id).await?;
    verify_client_secret_if_confidential(state, &client, req.client_secret.as_deref()).await?;

    let refresh_lifetime = Duration::seconds(state.config.refresh_token_lifetime_seconds);
    let new_token = random_token_b64(32);
    let new_expires_at = expires_at(refresh_lifetime);

    // Only now, authenticated and client-checked, attempt the single-winner
    // rotation. Losing this race (another request rotated it first) is
    // `invalid_grant`, identical to the not-found case.
    let old = queries::refresh_tokens::rotate(&state.db_pool, &old_token, &new_token, new_expires_at)
        .await?
        .ok_or_else(|| ApiError::InvalidGrant("refresh token is invalid, expired, or already used".into()))?;

    let user = queries::users::get(&state.db_pool, &old.sub).await?;
    let resolved = rbac::resolve(&state.db_pool, &old.sub, old.organization_id).await?;
    let org_slug = org_slug_for(&state.db_pool, old.organization_id).await?;

    let lifetime = Duration::seconds(
        client
            .id_token_lifetime_seconds
            .unwrap_or(state.config.id_token_lifetime_seconds),
    );
    let now = OffsetDateTime::now_utc();
    let (amr, acr) = amr_and_acr(old.otp_verified);
    let id_claims = IdTokenClaims {
        iss: state.config.issuer.clone(),
        sub: old.sub.clone(),
        aud: old.client_id.clone(),
        iat: now.unix_timestamp(),
        exp: (now + lifetime).unix_timestamp(),
        email: user.email.clone(),
        email_verified: user.email.as_ref().map(|_| true),
        name: user.name.clone(),
        org_id: old.organization_id.map(|id| id.to_string()),
        org_slug,
        roles: resolved.roles,
        permissions: resolved.permissions,
        nonce: None,
        acr,
        amr,
    };

    let crypto = state.require_crypto().await?;
    let signing_keys = crypto.signing.read().await;
    let id_token = jsonwebtoken::encode(
        &eddsa_header(&signing_keys.primary.kid),
        &id_claims,
        &signing_keys.primary.encoding_key,
    )?;
    drop(signing_keys);

    crate::audit::record(
        &state.db_pool,
        darkauth_types::audit::events::TOKEN_REFRESHED,
        Some(&old.sub),
        Some("user"),
        Some(&old.client_id),
        None,
    )
    .await?;

    Ok(TokenResponse {
        id_token: Some(id_token),
        access_token: None,
        token_type: "Bearer".into(),
        expires_in: lifetime.whole_seconds(),
        refresh_token: Some(new_token),
        scope: Some(old.scope),
        zk_drk_hash: None,
    })
}

async fn client_credentials(state: &AppState, req: &TokenRequest) -> ApiResult<TokenResponse> {
    let client_id = req
        .client_id
        .clone()
        .ok_or_else(|| ApiError::InvalidRequest("missing client_id".into()))?;
    let client = queries::clients::get(&state.db_pool, &client_id).await?;

    if client.client_type != ClientType::Confidential {
        return Err(ApiError::InvalidGrant("public clients cannot use client_credentials".into()));
    }
    if !client.supports_grant("client_credentials") {
        return Err(ApiError::InvalidGrant("client is not authorized for this grant".into()));
    }
    verify_client_secret_if_confidential(state, &client, req.client_secret.as_deref()).await?;

    let requested_scope = req.scope.clone().unwrap_or_else(|| client.scopes.join(" "));
    let allowed = client.scope_set();
    for scope in requested_scope.split(' ').filter(|s| !s.is_empty()) {
        if !allowed.contains(scope) {
            return Err(ApiError::InvalidGrant(format!("scope `{scope}` is not granted to this client")));
        }
    }

    let now = OffsetDateTime::now_utc();
    let lifetime = Duration::seconds(state.config.access_token_lifetime_seconds);
    let claims = ClientAccessClaims {
        iss: state.config.issuer.clone(),
        sub: client_id.clone(),
        aud: state.config.issuer.clone(),
        azp: client_id.clone(),
        iat: now.unix_timestamp(),
        exp: (now + lifetime).unix_timestamp(),
        scope: requested_scope.clone(),
        permissions: requested_scope
            .split(' ')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        grant_type: "client_credentials".into(),
        token_use: "access_token".into(),
    };

    let crypto = state.require_crypto().await?;
    let signing_keys = crypto.signing.read().await;
    let access_token = jsonwebtoken::encode(
        &eddsa_header(&signing_keys.primary.kid),
        &claims,
        &signing_keys.primary.encoding_key,
    )?;
    drop(signing_keys);

    crate::audit::record(
        &state.db_pool,
        darkauth_types::audit::events::TOKEN_ISSUED,
        None,
        None,
        Some(&client_id),
        None,
    )
    .await?;

    Ok(TokenResponse {
        id_token: None,
        access_token: Some(access_token),
        token_type: "Bearer".into(),
        expires_in: lifetime.whole_seconds(),
        refresh_token: None,
        scope: Some(requested_scope),
        zk_drk_hash: None,
    })
}

async fn verify_client_secret_if_confidential(
    state: &AppState,
    client: &darkauth_types::client::Client,
    provided: Option<&str>,
) -> ApiResult<()> {
    if client.client_type != ClientType::Confidential {
        return Ok(());
    }
    let provided = provided.ok_or_else(|| ApiError::InvalidClient("missing client_secret".into()))?;
    let wrapped = client
        .client_secret_enc
        .as_ref()
        .ok_or_else(|| ApiError::Internal("confidential client has no stored secret".into()))?;
    let crypto = state.require_crypto().await?;
    let expected = crypto.kek.unwrap(wrapped)?;
    if !constant_time_eq(provided.as_bytes(), &expected) {
        return Err(ApiError::InvalidClient("invalid client_secret".into()));
    }
    Ok(())
}

/// Builds the `amr`/`acr` pair per spec §4.7.4: every issued ID token
/// records `"pwd"` (OPAQUE always ran), plus `"otp"` and `acr="mfa"` when
/// the session that produced the bound code or refresh token also cleared
/// a TOTP check.
fn amr_and_acr(otp_verified: bool) -> (Vec<String>, Option<String>) {
    if otp_verified {
        (vec!["pwd".into(), "otp".into()], Some("mfa".into()))
    } else {
        (vec!["pwd".into()], None)
    }
}

/// Resolves the `org_slug` claim from an authorization code's or refresh
/// token's bound `organization_id`, so the token endpoint only ever hits the
/// database for it when a caller actually has an organization context.
async fn org_slug_for(
    pool: &crate::db::DbPool,
    organization_id: Option<uuid::Uuid>,
) -> ApiResult<Option<String>> {
    match organization_id {
        Some(id) => Ok(Some(queries::organizations::get(pool, id).await?.slug)),
        None => Ok(None),
    }
}

fn eddsa_header(kid: &str) -> Header {
    let mut header = Header::new(Algorithm::EdDSA);
    header.kid = Some(kid.to_string());
    header
}
