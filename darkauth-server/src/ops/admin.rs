//! Thin admin CRUD over users, admins, clients, settings, and the audit
//! log -- enough surface to exercise the RBAC resolver and the settings bus
//! from the admin side, not a full operator console.

use darkauth_types::{
    audit::AuditLogEntry,
    auth::random_token_b64,
    client::{Client, ClientType, NewClientRequest},
    rbac::ResolvedPermissions,
    settings::Setting,
    user::{Admin, NewAdmin, NewUser, User},
};

use crate::{error::ApiResult, queries, rbac, state::AppState};

pub async fn create_user(state: &AppState, req: &NewUser) -> ApiResult<User> {
    let sub = random_token_b64(16);
    let user = queries::users::insert(&state.db_pool, &sub, req).await?;
    crate::audit::record(
        &state.db_pool,
        darkauth_types::audit::events::USER_CREATED,
        None,
        None,
        Some(&sub),
        None,
    )
    .await?;
    Ok(user)
}

pub async fn list_users(state: &AppState) -> ApiResult<Vec<User>> {
    queries::users::list(&state.db_pool).await
}

pub async fn get_user(state: &AppState, sub: &str) -> ApiResult<User> {
    queries::users::get(&state.db_pool, sub).await
}

pub async fn delete_user(state: &AppState, sub: &str) -> ApiResult<()> {
    queries::users::delete(&state.db_pool, sub).await?;
    crate::audit::record(
        &state.db_pool,
        darkauth_types::audit::events::USER_DELETED,
        None,
        None,
        Some(sub),
        None,
    )
    .await
}

pub async fn resolve_user_permissions(
    state: &AppState,
    sub: &str,
    organization_id: Option<uuid::Uuid>,
) -> ApiResult<ResolvedPermissions> {
    rbac::resolve(&state.db_pool, sub, organization_id).await
}

pub async fn create_admin(state: &AppState, req: &NewAdmin) -> ApiResult<Admin> {
    let sub = random_token_b64(16);
    let admin = queries::admins::insert(&state.db_pool, &sub, req).await?;
    crate::audit::record(
        &state.db_pool,
        darkauth_types::audit::events::ADMIN_CREATED,
        None,
        None,
        Some(&sub),
        None,
    )
    .await?;
    Ok(admin)
}

pub async fn list_admins(state: &AppState) -> ApiResult<Vec<Admin>> {
    queries::admins::list(&state.db_pool).await
}

/// The zero-admin bootstrap check install finalization uses to refuse
/// flipping `installed` before a first admin actually exists.
pub async fn admin_count(state: &AppState) -> ApiResult<i64> {
    queries::admins::count(&state.db_pool).await
}

pub async fn create_client(state: &AppState, req: &NewClientRequest) -> ApiResult<Client> {
    let client_secret_enc = match (&req.client_type, &req.client_secret) {
        (ClientType::Confidential, Some(secret)) => {
            let crypto = state.require_crypto().await?;
            Some(crypto.kek.wrap(secret.as_bytes())?)
        }
        (ClientType::Confidential, None) => {
            return Err(crate::error::ApiError::InvalidRequest(
                "confidential clients require a client_secret".into(),
            ));
        }
        (ClientType::Public, _) => None,
    };

    let client = Client {
        client_id: req.client_id.clone(),
        name: req.name.clone(),
        client_type: req.client_type,
        token_endpoint_auth_method: req.token_endpoint_auth_method,
        client_secret_enc,
        require_pkce: req.require_pkce,
        redirect_uris: req.redirect_uris.clone(),
        post_logout_redirect_uris: req.post_logout_redirect_uris.clone(),
        grant_types: req.grant_types.clone(),
        response_types: req.response_types.clone(),
        scopes: req.scopes.clone(),
        zk_delivery: req.zk_delivery,
        zk_required: req.zk_required,
        allowed_zk_origins: req.allowed_zk_origins.clone(),
        id_token_lifetime_seconds: req.id_token_lifetime_seconds,
    };
    queries::clients::insert(&state.db_pool, &client).await?;

    crate::audit::record(
        &state.db_pool,
        darkauth_types::audit::events::CLIENT_CREATED,
        None,
        None,
        Some(&client.client_id),
        None,
    )
    .await?;

    Ok(client)
}

pub async fn list_clients(state: &AppState) -> ApiResult<Vec<Client>> {
    queries::clients::list(&state.db_pool).await
}

pub async fn get_client(state: &AppState, client_id: &str) -> ApiResult<Client> {
    queries::clients::get(&state.db_pool, client_id).await
}

pub async fn delete_client(state: &AppState, client_id: &str) -> ApiResult<()> {
    queries::clients::delete(&state.db_pool, client_id).await?;
    crate::audit::record(
        &state.db_pool,
        darkauth_types::audit::events::CLIENT_DELETED,
        None,
        None,
        Some(client_id),
        None,
    )
    .await
}

pub async fn list_settings(state: &AppState) -> ApiResult<Vec<Setting>> {
    queries::settings::list(&state.db_pool).await
}

pub async fn put_setting(
    state: &AppState,
    key: &str,
    value: &serde_json::Value,
) -> ApiResult<()> {
    queries::settings::put(&state.db_pool, key, value).await?;
    crate::audit::record(
        &state.db_pool,
        darkauth_types::audit::events::SETTINGS_UPDATED,
        None,
        None,
        Some(key),
        None,
    )
    .await
}

pub async fn list_audit_log(state: &AppState, limit: i64) -> ApiResult<Vec<AuditLogEntry>> {
    queries::audit::list_recent(&state.db_pool, limit.clamp(1, 500)).await
}

/// Demotes the current primary signing key and mints a fresh one. Old keys
/// stay published in JWKS so tokens signed before the rotation keep
/// validating until they expire.
pub async fn rotate_signing_keys(state: &AppState) -> ApiResult<()> {
    let crypto = state.require_crypto().await?;
    crypto.signing.write().await.rotate(&state.db_pool, &crypto.kek).await?;
    crate::audit::record(
        &state.db_pool,
        darkauth_types::audit::events::KEY_ROTATED,
        None,
        None,
        None,
        None,
    )
    .await
}
