//! First-run installation: bootstraps the KEK, the OPAQUE server setup, and
//! the initial admin account. Every write path that touches secrets is
//! gated behind this having completed, enforced by
//! [`crate::state::AppState::require_crypto`].
//!
//! Ordering matters: `bootstrap` derives the KEK and OPAQUE server setup and
//! seeds defaults, but does *not* flip `installed`. The caller drives the
//! admin through OPAQUE registration against the freshly bootstrapped
//! engine, then calls `finalize`, which is the only thing that flips
//! `installed = true`. A crash between the two leaves the server
//! indefinitely in "bootstrapped but not installed", which is safe: the
//! install endpoints are still reachable and a retry can still complete.

use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;

use darkauth_types::settings::{self, KdfParams, Setting};

use crate::{
    db::DbPool,
    error::{ApiError, ApiResult},
    kek::Kek,
    queries,
    signing::SigningKeyManager,
    state::Crypto,
};

/// A short-lived credential minted by `/install/start` and required by
/// every subsequent install endpoint, so an attacker racing the true
/// operator to `/install` can't hijack the flow by hitting a later step
/// first.
#[derive(Clone)]
pub struct InstallToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

impl InstallToken {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            token: darkauth_types::auth::random_token_b64(32),
            expires_at: OffsetDateTime::now_utc() + lifetime,
        }
    }

    pub fn verify(&self, provided: &str) -> ApiResult<()> {
        if self.expires_at <= OffsetDateTime::now_utc() {
            return Err(ApiError::InvalidRequest("install token expired".into()));
        }
        if !crate::kek::constant_time_eq(self.token.as_bytes(), provided.as_bytes()) {
            return Err(ApiError::InvalidRequest("invalid install token".into()));
        }
        Ok(())
    }
}

pub async fn is_installed(pool: &DbPool) -> ApiResult<bool> {
    match queries::settings::get(pool, settings::keys::INSTALLED).await? {
        Some(value) => Ok(value.as_bool().unwrap_or(false)),
        None => Ok(false),
    }
}

pub struct BootstrapRequest {
    pub passphrase: String,
    pub issuer: String,
}

/// Derives the KDF salt and KEK, mints a fresh OPAQUE server setup and the
/// primary signing keypair, and seeds the settings that make all three
/// recoverable on every future boot. Does not touch `installed`.
///
/// Requires `pool` to already point at a reachable Postgres -- unlike some
/// frameworks' install flows, there is no in-process throwaway database to
/// bootstrap against first.
pub async fn bootstrap(pool: &DbPool, req: &BootstrapRequest) -> ApiResult<Crypto> {
    if is_installed(pool).await? {
        return Err(ApiError::AlreadyInstalled);
    }

    let salt = Kek::new_salt();
    let kdf_params = KdfParams::defaults(salt);
    let kek = Kek::derive(&req.passphrase, &kdf_params)?;

    let opaque_setup = crate::opaque_engine::OpaqueEngine::generate();
    let wrapped_setup = kek.wrap(&opaque_setup.serialize())?;

    queries::settings::put(
        pool,
        settings::keys::KDF_PARAMS,
        &serde_json::to_value(&kdf_params).expect("KdfParams always serializes"),
    )
    .await?;
    queries::settings::put(
        pool,
        settings::keys::ISSUER,
        &serde_json::Value::String(req.issuer.clone()),
    )
    .await?;
    queries::settings::put(
        pool,
        "opaque_server_setup",
        &serde_json::Value::String(base64_encode(&wrapped_setup)),
    )
    .await?;
    queries::settings::put(
        pool,
        settings::keys::ENCRYPTION_PUBLIC_JWK_VISIBLE,
        &serde_json::Value::Bool(true),
    )
    .await?;
    queries::settings::put(
        pool,
        settings::keys::SELF_REGISTRATION_ENABLED,
        &serde_json::Value::Bool(false),
    )
    .await?;

    let signing = SigningKeyManager::load_or_generate(pool, &kek).await?;

    Ok(Crypto {
        kek,
        opaque: opaque_setup,
        signing: Arc::new(RwLock::new(signing)),
    })
}

/// Flips `installed = true` and records the completion audit event. Called
/// only after the first admin's OPAQUE registration has succeeded against
/// the bootstrapped engine.
pub async fn finalize(pool: &DbPool, admin_email: &str) -> ApiResult<()> {
    queries::settings::put(
        pool,
        settings::keys::INSTALLED,
        &serde_json::Value::Bool(true),
    )
    .await?;

    crate::audit::record(
        pool,
        darkauth_types::audit::events::INSTALL_COMPLETED,
        None,
        None,
        Some(admin_email),
        None,
    )
    .await?;

    Ok(())
}

/// Re-derives the KEK, OPAQUE engine, and signing key store from persisted
/// state at every boot after installation, so the passphrase only has to
/// be supplied once during bootstrap and is never stored.
pub async fn load_crypto(pool: &DbPool, passphrase: &str) -> ApiResult<Crypto> {
    let kdf_params: KdfParams = get_required_json(pool, settings::keys::KDF_PARAMS).await?;
    let kek = Kek::derive(passphrase, &kdf_params)?;

    let wrapped_setup_b64 = get_required_string(pool, "opaque_server_setup").await?;
    let wrapped_setup = base64_decode(&wrapped_setup_b64)?;
    let setup_bytes = kek.unwrap(&wrapped_setup)?;
    let opaque_engine = crate::opaque_engine::OpaqueEngine::deserialize(&setup_bytes)?;

    let signing = SigningKeyManager::load_or_generate(pool, &kek).await?;

    Ok(Crypto {
        kek,
        opaque: opaque_engine,
        signing: Arc::new(RwLock::new(signing)),
    })
}

async fn get_required_json<T: serde::de::DeserializeOwned>(
    pool: &DbPool,
    key: &str,
) -> ApiResult<T> {
    let setting: Setting = queries::settings::get_row(pool, key)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("missing setting `{key}`")))?;
    serde_json::from_value(setting.value)
        .map_err(|e| ApiError::Internal(format!("corrupt setting `{key}`: {e}")))
}

async fn get_required_string(pool: &DbPool, key: &str) -> ApiResult<String> {
    let value = queries::settings::get(pool, key)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("missing setting `{key}`")))?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ApiError::Internal(format!("setting `{key}` is not a string")))
}

fn base64_encode(bytes: &[u8]) -> String {
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

fn base64_decode(s: &str) -> ApiResult<Vec<u8>> {
    base64::Engine::decode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, s)
        .map_err(|e| ApiError::Internal(format!("corrupt base64 setting: {e}")))
}
