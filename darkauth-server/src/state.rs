use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    config::ServerConfig, db::DbPool, kek::Kek, opaque_engine::OpaqueEngine,
    ratelimit::RateLimiter, signing::SigningKeyManager,
};

/// Secrets derived from the install passphrase. Absent until `/install`
/// runs (or, on a restart after installation, until the boot-time
/// passphrase has been re-supplied and verified). Signing keys live here
/// rather than as a standalone field because every private half on disk
/// is wrapped by the KEK and cannot be decrypted before it exists.
#[derive(Clone)]
pub struct Crypto {
    pub kek: Kek,
    pub opaque: OpaqueEngine,
    pub signing: Arc<RwLock<SigningKeyManager>>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub db_pool: Arc<DbPool>,
    pub crypto: Arc<RwLock<Option<Crypto>>>,
    pub rate_limiter: Arc<RateLimiter>,
    /// The short-lived token minted by `/install/start` and checked by every
    /// other install endpoint. Cleared the moment installation finalizes.
    pub install_token: Arc<RwLock<Option<crate::install::InstallToken>>>,
}

impl AppState {
    pub async fn require_crypto(&self) -> crate::error::ApiResult<Crypto> {
        self.crypto
            .read()
            .await
            .clone()
            .ok_or(crate::error::ApiError::NotInstalled)
    }
}
