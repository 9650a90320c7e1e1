use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "client_type", rename_all = "lowercase"))]
pub enum ClientType {
    Public,
    Confidential,
}

#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "token_endpoint_auth_method", rename_all = "snake_case")
)]
pub enum TokenEndpointAuthMethod {
    None,
    ClientSecretBasic,
}

#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "zk_delivery", rename_all = "kebab-case"))]
pub enum ZkDelivery {
    None,
    FragmentJwe,
}

/// A registered OAuth2/OIDC client (relying party).
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Client {
    pub client_id: String,
    pub name: String,
    pub client_type: ClientType,
    pub token_endpoint_auth_method: TokenEndpointAuthMethod,
    /// KEK-wrapped client secret; `None` for public clients.
    pub client_secret_enc: Option<Vec<u8>>,
    pub require_pkce: bool,
    pub redirect_uris: Vec<String>,
    pub post_logout_redirect_uris: Vec<String>,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
    pub scopes: Vec<String>,
    pub zk_delivery: ZkDelivery,
    pub zk_required: bool,
    pub allowed_zk_origins: Vec<String>,
    pub id_token_lifetime_seconds: Option<i64>,
}

impl Client {
    pub fn supports_grant(&self, grant_type: &str) -> bool {
        self.grant_types.iter().any(|g| g == grant_type)
    }

    pub fn allows_redirect_uri(&self, redirect_uri: &str) -> bool {
        self.redirect_uris.iter().any(|u| u == redirect_uri)
    }

    pub fn scope_set(&self) -> std::collections::HashSet<&str> {
        self.scopes.iter().map(String::as_str).collect()
    }
}

/// Admin-submitted shape for registering a new client. `client_secret`, when
/// present, is the plaintext one-time value the admin chooses; the server
/// wraps it with C1 before it ever reaches a `Client` row and never echoes
/// it back.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewClientRequest {
    pub client_id: String,
    pub name: String,
    pub client_type: ClientType,
    pub token_endpoint_auth_method: TokenEndpointAuthMethod,
    pub client_secret: Option<String>,
    pub require_pkce: bool,
    pub redirect_uris: Vec<String>,
    pub post_logout_redirect_uris: Vec<String>,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
    pub scopes: Vec<String>,
    pub zk_delivery: ZkDelivery,
    pub zk_required: bool,
    pub allowed_zk_origins: Vec<String>,
    pub id_token_lifetime_seconds: Option<i64>,
}

impl std::fmt::Debug for NewClientRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewClientRequest")
            .field("client_id", &self.client_id)
            .field("name", &self.name)
            .field("client_type", &self.client_type)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("require_pkce", &self.require_pkce)
            .field("redirect_uris", &self.redirect_uris)
            .finish_non_exhaustive()
    }
}
