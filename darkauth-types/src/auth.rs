use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Base64url-encoded opaque bytes. Every wire-level binary field (envelopes,
/// protocol messages, wrapped keys, hashes, JWEs) uses this shape.
pub type B64 = String;

pub fn random_token_b64(num_bytes: usize) -> String {
    let mut bytes = vec![0u8; num_bytes];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn expires_at(lifetime: Duration) -> OffsetDateTime {
    OffsetDateTime::now_utc() + lifetime
}

/// OPAQUE registration start request (user/admin self-registration).
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpaqueRegisterStartRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    /// Base64url-encoded `RegistrationRequest` bytes.
    pub request: B64,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct OpaqueRegisterStartResponse {
    pub registration_id: String,
    /// Base64url-encoded `RegistrationResponse` bytes.
    pub response: B64,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpaqueRegisterFinishRequest {
    pub registration_id: String,
    /// Base64url-encoded `RegistrationUpload` bytes.
    pub record: B64,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct OpaqueRegisterFinishResponse {
    pub sub: String,
}

/// OPAQUE login start request.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpaqueLoginStartRequest {
    pub email: String,
    /// Base64url-encoded `CredentialRequest` bytes.
    pub request: B64,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct OpaqueLoginStartResponse {
    pub login_session_id: String,
    /// Base64url-encoded `CredentialResponse` bytes.
    pub response: B64,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpaqueLoginFinishRequest {
    pub login_session_id: String,
    /// Base64url-encoded `CredentialFinalization` bytes.
    pub finish: B64,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct OpaqueLoginFinishResponse {
    pub sub: String,
}

/// Persisted (KEK-wrapped identity strings) OPAQUE server-side login state.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OpaqueLoginSession {
    pub id: String,
    pub server_state: Vec<u8>,
    pub identity_u_enc: Vec<u8>,
    pub identity_s_enc: Vec<u8>,
    pub cohort: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl std::fmt::Debug for OpaqueLoginSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpaqueLoginSession")
            .field("id", &self.id)
            .field("server_state", &"[REDACTED]")
            .field("identity_u_enc", &"[REDACTED]")
            .field("identity_s_enc", &"[REDACTED]")
            .field("cohort", &self.cohort)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// `/token` request body, a union of all three supported grants.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenRequest {
    pub grant_type: String,
    // authorization_code
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub code_verifier: Option<String>,
    // refresh_token
    pub refresh_token: Option<String>,
    // client_credentials
    pub scope: Option<String>,
    // common
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub id_token: Option<String>,
    pub access_token: Option<String>,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zk_drk_hash: Option<String>,
}

impl std::fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRequest")
            .field("grant_type", &self.grant_type)
            .field("code", &self.code.as_ref().map(|_| "[REDACTED]"))
            .field("redirect_uri", &self.redirect_uri)
            .field(
                "code_verifier",
                &self.code_verifier.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("scope", &self.scope)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("id_token", &self.id_token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("scope", &self.scope)
            .field("zk_drk_hash", &self.zk_drk_hash)
            .finish()
    }
}

/// OIDC discovery document returned from `/.well-known/openid-configuration`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OidcDiscoveryDocument {
    pub issuer: String,
    pub jwks_uri: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub grant_types_supported: Vec<String>,
    pub response_types_supported: Vec<String>,
    pub scopes_supported: Vec<String>,
    pub code_challenge_methods_supported: Vec<String>,
    pub token_endpoint_auth_methods_supported: Vec<String>,
}

/// A single public JSON Web Key (JWK), EdDSA signing keys only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicJwk {
    pub kty: String,
    pub crv: String,
    pub alg: String,
    pub kid: String,
    #[serde(rename = "use")]
    pub use_: String,
    pub x: String,
}

impl PublicJwk {
    pub fn from_ed25519_bytes(pub_bytes: &[u8], kid: String) -> Self {
        Self {
            kty: "OKP".into(),
            crv: "Ed25519".into(),
            alg: "EdDSA".into(),
            kid,
            use_: "sig".into(),
            x: URL_SAFE_NO_PAD.encode(pub_bytes),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct JwksResponse {
    pub keys: Vec<PublicJwk>,
}

/// A client-supplied P-256 ECDH public JWK used for Zero-Knowledge DRK
/// delivery. The server only ever validates shape and fingerprints it; it
/// never performs ECDH with it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ZkPublicJwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
    pub y: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
}

/// ID-token claims, per spec §4.7.4.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdTokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_slug: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub permissions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acr: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub amr: Vec<String>,
}

/// Access-token claims for the `client_credentials` grant (not an ID token).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientAccessClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub azp: String,
    pub iat: i64,
    pub exp: i64,
    pub scope: String,
    pub permissions: Vec<String>,
    pub grant_type: String,
    pub token_use: String,
}

/// Server-side session record. The cookie carries only `id`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Session {
    pub id: String,
    pub cohort: String,
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub organization_id: Option<uuid::Uuid>,
    pub organization_slug: Option<String>,
    pub client_id: Option<String>,
    pub otp_verified: bool,
    pub data: serde_json::Value,
    pub refresh_token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &"[REDACTED]")
            .field("cohort", &self.cohort)
            .field("sub", &self.sub)
            .field("organization_id", &self.organization_id)
            .field("client_id", &self.client_id)
            .field("otp_verified", &self.otp_verified)
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionCohort {
    User,
    Admin,
}

impl SessionCohort {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionCohort::User => "user",
            SessionCohort::Admin => "admin",
        }
    }
}

/// Pending authorization created when `/authorize` redirects to the login UI.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PendingAuthorization {
    pub request_id: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    pub nonce: Option<String>,
    pub zk_pub_kid: Option<String>,
    pub zk_pub_raw: Option<String>,
    pub user_sub: Option<String>,
    pub origin: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

/// An issued OAuth2 refresh token, rotated on every use. Distinct from
/// [`Session`], which tracks the browser's own interactive login and never
/// appears on the wire to a relying party.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RefreshTokenRecord {
    pub refresh_token: String,
    pub client_id: String,
    pub sub: String,
    pub scope: String,
    pub organization_id: Option<uuid::Uuid>,
    pub revoked: bool,
    /// Carried forward from the authorization code (or the prior refresh
    /// token, on rotation) so a re-issued ID token's `amr`/`acr` still
    /// reflects whether the session that produced it cleared OTP.
    pub otp_verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl std::fmt::Debug for RefreshTokenRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenRecord")
            .field("refresh_token", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .field("sub", &self.sub)
            .field("scope", &self.scope)
            .field("organization_id", &self.organization_id)
            .field("revoked", &self.revoked)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Query parameters accepted by `GET /authorize`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorizeQuery {
    pub response_type: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub nonce: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    /// Present when the client requests Zero-Knowledge DRK delivery; the
    /// client's ephemeral P-256 ECDH public key, serialized as JSON then
    /// carried as an opaque query string value.
    pub zk_pub: Option<String>,
    pub organization_id: Option<uuid::Uuid>,
}

/// Body of `POST /authorize/finalize`, submitted once the login UI has
/// authenticated the user against the pending request named by `request_id`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorizeFinalizeRequest {
    pub request_id: String,
    /// Binds the authorization to a pending request's `zk_pub`, echoing the
    /// server-computed fingerprint back for the client to double check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drk_hash: Option<String>,
}

impl std::fmt::Debug for AuthorizeFinalizeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizeFinalizeRequest")
            .field("request_id", &self.request_id)
            .field("drk_hash", &self.drk_hash)
            .finish()
    }
}

/// Since there is no bundled login UI in scope, finalization answers with
/// the redirect target rather than issuing the 302 itself.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorizeFinalizeResponse {
    pub redirect_uri: String,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LogoutRequest {
    pub post_logout_redirect_uri: Option<String>,
}

impl std::fmt::Debug for LogoutRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogoutRequest")
            .field("post_logout_redirect_uri", &self.post_logout_redirect_uri)
            .finish()
    }
}

/// One-time authorization code, minted at `/authorize/finalize`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AuthorizationCode {
    pub code: String,
    pub client_id: String,
    pub sub: String,
    pub redirect_uri: String,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    pub nonce: Option<String>,
    pub has_zk: bool,
    pub zk_pub_kid: Option<String>,
    pub drk_hash: Option<String>,
    pub organization_id: Option<uuid::Uuid>,
    /// Copied from the bound `Session` at `/authorize/finalize` time, so the
    /// token endpoint can set `amr`/`acr` without a second session lookup.
    pub otp_verified: bool,
    pub consumed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}
