//! Resolves the caller identity behind a request (a browser session cookie
//! for admin/user UI routes, or a bearer access token for relying-party API
//! calls) and enforces the permission a handler requires before it runs.

use axum::http::HeaderMap;
use darkauth_types::{auth::SessionCohort, user::AdminRole};
use jsonwebtoken::{Algorithm, Validation};

use crate::{error::{ApiError, ApiResult}, state::AppState};

#[derive(Clone, Debug)]
pub enum Principal {
    /// An end user authenticated via the session cookie.
    User { sub: String },
    /// An operator authenticated via the admin session cookie.
    Admin { sub: String, role: AdminRole },
    /// A relying party authenticated via a `client_credentials` bearer token.
    Client { client_id: String, scope: String },
}

/// What a handler needs the caller to be before it may proceed.
pub enum Requirement {
    AnyUser,
    AnyAdmin,
    AdminWrite,
    Permission(&'static str),
}

impl Principal {
    /// Looks up the session cookie (user or admin cohort); used by
    /// cookie-authenticated UI routes.
    pub async fn from_session_cookie(state: &AppState, headers: &HeaderMap) -> ApiResult<Self> {
        let session = crate::session::load_from_headers(&state.db_pool, &state.config, headers)
            .await?;
        match session.cohort.as_str() {
            cohort if cohort == SessionCohort::Admin.as_str() => {
                let admin = crate::queries::admins::get(&state.db_pool, &session.sub).await?;
                Ok(Principal::Admin {
                    sub: admin.sub,
                    role: admin.admin_role,
                })
            }
            _ => Ok(Principal::User { sub: session.sub }),
        }
    }

    /// Validates a `Bearer` JWT minted for the `client_credentials` grant;
    /// used by machine-to-machine API routes.
    pub async fn from_bearer_header(state: &AppState, headers: &HeaderMap) -> ApiResult<Self> {
        let raw = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthenticated("missing Authorization header".into()))?;
        let token = raw
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthenticated("Authorization header must be a Bearer token".into()))?;

        let header = jsonwebtoken::decode_header(token)?;
        let kid = header
            .kid
            .ok_or_else(|| ApiError::Unauthenticated("token missing kid".into()))?;
        let crypto = state.require_crypto().await?;
        let signing_keys = crypto.signing.read().await;
        let decoding_key = signing_keys
            .decoding_key_for(&kid)
            .ok_or_else(|| ApiError::Unauthenticated("unknown signing key".into()))?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_audience(&[state.config.issuer.clone()]);
        let claims = jsonwebtoken::decode::<darkauth_types::auth::ClientAccessClaims>(
            token,
            decoding_key,
            &validation,
        )?
        .claims;

        Ok(Principal::Client {
            client_id: claims.azp,
            scope: claims.scope,
        })
    }
}

pub async fn authorize(state: &AppState, principal: Principal, req: Requirement) -> ApiResult<Principal> {
    let ok = match (&req, &principal) {
        (Requirement::AnyUser, Principal::User { .. }) => true,
        (Requirement::AnyAdmin, Principal::Admin { .. }) => true,
        (Requirement::AdminWrite, Principal::Admin { role, .. }) => {
            matches!(role, AdminRole::Write)
        }
        (Requirement::Permission(key), Principal::User { sub }) => {
            let resolved = crate::rbac::resolve(&state.db_pool, sub, None).await?;
            resolved.permissions.iter().any(|p| p == key)
        }
        (Requirement::Permission(key), Principal::Client { scope, .. }) => {
            scope.split(' ').any(|s| s == *key)
        }
        _ => false,
    };

    if ok {
        Ok(principal)
    } else {
        Err(ApiError::Forbidden("insufficient permissions".into()))
    }
}
