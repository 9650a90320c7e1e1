//! Browser-facing login session: the cookie issued after a successful
//! OPAQUE login, used to drive the interactive `/authorize` consent flow
//! and the account-settings UI. Distinct from OAuth2 access/refresh tokens,
//! which relying parties hold instead.

use axum::http::{HeaderMap, HeaderValue, header};
use darkauth_types::auth::{Session, SessionCohort, expires_at, random_token_b64};
use time::Duration;

use crate::{
    config::ServerConfig,
    db::DbPool,
    error::{ApiError, ApiResult},
    queries, rbac,
};

/// Creates the browser session issued after a successful OPAQUE login.
/// Admin cohort sessions never carry an organization context (admins act
/// outside the RBAC org model); user cohort sessions get the RBAC
/// resolver's deterministic default, per spec.md §4.6's
/// `resolveOrganizationContext(userSub, requestedOrgId=None)`.
pub async fn create(
    pool: &DbPool,
    config: &ServerConfig,
    cohort: SessionCohort,
    sub: &str,
    email: Option<&str>,
    name: Option<&str>,
) -> ApiResult<Session> {
    let (organization_id, organization_slug) = match cohort {
        SessionCohort::User => match rbac::resolve_organization_context(pool, sub, None).await? {
            Some(org_id) => {
                let org = queries::organizations::get(pool, org_id).await?;
                (Some(org.id), Some(org.slug))
            }
            None => (None, None),
        },
        SessionCohort::Admin => (None, None),
    };

    let session = Session {
        id: random_token_b64(32),
        cohort: cohort.as_str().to_string(),
        sub: sub.to_string(),
        email: email.map(str::to_string),
        name: name.map(str::to_string),
        organization_id,
        organization_slug,
        client_id: None,
        otp_verified: false,
        data: serde_json::json!({}),
        refresh_token: random_token_b64(32),
        expires_at: expires_at(Duration::seconds(config.session_lifetime_seconds)),
    };
    queries::sessions::insert(pool, &session).await?;
    Ok(session)
}

pub async fn load_from_headers(
    pool: &DbPool,
    config: &ServerConfig,
    headers: &HeaderMap,
) -> ApiResult<Session> {
    let id = cookie_value(headers, &config.session_cookie_name)
        .ok_or_else(|| ApiError::Unauthenticated("missing session cookie".into()))?;
    let session = queries::sessions::get(pool, &id).await?;
    if session.expires_at <= time::OffsetDateTime::now_utc() {
        return Err(ApiError::Unauthenticated("session expired".into()));
    }
    Ok(session)
}

pub fn set_cookie_header(config: &ServerConfig, session: &Session) -> HeaderValue {
    let value = format!(
        "{}={}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={}",
        config.session_cookie_name, session.id, config.session_lifetime_seconds
    );
    HeaderValue::from_str(&value).expect("cookie header value is always valid ascii")
}

pub fn clear_cookie_header(config: &ServerConfig) -> HeaderValue {
    let value = format!(
        "{}=; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age=0",
        config.session_cookie_name
    );
    HeaderValue::from_str(&value).expect("cookie header value is always valid ascii")
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let pair = pair.trim();
        let (k, v) = pair.split_once('=')?;
        (k == name).then(|| v.to_string())
    })
}
