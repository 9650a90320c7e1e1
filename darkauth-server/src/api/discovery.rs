//! OIDC discovery document and JWKS publication. Neither endpoint requires
//! authentication; JWKS is only reachable once the server has bootstrapped
//! a signing key, i.e. after install.

use axum::{Json, extract::State, response::IntoResponse};
use darkauth_types::auth::{JwksResponse, OidcDiscoveryDocument};
use log::info;

use crate::{error::ApiResult, state::AppState};

pub async fn openid_configuration(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /.well-known/openid-configuration");
    let doc = OidcDiscoveryDocument {
        issuer: state.config.issuer.clone(),
        jwks_uri: state.config.jwks_uri(),
        authorization_endpoint: state.config.authorization_endpoint(),
        token_endpoint: state.config.token_endpoint(),
        grant_types_supported: vec![
            "authorization_code".into(),
            "refresh_token".into(),
            "client_credentials".into(),
        ],
        response_types_supported: vec!["code".into()],
        scopes_supported: vec!["openid".into(), "profile".into(), "email".into()],
        code_challenge_methods_supported: vec!["S256".into(), "plain".into()],
        token_endpoint_auth_methods_supported: vec!["none".into(), "client_secret_basic".into()],
    };
    Json(doc)
}

pub async fn jwks(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    info!("GET /.well-known/jwks.json");
    let crypto = state.require_crypto().await?;
    let keys = crypto.signing.read().await.jwks();
    Ok(Json(JwksResponse { keys }))
}
