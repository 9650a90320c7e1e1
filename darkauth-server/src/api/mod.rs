use axum::{Router, routing::{get, post, put}};

use crate::state::AppState;

mod admin;
mod authorize;
mod crypto;
mod discovery;
mod install;
mod logout;
mod opaque;
mod otp;
mod token;

/// Creates a router for all API endpoints.
pub fn router() -> Router<AppState> {
    Router::new()
        // OIDC discovery and core protocol surface
        .route(
            "/.well-known/openid-configuration",
            get(discovery::openid_configuration),
        )
        .route("/.well-known/jwks.json", get(discovery::jwks))
        .route("/authorize", get(authorize::start))
        .route("/authorize/finalize", post(authorize::finalize))
        .route("/token", post(token::token))
        .route("/logout", post(logout::logout))
        // First-run installation
        .route("/install/status", get(install::status))
        .route("/install/start", post(install::start))
        .route("/install/bootstrap", post(install::bootstrap))
        .route("/install/register/start", post(install::register_start))
        .route("/install/register/finish", post(install::register_finish))
        .route("/install/finalize", post(install::finalize))
        // OPAQUE registration and login, user cohort
        .route("/opaque/register/start", post(opaque::register_start))
        .route("/opaque/register/finish", post(opaque::register_finish))
        .route("/opaque/login/start", post(opaque::login_start))
        .route("/opaque/login/finish", post(opaque::login_finish))
        // OPAQUE login, admin cohort (admin accounts are only ever created
        // through /install/register or /admin/admins)
        .route(
            "/admin/opaque/login/start",
            post(opaque::admin_login_start),
        )
        .route(
            "/admin/opaque/login/finish",
            post(opaque::admin_login_finish),
        )
        // TOTP second factor
        .route("/otp/enroll", post(otp::enroll))
        .route("/otp/verify", post(otp::verify))
        .route("/otp/verify-recovery", post(otp::verify_recovery))
        // Zero-Knowledge client-side key material
        .route(
            "/crypto/wrapped-drk",
            get(crypto::get_wrapped_drk).put(crypto::put_wrapped_drk),
        )
        .route(
            "/crypto/wrapped-enc-priv",
            get(crypto::get_wrapped_enc_priv).put(crypto::put_wrapped_enc_priv),
        )
        .route(
            "/crypto/enc-pub",
            get(crypto::get_enc_pub).put(crypto::put_enc_pub),
        )
        .route("/crypto/user-enc-pub/{sub}", get(crypto::get_user_enc_pub))
        // Admin CRUD
        .route(
            "/admin/users",
            get(admin::list_users).post(admin::create_user),
        )
        .route(
            "/admin/users/{sub}",
            get(admin::get_user).delete(admin::delete_user),
        )
        .route(
            "/admin/users/{sub}/permissions",
            get(admin::resolve_user_permissions),
        )
        .route(
            "/admin/admins",
            get(admin::list_admins).post(admin::create_admin),
        )
        .route(
            "/admin/clients",
            get(admin::list_clients).post(admin::create_client),
        )
        .route(
            "/admin/clients/{client_id}",
            get(admin::get_client).delete(admin::delete_client),
        )
        .route("/admin/settings", get(admin::list_settings))
        .route("/admin/settings/{key}", put(admin::put_setting))
        .route("/admin/audit-log", get(admin::list_audit_log))
        .route(
            "/admin/signing-keys/rotate",
            post(admin::rotate_signing_keys),
        )
}
