pub mod admins;
pub mod audit;
pub mod auth_codes;
pub mod clients;
pub mod crypto;
pub mod opaque;
pub mod organizations;
pub mod otp;
pub mod pending_auth;
pub mod rbac;
pub mod refresh_tokens;
pub mod sessions;
pub mod settings;
pub mod signing_keys;
pub mod users;
