use serde::{Deserialize, Serialize};

/// Body of `POST /install/start`. Empty today; kept as a struct rather than
/// `()` so a future install-time option doesn't require changing the route
/// signature.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug, Default)]
pub struct InstallStartRequest {}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct InstallStartResponse {
    pub install_token: String,
    pub expires_in: i64,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallBootstrapRequest {
    pub install_token: String,
    pub passphrase: String,
    pub issuer: String,
}

impl std::fmt::Debug for InstallBootstrapRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallBootstrapRequest")
            .field("install_token", &"[REDACTED]")
            .field("passphrase", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallRegisterStartRequest {
    pub install_token: String,
    pub email: String,
    /// Base64url-encoded `RegistrationRequest` bytes.
    pub request: String,
}

impl std::fmt::Debug for InstallRegisterStartRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallRegisterStartRequest")
            .field("install_token", &"[REDACTED]")
            .field("email", &self.email)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct InstallRegisterStartResponse {
    pub registration_id: String,
    pub response: String,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallRegisterFinishRequest {
    pub install_token: String,
    pub email: String,
    pub name: Option<String>,
    pub registration_id: String,
    /// Base64url-encoded `RegistrationUpload` bytes.
    pub record: String,
}

impl std::fmt::Debug for InstallRegisterFinishRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallRegisterFinishRequest")
            .field("install_token", &"[REDACTED]")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("registration_id", &self.registration_id)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct InstallRegisterFinishResponse {
    pub sub: String,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallFinalizeRequest {
    pub install_token: String,
    pub admin_email: String,
}

impl std::fmt::Debug for InstallFinalizeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallFinalizeRequest")
            .field("install_token", &"[REDACTED]")
            .field("admin_email", &self.admin_email)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct InstallStatusResponse {
    pub installed: bool,
}
