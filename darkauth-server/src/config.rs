pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable `{0}`")]
    MissingVar(&'static str),

    #[error("Invalid value for `{name}`: {reason}")]
    InvalidVar { name: &'static str, reason: String },
}

/// Deployment configuration for a single tenant instance. Unlike a
/// multi-server cluster file, every value here comes from the process
/// environment so the binary can run unmodified across dev/staging/prod.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub issuer: String,
    pub database_url: String,
    pub port: u16,
    pub session_cookie_name: String,
    pub session_lifetime_seconds: i64,
    pub login_session_lifetime_seconds: i64,
    pub authorization_code_lifetime_seconds: i64,
    pub pending_authorization_lifetime_seconds: i64,
    pub id_token_lifetime_seconds: i64,
    pub access_token_lifetime_seconds: i64,
    pub refresh_token_lifetime_seconds: i64,
    pub rate_limit_max_attempts: u32,
    pub rate_limit_window_seconds: u64,
    /// Where `/authorize` redirects the browser to collect OPAQUE login
    /// credentials. No login UI ships in this repository; this points at
    /// wherever one is deployed.
    pub ui_login_url: String,
    pub install_token_lifetime_seconds: i64,
}

impl ServerConfig {
    pub fn from_env() -> ConfigResult<Self> {
        let database_url = required("DATABASE_URL")?;
        let issuer = std::env::var("ISSUER").unwrap_or_else(|_| {
            format!("http://localhost:{}", default_port())
        });
        let port = optional_parsed("PORT", default_port())?;
        let ui_login_url = std::env::var("UI_LOGIN_URL")
            .unwrap_or_else(|_| format!("{issuer}/ui/login"));

        Ok(Self {
            issuer,
            database_url,
            port,
            session_cookie_name: std::env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "darkauth_session".into()),
            session_lifetime_seconds: optional_parsed(
                "SESSION_LIFETIME_SECONDS",
                3600,
            )?,
            login_session_lifetime_seconds: optional_parsed(
                "LOGIN_SESSION_LIFETIME_SECONDS",
                300,
            )?,
            authorization_code_lifetime_seconds: optional_parsed(
                "AUTHORIZATION_CODE_LIFETIME_SECONDS",
                60,
            )?,
            pending_authorization_lifetime_seconds: optional_parsed(
                "PENDING_AUTHORIZATION_LIFETIME_SECONDS",
                600,
            )?,
            id_token_lifetime_seconds: optional_parsed(
                "ID_TOKEN_LIFETIME_SECONDS",
                3600,
            )?,
            access_token_lifetime_seconds: optional_parsed(
                "ACCESS_TOKEN_LIFETIME_SECONDS",
                3600,
            )?,
            refresh_token_lifetime_seconds: optional_parsed(
                "REFRESH_TOKEN_LIFETIME_SECONDS",
                2_592_000,
            )?,
            rate_limit_max_attempts: optional_parsed(
                "RATE_LIMIT_MAX_ATTEMPTS",
                10,
            )?,
            rate_limit_window_seconds: optional_parsed(
                "RATE_LIMIT_WINDOW_SECONDS",
                60,
            )?,
            ui_login_url,
            install_token_lifetime_seconds: optional_parsed(
                "INSTALL_TOKEN_LIFETIME_SECONDS",
                600,
            )?,
        })
    }

    pub fn jwks_uri(&self) -> String {
        format!("{}/.well-known/jwks.json", self.issuer)
    }

    pub fn authorization_endpoint(&self) -> String {
        format!("{}/authorize", self.issuer)
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/token", self.issuer)
    }
}

fn default_port() -> u16 {
    9080
}

fn required(name: &'static str) -> ConfigResult<String> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

fn optional_parsed<T: std::str::FromStr>(
    name: &'static str,
    default: T,
) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidVar {
            name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
