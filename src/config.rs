// Runtime configuration. Built once at startup from the environment (with
// an optional `.env` file) and handed by reference to whatever needs it.

use std::fmt;

use reqwest::Url;

pub const AUTH_URL_VAR: &str = "AUTH0_URL";
pub const CLIENT_ID_VAR: &str = "CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "CLIENT_SECRET";
pub const BACKEND_URI_VAR: &str = "BACKEND_API_URI";
pub const AUDIENCE_VAR: &str = "PAI_AUDIENCE";

pub const DEFAULT_AUDIENCE: &str = "https://sctx.auth.phenomic.ai";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("environment variable {name} is not a valid URL: {value}")]
    InvalidUrl { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    /// Token endpoint used for the client-credentials exchange.
    pub auth_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub audience: String,
    /// Base URI that every backend path is joined onto.
    pub backend_api_uri: String,
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let auth_url = parse_url(AUTH_URL_VAR, required(AUTH_URL_VAR)?)?;
        let client_id = required(CLIENT_ID_VAR)?;
        let client_secret = required(CLIENT_SECRET_VAR)?;
        let backend_api_uri = parse_url(BACKEND_URI_VAR, required(BACKEND_URI_VAR)?)?;
        let audience = lookup(AUDIENCE_VAR)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AUDIENCE.to_string());

        Ok(Config {
            auth_url,
            client_id,
            client_secret,
            audience,
            backend_api_uri: backend_api_uri.trim_end_matches('/').to_string(),
        })
    }
}

fn parse_url(name: &'static str, value: String) -> Result<String, ConfigError> {
    match Url::parse(value.trim()) {
        Ok(_) => Ok(value.trim().to_string()),
        Err(_) => Err(ConfigError::InvalidUrl { name, value }),
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("auth_url", &self.auth_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("audience", &self.audience)
            .field("backend_api_uri", &self.backend_api_uri)
            .finish()
    }
}
