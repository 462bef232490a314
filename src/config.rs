use axum::http::HeaderValue;
use thiserror::Error;

const DEFAULT_API_PATH: &str = "/api/en";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_CLIENT_URL: &str = "http://localhost:5174";

/// Configuration errors, all fatal at startup
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} missing in environment variables")]
    Missing(&'static str),
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Service configuration, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_path: String,
    pub test_api_url: String,
    pub port: u16,
    /// Single origin allowed by CORS
    pub client_origin: HeaderValue,
    pub production: bool,
    pub use_mock: bool,
}

impl AppConfig {
    /// Load from the process environment (after `.env` has been applied)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let api_url = required("YAYA_API_URL")?;
        let api_key = required("YAYA_API_KEY")?;
        let api_secret = required("YAYA_API_SECRET")?;
        let test_api_url = required("YAYA_TEST_API_URL")?;

        // Unset falls back to the default; set-but-empty is a mistake
        let api_path = match lookup("YAYA_API_PATH") {
            None => DEFAULT_API_PATH.to_string(),
            Some(path) if path.trim().is_empty() => return Err(ConfigError::Missing("YAYA_API_PATH")),
            Some(path) => path.trim().to_string(),
        };

        let port = match lookup("PORT") {
            None => DEFAULT_PORT,
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: e.to_string(),
            })?,
        };

        let client_url = lookup("CLIENT_URL").unwrap_or_else(|| DEFAULT_CLIENT_URL.to_string());
        let client_origin = HeaderValue::from_str(client_url.trim()).map_err(|e| ConfigError::Invalid {
            var: "CLIENT_URL",
            reason: e.to_string(),
        })?;

        let production = lookup("APP_ENV").map_or(false, |env| env.eq_ignore_ascii_case("production"));
        let use_mock = lookup("YAYA_USE_MOCK").map_or(false, |flag| {
            matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes")
        });

        Ok(Self {
            api_url,
            api_key,
            api_secret,
            api_path,
            test_api_url,
            port,
            client_origin,
            production,
            use_mock,
        })
    }

    /// Live API in production, sandbox otherwise
    pub fn upstream_url(&self) -> &str {
        if self.production {
            &self.api_url
        } else {
            &self.test_api_url
        }
    }
}
