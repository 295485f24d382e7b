use std::fmt;
use std::time::Duration;

pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://greennotecapitalpartners.quickbase.com";
pub const DEFAULT_PERSON_SEARCH_URL: &str =
    "https://s2s.thomsonreuters.com/api/v3/person/searchResults";
pub const DEFAULT_PHONE_SEARCH_URL: &str =
    "https://s2s.thomsonreuters.com/api/v2/phone/searchResults";

/// Credentials presented to the CLEAR provider on every call.
///
/// Both Basic auth and the PKCS#12 client certificate are sent together.
#[derive(Clone)]
pub struct ProviderCredentials {
    pub username: String,
    pub password: String,
    pub cert_path: String,
    pub cert_passphrase: String,
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("cert_path", &self.cert_path)
            .field("cert_passphrase", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub allowed_origin: String,
    pub credentials: ProviderCredentials,
    pub person_search_url: String,
    pub phone_search_url: String,
    /// Hard timeout applied to every single provider call.
    pub provider_timeout: Duration,
    /// Deadline for a whole inbound request, all provider calls included.
    pub request_deadline: Duration,
    pub detail_fetch_concurrency: usize,
    pub max_concurrent_requests: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// `from_env` delegates here; tests pass a map-backed closure instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> anyhow::Result<String> {
            lookup(key)
                .ok_or_else(|| anyhow::anyhow!("{} environment variable required", key))
                .and_then(|value| {
                    if value.trim().is_empty() {
                        anyhow::bail!("{} cannot be empty", key);
                    }
                    Ok(value)
                })
        };

        let optional = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let http_url = |key: &str, default: &str| -> anyhow::Result<String> {
            let raw = optional(key, default);
            let parsed = url::Url::parse(&raw)
                .map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", key, e))?;
            if !matches!(parsed.scheme(), "http" | "https") || !parsed.has_host() {
                anyhow::bail!("{} must be an http:// or https:// URL", key);
            }
            Ok(raw)
        };

        let positive = |key: &str, default: &str| -> anyhow::Result<u64> {
            optional(key, default)
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| anyhow::anyhow!("{} must be a positive integer", key))
        };

        let config = Self {
            host: optional("HOST", "127.0.0.1"),
            port: optional("PORT", "8080")
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            allowed_origin: http_url("ALLOWED_ORIGIN", DEFAULT_ALLOWED_ORIGIN)?,
            credentials: ProviderCredentials {
                username: required("CLEAR_USERNAME")?,
                password: required("CLEAR_PASSWORD")?,
                cert_path: required("CLEAR_CERT_PATH")?,
                cert_passphrase: required("CLEAR_CERT_PASS")?,
            },
            person_search_url: http_url("CLEAR_PERSON_SEARCH_URL", DEFAULT_PERSON_SEARCH_URL)?,
            phone_search_url: http_url("CLEAR_PHONE_SEARCH_URL", DEFAULT_PHONE_SEARCH_URL)?,
            provider_timeout: Duration::from_secs(positive("PROVIDER_TIMEOUT_SECS", "30")?),
            request_deadline: Duration::from_secs(positive("REQUEST_DEADLINE_SECS", "120")?),
            detail_fetch_concurrency: positive("DETAIL_FETCH_CONCURRENCY", "4")? as usize,
            max_concurrent_requests: positive("MAX_CONCURRENT_REQUESTS", "10")? as usize,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Allowed origin: {}", config.allowed_origin);
        tracing::debug!("Person search URL: {}", config.person_search_url);
        tracing::debug!("Phone search URL: {}", config.phone_search_url);
        tracing::debug!("Client certificate: {}", config.credentials.cert_path);
        tracing::debug!("Server: {}:{}", config.host, config.port);

        Ok(config)
    }
}
