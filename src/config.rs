// ⚙️ Client Configuration
//
// Defaults match the deployed FinApp backend; every value can be
// overridden from the environment (FINAPP_*), optionally via a .env file
// loaded by the CLI.

use std::env;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_LOCAL_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_DEPLOYED_API_URL: &str = "https://finapp-analytics-api.onrender.com";
pub const DEFAULT_CSRF_COOKIE: &str = "csrf_token";
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRF-Token";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Host the client runs under (browser hostname, machine name...)
    pub host: String,

    /// Endpoint used when `host` is a loopback address
    pub local_api_url: String,

    /// Endpoint used everywhere else
    pub deployed_api_url: String,

    /// Explicit endpoint, bypasses host-based resolution when set
    pub base_url_override: Option<String>,

    /// Cookie carrying the anti-forgery token
    pub csrf_cookie: String,

    /// Header the anti-forgery token is echoed in
    pub csrf_header: String,

    /// Transport-level timeout (None = wait forever)
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: DEFAULT_HOST.to_string(),
            local_api_url: DEFAULT_LOCAL_API_URL.to_string(),
            deployed_api_url: DEFAULT_DEPLOYED_API_URL.to_string(),
            base_url_override: None,
            csrf_cookie: DEFAULT_CSRF_COOKIE.to_string(),
            csrf_header: DEFAULT_CSRF_HEADER.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read FINAPP_* variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` but with an injectable lookup (tests)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ClientConfig::default();

        if let Some(host) = lookup("FINAPP_HOST") {
            config.host = host;
        }
        if let Some(url) = lookup("FINAPP_LOCAL_API_URL") {
            config.local_api_url = url;
        }
        if let Some(url) = lookup("FINAPP_DEPLOYED_API_URL") {
            config.deployed_api_url = url;
        }
        config.base_url_override = lookup("FINAPP_API_URL");
        if let Some(cookie) = lookup("FINAPP_CSRF_COOKIE") {
            config.csrf_cookie = cookie;
        }
        if let Some(header) = lookup("FINAPP_CSRF_HEADER") {
            config.csrf_header = header;
        }
        config.timeout = lookup("FINAPP_TIMEOUT_SECS")
            .and_then(|secs| secs.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        config
    }

    /// Builder: run under a specific host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Builder: pin the backend endpoint
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url_override = Some(url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

// ============================================================================
// TESTS
// ============================================================================
