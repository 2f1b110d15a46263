use std::env;

/// Connection settings for the bid-management API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to (default: "http://localhost:8000/api/v1")
    pub api_base: String,

    /// Per-request timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000/api/v1".to_string(),
            timeout_secs: 30,
            user_agent: format!("complyform/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            api_base: env::var("COMPLYFORM_API_BASE")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default.api_base),

            timeout_secs: env::var("COMPLYFORM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default.timeout_secs),

            user_agent: env::var("COMPLYFORM_USER_AGENT").unwrap_or(default.user_agent),
        }
    }

    /// Local backend with a short timeout
    pub fn development() -> Self {
        Self {
            timeout_secs: 5,
            ..Self::default()
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}
