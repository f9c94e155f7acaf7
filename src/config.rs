use std::time::Duration;

use clap::Parser;

/// Runtime settings, read from flags or the environment (`.env` included).
#[derive(Debug, Clone, Parser)]
#[command(name = "ecopanel", version, about = "Role-gated admin front end")]
pub struct Config {
    /// Base URL of the remote API.
    #[arg(long, env = "ECOPANEL_BACKEND_URL", default_value = "http://localhost:3000")]
    pub backend_url: String,

    #[arg(long, env = "ECOPANEL_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "ECOPANEL_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Mark the session cookie `Secure`.
    #[arg(long, env = "ECOPANEL_SECURE_COOKIES", default_value_t = false)]
    pub secure_cookies: bool,

    /// Timeout for remote API calls, in seconds. Unset means no timeout.
    #[arg(long, env = "ECOPANEL_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,
}

impl Config {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout.map(Duration::from_secs)
    }
}
