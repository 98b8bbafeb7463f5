/// Configuration management
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub server_host: String,
    #[serde(default = "default_port")]
    pub server_port: u16,
    pub database_url: String,
    /// Process-wide secret used to sign session tokens.
    pub jwt_secret: String,
    /// SMTP relay host. Empty means the mailer runs in log-only mode.
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    #[serde(default = "default_smtp_from")]
    pub smtp_from: String,
    /// Base URL used to build verification and reset links in emails.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_from() -> String {
    "no-reply@estate.local".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}
