//! Configuration management
//!
//! This module handles loading and parsing configuration for the Aptinnova site.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings, `.env` is honored)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Theme (template override) configuration
    #[serde(default)]
    pub theme: ThemeConfig,
    /// Site metadata exposed to templates
    #[serde(default)]
    pub site: SiteConfig,
    /// Outbound mail configuration
    #[serde(default)]
    pub mail: MailConfig,
    /// Admin account provisioned at startup
    #[serde(default)]
    pub admin: AdminConfig,
    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_cors_origin() -> String {
    "http://localhost:5001".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/aptinnova.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Theme configuration
///
/// Templates are embedded in the binary. Any `.html` file found under
/// `path` replaces the embedded template with the same relative name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Path to the template override directory
    #[serde(default = "default_theme_path")]
    pub path: PathBuf,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            path: default_theme_path(),
        }
    }
}

fn default_theme_path() -> PathBuf {
    PathBuf::from("themes/custom")
}

/// Site metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,
    #[serde(default = "default_site_description")]
    pub description: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            description: default_site_description(),
        }
    }
}

fn default_site_name() -> String {
    "Aptinnova".to_string()
}

fn default_site_description() -> String {
    "Technology consulting and software delivery".to_string()
}

/// SMTP configuration for contact notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// SMTP host; an empty host disables outbound mail
    #[serde(default = "default_mail_host")]
    pub host: String,
    #[serde(default = "default_mail_port")]
    pub port: u16,
    /// Use STARTTLS
    #[serde(default = "default_true")]
    pub use_tls: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Sender address; falls back to `username`
    #[serde(default)]
    pub from: Option<String>,
    /// Recipient of contact-form notifications
    #[serde(default)]
    pub notify_to: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: default_mail_host(),
            port: default_mail_port(),
            use_tls: true,
            username: None,
            password: None,
            from: None,
            notify_to: None,
        }
    }
}

impl MailConfig {
    /// Sender address, if one can be derived
    pub fn sender(&self) -> Option<&str> {
        self.from
            .as_deref()
            .or(self.username.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    /// Whether enough is configured to open an SMTP connection
    pub fn is_enabled(&self) -> bool {
        !self.host.trim().is_empty() && self.sender().is_some()
    }
}

fn default_mail_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_mail_port() -> u16 {
    587
}

fn default_true() -> bool {
    true
}

/// Admin credential provisioned at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
    #[serde(default = "default_admin_password")]
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password: default_admin_password(),
        }
    }
}

impl AdminConfig {
    /// Whether the shipped default password is still in use
    pub fn uses_default_password(&self) -> bool {
        self.password == default_admin_password()
    }
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "admin123".to_string()
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in days
    #[serde(default = "default_session_ttl_days")]
    pub ttl_days: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_days: default_session_ttl_days(),
        }
    }
}

fn default_session_ttl_days() -> i64 {
    7
}

/// Longest accepted session lifetime
const MAX_SESSION_TTL_DAYS: i64 = 365;

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern `APTINNOVA_<SECTION>_<KEY>`,
    /// e.g. `APTINNOVA_SERVER_PORT` or `APTINNOVA_MAIL_NOTIFY_TO`.
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot work at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SESSION_TTL_DAYS).contains(&self.session.ttl_days) {
            return Err(ConfigError::Invalid(format!(
                "session.ttl_days must be between 1 and {}, got {}",
                MAX_SESSION_TTL_DAYS, self.session.ttl_days
            )));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        // Server
        if let Ok(host) = std::env::var("APTINNOVA_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parsed::<u16>("APTINNOVA_SERVER_PORT") {
            self.server.port = port;
        }
        if let Ok(cors_origin) = std::env::var("APTINNOVA_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        // Database
        if let Ok(driver) = std::env::var("APTINNOVA_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {}
            }
        }
        if let Ok(url) = std::env::var("APTINNOVA_DATABASE_URL") {
            self.database.url = url;
        }

        // Theme and site
        if let Ok(path) = std::env::var("APTINNOVA_THEME_PATH") {
            self.theme.path = PathBuf::from(path);
        }
        if let Ok(name) = std::env::var("APTINNOVA_SITE_NAME") {
            self.site.name = name;
        }

        // Mail
        if let Ok(host) = std::env::var("APTINNOVA_MAIL_HOST") {
            self.mail.host = host;
        }
        if let Some(port) = env_parsed::<u16>("APTINNOVA_MAIL_PORT") {
            self.mail.port = port;
        }
        if let Ok(use_tls) = std::env::var("APTINNOVA_MAIL_USE_TLS") {
            self.mail.use_tls = use_tls.eq_ignore_ascii_case("true");
        }
        if let Ok(username) = std::env::var("APTINNOVA_MAIL_USERNAME") {
            self.mail.username = Some(username);
        }
        if let Ok(password) = std::env::var("APTINNOVA_MAIL_PASSWORD") {
            self.mail.password = Some(password);
        }
        if let Ok(from) = std::env::var("APTINNOVA_MAIL_FROM") {
            self.mail.from = Some(from);
        }
        if let Ok(notify_to) = std::env::var("APTINNOVA_MAIL_NOTIFY_TO") {
            self.mail.notify_to = Some(notify_to);
        }

        // Admin and session
        if let Ok(username) = std::env::var("APTINNOVA_ADMIN_USERNAME") {
            self.admin.username = username;
        }
        if let Ok(password) = std::env::var("APTINNOVA_ADMIN_PASSWORD") {
            self.admin.password = password;
        }
        if let Some(days) = env_parsed::<i64>("APTINNOVA_SESSION_TTL_DAYS") {
            self.session.ttl_days = days;
        }
    }
}

/// Read and parse an environment variable, ignoring unparsable values
fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
