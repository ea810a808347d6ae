//! Configuration module for the Lif Auth Server.

use serde::Deserialize;
use std::path::Path;

use crate::auth::PasswordScheme;
use crate::moderation::BatchMode;
use crate::{LifError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8002
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/lif_accounts.db".to_string()
}

fn default_max_connections() -> u32 {
    8
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Registrable domain trusted for logout redirects and auth cookies.
    #[serde(default = "default_trusted_domain")]
    pub trusted_domain: String,
    /// Rate limit for the login endpoint (requests per minute per IP).
    #[serde(default = "default_login_rate_limit")]
    pub login_rate_limit: u32,
    /// Whether the interactive API documentation is served.
    #[serde(default = "default_api_docs")]
    pub api_docs: bool,
}

fn default_trusted_domain() -> String {
    "lifplatforms.com".to_string()
}

fn default_login_rate_limit() -> u32 {
    10
}

fn default_api_docs() -> bool {
    true
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cors_origins: vec![],
            trusted_domain: default_trusted_domain(),
            login_rate_limit: default_login_rate_limit(),
            api_docs: default_api_docs(),
        }
    }
}

/// Password hashing configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityConfig {
    /// Scheme used for every stored password hash.
    #[serde(default)]
    pub password_scheme: PasswordScheme,
}

/// Service access-control configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessControlConfig {
    /// Path to the TOML file mapping service tokens to permission nodes.
    #[serde(default = "default_access_control_path")]
    pub path: String,
}

fn default_access_control_path() -> String {
    "access-control.toml".to_string()
}

impl Default for AccessControlConfig {
    fn default() -> Self {
        Self {
            path: default_access_control_path(),
        }
    }
}

/// Moderation configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModerationConfig {
    /// Atomicity of bulk role and permission updates.
    #[serde(default)]
    pub batch_mode: BatchMode,
}

/// Report configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportsConfig {
    /// Services that may be named in a report.
    #[serde(default = "default_accepted_services")]
    pub accepted_services: Vec<String>,
}

fn default_accepted_services() -> Vec<String> {
    vec![
        "Ringer".to_string(),
        "Dayly".to_string(),
        "Support".to_string(),
    ]
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            accepted_services: default_accepted_services(),
        }
    }
}

/// Transactional mail configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailConfig {
    /// Whether mail is delivered. When disabled, messages are dropped.
    #[serde(default)]
    pub enabled: bool,
    /// Base URL of the mail service.
    #[serde(default)]
    pub service_url: String,
    /// Access token presented to the mail service.
    #[serde(default)]
    pub service_token: String,
}

/// Profile image storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `pfp/` and `banner/` images.
    #[serde(default = "default_images_path")]
    pub images_path: String,
}

fn default_images_path() -> String {
    "user_images".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            images_path: default_images_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/lif-auth.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Password hashing configuration.
    #[serde(default)]
    pub security: SecurityConfig,
    /// Service access-control configuration.
    #[serde(default)]
    pub access_control: AccessControlConfig,
    /// Moderation configuration.
    #[serde(default)]
    pub moderation: ModerationConfig,
    /// Report configuration.
    #[serde(default)]
    pub reports: ReportsConfig,
    /// Mail configuration.
    #[serde(default)]
    pub mail: MailConfig,
    /// Image storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(LifError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| LifError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `RUN_ENVIRONMENT`: `PRODUCTION` hides the API documentation
    /// - `LIF_MAIL_SERVICE_TOKEN`: Override the mail service token
    pub fn apply_env_overrides(&mut self) {
        if let Ok(env) = std::env::var("RUN_ENVIRONMENT") {
            if env == "PRODUCTION" {
                self.web.api_docs = false;
            }
        }

        if let Ok(token) = std::env::var("LIF_MAIL_SERVICE_TOKEN") {
            if !token.is_empty() {
                self.mail.service_token = token;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if mail is enabled without a service URL and token.
    pub fn validate(&self) -> Result<()> {
        if self.mail.enabled
            && (self.mail.service_url.is_empty() || self.mail.service_token.is_empty())
        {
            return Err(LifError::Config(
                "mail is enabled but service_url or service_token is not set. \
                 Set them in config.toml or via LIF_MAIL_SERVICE_TOKEN."
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8002);

        assert_eq!(config.database.path, "data/lif_accounts.db");
        assert_eq!(config.database.max_connections, 8);

        assert!(config.web.cors_origins.is_empty());
        assert_eq!(config.web.trusted_domain, "lifplatforms.com");
        assert_eq!(config.web.login_rate_limit, 10);
        assert!(config.web.api_docs);

        assert_eq!(config.security.password_scheme, PasswordScheme::Sha256);
        assert_eq!(config.access_control.path, "access-control.toml");
        assert_eq!(config.moderation.batch_mode, BatchMode::PerAccount);
        assert_eq!(
            config.reports.accepted_services,
            vec!["Ringer", "Dayly", "Support"]
        );

        assert!(!config.mail.enabled);
        assert_eq!(config.storage.images_path, "user_images");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/lif-auth.log");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[database]
path = "custom/accounts.db"
max_connections = 2

[web]
cors_origins = ["https://lifplatforms.com", "http://localhost:5173"]
trusted_domain = "example.org"
login_rate_limit = 3
api_docs = false

[security]
password_scheme = "argon2id"

[access_control]
path = "config/acl.toml"

[moderation]
batch_mode = "all_or_nothing"

[reports]
accepted_services = ["Ringer"]

[mail]
enabled = true
service_url = "http://mail.internal"
service_token = "mail-secret"

[storage]
images_path = "/var/lib/lif/images"

[logging]
level = "debug"
file = "custom/logs/auth.log"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.path, "custom/accounts.db");
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.web.cors_origins.len(), 2);
        assert_eq!(config.web.trusted_domain, "example.org");
        assert_eq!(config.web.login_rate_limit, 3);
        assert!(!config.web.api_docs);
        assert_eq!(config.security.password_scheme, PasswordScheme::Argon2id);
        assert_eq!(config.access_control.path, "config/acl.toml");
        assert_eq!(config.moderation.batch_mode, BatchMode::AllOrNothing);
        assert_eq!(config.reports.accepted_services, vec!["Ringer"]);
        assert!(config.mail.enabled);
        assert_eq!(config.mail.service_url, "http://mail.internal");
        assert_eq!(config.mail.service_token, "mail-secret");
        assert_eq!(config.storage.images_path, "/var/lib/lif/images");
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.server.port, 8002);
        assert_eq!(config.database.path, "data/lif_accounts.db");
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        assert!(result.is_err());
        if let Err(LifError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_parse_unknown_password_scheme() {
        let result = Config::parse("[security]\npassword_scheme = \"md5\"\n");
        assert!(matches!(result, Err(LifError::Config(_))));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(LifError::Io(_))));
    }

    #[test]
    fn test_apply_env_overrides_production() {
        let original = std::env::var("RUN_ENVIRONMENT").ok();

        std::env::set_var("RUN_ENVIRONMENT", "PRODUCTION");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert!(!config.web.api_docs);

        std::env::set_var("RUN_ENVIRONMENT", "DEVELOPMENT");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert!(config.web.api_docs);

        if let Some(val) = original {
            std::env::set_var("RUN_ENVIRONMENT", val);
        } else {
            std::env::remove_var("RUN_ENVIRONMENT");
        }
    }

    #[test]
    fn test_validate_mail_enabled_without_token() {
        let mut config = Config::default();
        config.mail.enabled = true;
        config.mail.service_url = "http://mail.internal".to_string();

        let result = config.validate();
        assert!(result.is_err());
        if let Err(LifError::Config(msg)) = result {
            assert!(msg.contains("service_token"));
        }
    }

    #[test]
    fn test_validate_mail_disabled() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }
}
