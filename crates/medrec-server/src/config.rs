use std::net::{IpAddr, SocketAddr};

use medrec_auth::AuthConfig;
use medrec_db_postgres::PostgresConfig;
use medrec_notifications::MailConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn addr(&self) -> SocketAddr {
        let ip: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or_else(|_| IpAddr::from([0, 0, 0, 0]));
        SocketAddr::from((ip, self.server.port))
    }

    pub fn is_production(&self) -> bool {
        self.server.environment == Environment::Production
    }

    /// Origins allowed to make credentialed requests: the configured list plus
    /// the web client's own origin.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = self
            .server
            .cors_origins
            .iter()
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();
        let client = self.auth.client_base_url().to_string();
        if !client.is_empty() && !origins.contains(&client) {
            origins.push(client);
        }
        origins
    }

    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        // Auth validation
        self.auth.validate().map_err(|e| e.to_string())?;
        if self.is_production()
            && self.auth.jwt_secret.len() < AuthConfig::MIN_PRODUCTION_SECRET_LEN
        {
            return Err(format!(
                "auth.jwt_secret must be at least {} bytes in production",
                AuthConfig::MIN_PRODUCTION_SECRET_LEN
            ));
        }
        // Storage validation
        if self.storage.backend == StorageBackend::Postgres {
            if self.storage.postgres.url.trim().is_empty() {
                return Err("storage.postgres.url is required for the postgres backend".into());
            }
            self.storage.postgres.validate()?;
        }
        // Mail validation
        self.mail.validate().map_err(|e| e.to_string())?;
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Production switches the session cookie to `Secure; SameSite=None`.
    #[serde(default)]
    pub environment: Environment,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    5001
}
fn default_body_limit() -> usize {
    1024 * 1024
}
fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5173".into()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
            body_limit_bytes: default_body_limit(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process-local maps; data is lost on restart.
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub postgres: PostgresConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_PATH: &str = "medrec.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        let mut builder = Config::builder();
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., MEDREC__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("MEDREC")
                .prefix_separator("__")
                .try_parsing(true)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.cors_origins"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.auth.jwt_secret = "0123456789abcdef0123456789abcdef".into();
        cfg
    }

    #[test]
    fn defaults_validate_once_secret_is_set() {
        assert!(AppConfig::default().validate().is_err());
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn production_requires_long_secret() {
        let mut cfg = valid();
        cfg.server.environment = Environment::Production;
        assert!(cfg.validate().is_ok());

        cfg.auth.jwt_secret = "short".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("at least 32 bytes"), "{err}");
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = valid();
        cfg.server.port = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = valid();
        cfg.logging.level = "loud".into();
        assert!(cfg.validate().is_err());

        let mut cfg = valid();
        cfg.storage.postgres.url = String::new();
        assert!(cfg.validate().is_err());
        cfg.storage.backend = StorageBackend::Memory;
        assert!(cfg.validate().is_ok());

        let mut cfg = valid();
        cfg.mail.enabled = true;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn addr_falls_back_to_any() {
        let mut cfg = valid();
        cfg.server.host = "not-an-ip".into();
        cfg.server.port = 8081;
        assert_eq!(cfg.addr(), "0.0.0.0:8081".parse().unwrap());
    }

    #[test]
    fn allowed_origins_include_client() {
        let mut cfg = valid();
        cfg.auth.client_url = "https://app.example.com/".into();
        cfg.server.cors_origins = vec!["http://localhost:5173/".into(), " ".into()];
        assert_eq!(
            cfg.allowed_origins(),
            vec!["http://localhost:5173", "https://app.example.com"]
        );

        cfg.auth.client_url = "http://localhost:5173".into();
        assert_eq!(cfg.allowed_origins(), vec!["http://localhost:5173"]);
    }
}
