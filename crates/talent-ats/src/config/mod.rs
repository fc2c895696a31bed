use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::hiring::BulkMode;

const DEFAULT_REJECTION_SUBJECT: &str = "Update on your application";
const DEFAULT_MAIL_FROM: &str = "no-reply@talent-ats.local";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub pipeline: PipelineSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let pipeline = PipelineSettings::from_env()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            pipeline,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Knobs for the hiring pipeline: bulk strictness and the rejection mail envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub bulk_mode: BulkMode,
    pub rejection_subject: String,
    pub mail_from: String,
}

impl PipelineSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let bulk_mode = match env::var("ATS_BULK_MODE") {
            Ok(raw) => parse_bulk_mode(&raw)?,
            Err(_) => BulkMode::default(),
        };

        Ok(Self {
            bulk_mode,
            rejection_subject: env::var("ATS_REJECTION_SUBJECT")
                .unwrap_or_else(|_| DEFAULT_REJECTION_SUBJECT.to_string()),
            mail_from: env::var("ATS_MAIL_FROM").unwrap_or_else(|_| DEFAULT_MAIL_FROM.to_string()),
        })
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            bulk_mode: BulkMode::default(),
            rejection_subject: DEFAULT_REJECTION_SUBJECT.to_string(),
            mail_from: DEFAULT_MAIL_FROM.to_string(),
        }
    }
}

fn parse_bulk_mode(raw: &str) -> Result<BulkMode, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "lenient" => Ok(BulkMode::Lenient),
        "strict" => Ok(BulkMode::Strict),
        _ => Err(ConfigError::InvalidBulkMode {
            value: raw.to_string(),
        }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidBulkMode { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidBulkMode { value } => {
                write!(f, "ATS_BULK_MODE must be 'lenient' or 'strict' (found '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidBulkMode { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "ATS_BULK_MODE",
            "ATS_REJECTION_SUBJECT",
            "ATS_MAIL_FROM",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.pipeline, PipelineSettings::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_strict_bulk_mode() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ATS_BULK_MODE", " Strict ");
        env::set_var("ATS_REJECTION_SUBJECT", "Your application");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.pipeline.bulk_mode, BulkMode::Strict);
        assert_eq!(config.pipeline.rejection_subject, "Your application");
        reset_env();
    }

    #[test]
    fn rejects_unknown_bulk_mode() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ATS_BULK_MODE", "yolo");
        let err = AppConfig::load().expect_err("bulk mode rejected");
        assert!(matches!(err, ConfigError::InvalidBulkMode { ref value } if value == "yolo"));
        reset_env();
    }
}
