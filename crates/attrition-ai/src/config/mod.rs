use crate::workflows::retention::config::DEFAULT_MAX_UPLOAD_ROWS;
use crate::workflows::retention::{
    validate_threshold, RetentionConfig, RiskPolicy, DEFAULT_HIGH_PERFORMER_CUTOFF,
    DEFAULT_REASONING_THRESHOLD,
};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_HISTORICAL_DATASET: &str = "data/hr_employee_attrition.csv";
pub const DEFAULT_ATTRITION_MODEL: &str = "data/models/attrition_model.json";
pub const DEFAULT_PERFORMANCE_MODEL: &str = "data/models/performance_model.json";

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

    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub artifacts: ArtifactConfig,
    pub retention: RetentionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = var_or("APP_LOG_LEVEL", "info");
        let raw_format = var_or("APP_LOG_FORMAT", "compact");
        let log_format = LogFormat::parse(&raw_format)
            .ok_or_else(|| ConfigError::InvalidLogFormat(raw_format.clone()))?;

        let artifacts = ArtifactConfig {
            historical_dataset: PathBuf::from(var_or(
                "APP_HISTORICAL_DATASET",
                DEFAULT_HISTORICAL_DATASET,
            )),
            attrition_model: PathBuf::from(var_or("APP_ATTRITION_MODEL", DEFAULT_ATTRITION_MODEL)),
            performance_model: PathBuf::from(var_or(
                "APP_PERFORMANCE_MODEL",
                DEFAULT_PERFORMANCE_MODEL,
            )),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
                ansi: environment.is_development(),
            },
            artifacts,
            retention: retention_from_env()?,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn retention_from_env() -> Result<RetentionConfig, ConfigError> {
    let reasoning_threshold = match env::var("APP_REASONING_THRESHOLD") {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(|value| validate_threshold(value).ok())
            .ok_or(ConfigError::InvalidThreshold(raw))?,
        Err(_) => DEFAULT_REASONING_THRESHOLD,
    };

    let risk_policy = match env::var("APP_RISK_POLICY") {
        Ok(raw) => RiskPolicy::parse(&raw).ok_or(ConfigError::InvalidRiskPolicy(raw))?,
        Err(_) => RiskPolicy::default(),
    };

    let high_performer_cutoff = match env::var("APP_HIGH_PERFORMER_CUTOFF") {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or(ConfigError::InvalidCutoff(raw))?,
        Err(_) => DEFAULT_HIGH_PERFORMER_CUTOFF,
    };

    let max_upload_rows = match env::var("APP_MAX_UPLOAD_ROWS") {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or(ConfigError::InvalidUploadLimit(raw))?,
        Err(_) => DEFAULT_MAX_UPLOAD_ROWS,
    };

    Ok(RetentionConfig {
        reasoning_threshold,
        risk_policy,
        high_performer_cutoff,
        max_upload_rows,
    })
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
    pub ansi: bool,
}

/// Locations of the historical dataset and the two model artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    pub historical_dataset: PathBuf,
    pub attrition_model: PathBuf,
    pub performance_model: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat(String),
    InvalidThreshold(String),
    InvalidRiskPolicy(String),
    InvalidCutoff(String),
    InvalidUploadLimit(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'pretty', got '{value}'")
            }
            ConfigError::InvalidThreshold(value) => write!(
                f,
                "APP_REASONING_THRESHOLD must be a non-negative number, got '{value}'"
            ),
            ConfigError::InvalidRiskPolicy(value) => write!(
                f,
                "APP_RISK_POLICY must be 'coarse' or 'detailed', got '{value}'"
            ),
            ConfigError::InvalidCutoff(value) => {
                write!(f, "APP_HIGH_PERFORMER_CUTOFF must be a number, got '{value}'")
            }
            ConfigError::InvalidUploadLimit(value) => write!(
                f,
                "APP_MAX_UPLOAD_ROWS must be a positive integer, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
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
            "APP_LOG_FORMAT",
            "APP_HISTORICAL_DATASET",
            "APP_ATTRITION_MODEL",
            "APP_PERFORMANCE_MODEL",
            "APP_REASONING_THRESHOLD",
            "APP_RISK_POLICY",
            "APP_HIGH_PERFORMER_CUTOFF",
            "APP_MAX_UPLOAD_ROWS",
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
        assert_eq!(config.telemetry.format, LogFormat::Compact);
        assert!(config.telemetry.ansi);
        assert_eq!(
            config.artifacts.historical_dataset,
            PathBuf::from(DEFAULT_HISTORICAL_DATASET)
        );
        assert_eq!(config.retention, RetentionConfig::default());
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
    fn reads_retention_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        env::set_var("APP_REASONING_THRESHOLD", "0.5");
        env::set_var("APP_RISK_POLICY", "detailed");
        env::set_var("APP_HIGH_PERFORMER_CUTOFF", "4");
        env::set_var("APP_MAX_UPLOAD_ROWS", "100");

        let config = AppConfig::load().expect("config loads");
        assert!(!config.telemetry.ansi);
        assert_eq!(config.retention.reasoning_threshold, 0.5);
        assert_eq!(config.retention.risk_policy, RiskPolicy::Detailed);
        assert_eq!(config.retention.high_performer_cutoff, 4.0);
        assert_eq!(config.retention.max_upload_rows, 100);
        reset_env();
    }

    #[test]
    fn rejects_invalid_retention_values() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();

        env::set_var("APP_RISK_POLICY", "strict");
        let error = AppConfig::load().expect_err("unknown policy");
        assert!(matches!(error, ConfigError::InvalidRiskPolicy(ref value) if value == "strict"));
        env::remove_var("APP_RISK_POLICY");

        for raw in ["-1", "NaN", "inf"] {
            env::set_var("APP_REASONING_THRESHOLD", raw);
            let error = AppConfig::load().expect_err("invalid threshold");
            assert!(matches!(error, ConfigError::InvalidThreshold(ref value) if value == raw));
        }
        env::remove_var("APP_REASONING_THRESHOLD");

        env::set_var("APP_MAX_UPLOAD_ROWS", "0");
        let error = AppConfig::load().expect_err("zero upload limit");
        assert!(matches!(error, ConfigError::InvalidUploadLimit(_)));
        reset_env();
    }
}
