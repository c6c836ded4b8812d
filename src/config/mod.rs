use crate::sales::engine::{
    DEFAULT_ALPHA, DEFAULT_CONFIDENCE_LEVEL, DEFAULT_HISTOGRAM_BINS, MAX_HISTOGRAM_BINS,
};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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
    pub analysis: AnalysisDefaults,
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

        let analysis = AnalysisDefaults {
            confidence_level: probability_var("APP_CONFIDENCE_LEVEL", DEFAULT_CONFIDENCE_LEVEL)?,
            alpha: probability_var("APP_ALPHA", DEFAULT_ALPHA)?,
            histogram_bins: match env::var("APP_HISTOGRAM_BINS") {
                Ok(raw) => raw
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|bins| (1..=MAX_HISTOGRAM_BINS).contains(bins))
                    .ok_or(ConfigError::InvalidHistogramBins { value: raw })?,
                Err(_) => DEFAULT_HISTOGRAM_BINS,
            },
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            analysis,
        })
    }
}

fn probability_var(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    let Ok(raw) = env::var(key) else {
        return Ok(default);
    };

    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| *value > 0.0 && *value < 1.0)
        .ok_or(ConfigError::InvalidProbability { key, value: raw })
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

/// Thresholds applied when a caller does not choose its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisDefaults {
    pub confidence_level: f64,
    pub alpha: f64,
    pub histogram_bins: usize,
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            alpha: DEFAULT_ALPHA,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidProbability { key: &'static str, value: String },
    InvalidHistogramBins { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidProbability { key, value } => {
                write!(f, "{key} must be a number strictly between 0 and 1 (got '{value}')")
            }
            ConfigError::InvalidHistogramBins { value } => {
                write!(
                    f,
                    "APP_HISTOGRAM_BINS must be an integer between 1 and {MAX_HISTOGRAM_BINS} (got '{value}')"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidProbability { .. }
            | ConfigError::InvalidHistogramBins { .. } => None,
        }
    }
}
