use crate::error::ConfigError;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// The root configuration structure for the entire application.
///
/// Every section is optional in the file; omitted values fall back to the
/// defaults below.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub engine: EngineSettings,
}

/// Where and how the HTTP adapter listens.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, in bytes.
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive, used when `RUST_LOG` is not set.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Report malformed instruments under `failures` instead of failing the request.
    pub isolate_failures: bool,
    /// Annual risk-free rate subtracted from the annualised mean in the Sharpe ratio.
    pub risk_free_rate: f64,
}

/// Command-line overrides for the server section.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct ServerOverrides {
    /// The interface to bind (e.g., "127.0.0.1").
    #[cfg_attr(feature = "clap", arg(long))]
    pub host: Option<String>,

    /// The port to listen on.
    #[cfg_attr(feature = "clap", arg(long))]
    pub port: Option<u16>,
}

// --- Default Implementations ---

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            body_limit_bytes: 1024 * 1024 * 50,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "portfolio-lens.log".to_string(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            isolate_failures: false,
            risk_free_rate: 0.02,
        }
    }
}

impl ServerSettings {
    /// The socket address built from `host` and `port`.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::ValidationError(format!("invalid server address '{}:{}': {e}", self.host, self.port)))
    }

    pub fn apply(&mut self, overrides: &ServerOverrides) {
        if let Some(host) = &overrides.host {
            self.host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
    }
}

impl Settings {
    /// Checks the invariants that deserialization alone cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError("server.port must be non-zero".to_string()));
        }
        if self.server.body_limit_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "server.body_limit_bytes must be greater than zero".to_string(),
            ));
        }
        self.server.socket_addr()?;
        EnvFilter::try_new(&self.logging.level).map_err(|e| {
            ConfigError::ValidationError(format!("logging.level '{}' is not a valid filter: {e}", self.logging.level))
        })?;
        if self.logging.file_prefix.trim().is_empty() {
            return Err(ConfigError::ValidationError("logging.file_prefix must not be empty".to_string()));
        }
        if !self.engine.risk_free_rate.is_finite() {
            return Err(ConfigError::ValidationError("engine.risk_free_rate must be a finite number".to_string()));
        }
        Ok(())
    }
}
