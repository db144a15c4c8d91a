use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{EngineSettings, LoggingSettings, ServerOverrides, ServerSettings, Settings};

/// The file read when no explicit path is given. It may be absent.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Prefix of environment overrides, e.g. `PORTFOLIO_LENS__SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "PORTFOLIO_LENS";

/// Loads the application settings.
///
/// Sources are layered in order: built-in defaults, the optional TOML file at
/// `path` (or `config.toml`), then `PORTFOLIO_LENS__*` environment variables.
/// The merged result is validated before it is returned.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    load_settings_with_env(path, environment())
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

fn load_settings_with_env(
    path: Option<&Path>,
    env: config::Environment,
) -> Result<Settings, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(env)
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    tracing::debug!(config_file = %path.display(), "Loaded settings.");
    Ok(settings)
}
