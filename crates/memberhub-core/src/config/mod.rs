//! Configuration schema, layered from TOML files and the environment.
//!
//! Settings come from three sources, later ones overriding earlier:
//! `config/default.toml`, `config/{env}.toml`, then environment variables
//! prefixed with `MEMBERHUB` (double-underscore separated, e.g.
//! `MEMBERHUB__SERVER__PORT`). Every section carries full defaults, so a
//! missing file still yields a runnable in-memory setup.

pub mod auth;
pub mod logging;
pub mod realtime;
pub mod server;
pub mod store;
pub mod tasks;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Merged configuration for the whole deployment, one field per section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Listener address for the WebSocket endpoint.
    #[serde(default)]
    pub server: server::ServerConfig,
    /// Persistence gateway provider selection and connection details.
    #[serde(default)]
    pub store: store::StoreConfig,
    /// Fan-out timeouts and per-session limits.
    #[serde(default)]
    pub realtime: realtime::RealtimeConfig,
    /// Channel token verification.
    #[serde(default)]
    pub auth: auth::AuthConfig,
    /// Background maintenance cadence.
    #[serde(default)]
    pub tasks: tasks::TasksConfig,
    /// Log filter and output format.
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl AppConfig {
    /// Read the layered configuration for the named environment.
    ///
    /// Both TOML layers are optional; environment variables win over files.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let overlay = format!("config/{env}");
        let mut builder = config::Config::builder();
        for layer in ["config/default", overlay.as_str()] {
            builder = builder.add_source(config::File::with_name(layer).required(false));
        }
        let vars = config::Environment::with_prefix("MEMBERHUB").separator("__").try_parsing(true);

        let merged = builder
            .add_source(vars)
            .build()
            .map_err(|e| AppError::configuration(format!("Cannot assemble configuration: {e}")))?;
        merged
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Configuration rejected: {e}")))
    }
}
