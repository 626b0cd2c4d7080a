//! Logging configuration.

use serde::{Deserialize, Serialize};

/// Controls the tracing subscriber installed by the binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level filter when `RUST_LOG` is unset (`trace` through
    /// `error`).
    #[serde(default = "defaults::level")]
    pub level: String,
    /// Output format, `json` for collectors or `pretty` for terminals.
    #[serde(default = "defaults::format")]
    pub format: String,
}

impl LoggingConfig {
    /// Whether frames should be emitted as JSON lines.
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::level(),
            format: defaults::format(),
        }
    }
}

mod defaults {
    pub fn level() -> String {
        "info".to_string()
    }

    pub fn format() -> String {
        "json".to_string()
    }
}
