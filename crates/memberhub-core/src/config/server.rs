//! Listener bind settings.

use serde::{Deserialize, Serialize};

/// Where the WebSocket endpoint listens.
///
/// The server surface is a single WebSocket upgrade route plus a health
/// probe; TLS termination and CORS are handled by the portal's edge proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind, `0.0.0.0` in containers.
    #[serde(default = "defaults::host")]
    pub host: String,
    /// TCP port to bind.
    #[serde(default = "defaults::port")]
    pub port: u16,
}

impl ServerConfig {
    /// The `host:port` string handed to the TCP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
        }
    }
}

mod defaults {
    pub fn host() -> String {
        "0.0.0.0".to_string()
    }

    pub fn port() -> u16 {
        8080
    }
}
