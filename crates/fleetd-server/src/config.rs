//! Server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the fleetd server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Maximum accepted request body size in bytes.
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_message_size: 32 * 1024 * 1024, // 32 MB
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_host() {
        assert_eq!(ServerConfig::default().host, "127.0.0.1");
    }

    #[test]
    fn default_port_is_zero() {
        assert_eq!(ServerConfig::default().port, 0);
    }

    #[test]
    fn default_max_message_size() {
        assert_eq!(ServerConfig::default().max_message_size, 32 * 1024 * 1024);
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = ServerConfig {
            host: "0.0.0.0".into(),
            port: 8942,
            max_message_size: 1024,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.port, cfg.port);
        assert_eq!(back.max_message_size, cfg.max_message_size);
    }
}
