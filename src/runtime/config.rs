//! Runtime configuration.

use crate::function::adapter::DEFAULT_MAX_BODY_SIZE;
use crate::runtime::RuntimeError;
use serde::{Deserialize, Serialize};

/// Environment variable holding the function id.
pub const FUNCTION_ID_VAR: &str = "FAAS_FUNCTION_ID";

/// Configuration for the runtime server.
///
/// Read once at startup and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Identity of the deployed function, copied into every context.
    pub function_id: String,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            function_id: "unknown".to_string(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl RuntimeConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the process environment.
    ///
    /// | variable              | default   |
    /// |-----------------------|-----------|
    /// | `FAAS_FUNCTION_ID`    | `unknown` |
    /// | `FAAS_HOST`           | `0.0.0.0` |
    /// | `FAAS_PORT` or `PORT` | `8080`    |
    /// | `FAAS_MAX_BODY_BYTES` | 10 MiB    |
    pub fn from_env() -> Result<Self, RuntimeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RuntimeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(function_id) = lookup(FUNCTION_ID_VAR).filter(|v| !v.is_empty()) {
            config.function_id = function_id;
        }
        if let Some(host) = lookup("FAAS_HOST").filter(|v| !v.is_empty()) {
            config.host = host;
        }
        if let Some((key, port)) = ["FAAS_PORT", "PORT"]
            .into_iter()
            .find_map(|key| lookup(key).filter(|v| !v.is_empty()).map(|v| (key, v)))
        {
            config.port = port.trim().parse().map_err(|_| {
                RuntimeError::Config(format!("{} must be a port number, got {:?}", key, port))
            })?;
        }
        if let Some(limit) = lookup("FAAS_MAX_BODY_BYTES").filter(|v| !v.is_empty()) {
            config.max_body_size = limit.trim().parse().map_err(|_| {
                RuntimeError::Config(format!(
                    "FAAS_MAX_BODY_BYTES must be a byte count, got {:?}",
                    limit
                ))
            })?;
        }

        Ok(config)
    }

    /// Set the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the function id.
    pub fn function_id(mut self, function_id: impl Into<String>) -> Self {
        self.function_id = function_id.into();
        self
    }

    /// Set the maximum request body size.
    pub fn max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio_test::{assert_err, assert_ok};

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = assert_ok!(RuntimeConfig::from_lookup(lookup(&[])));

        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.function_id, "unknown");
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_from_lookup() {
        let config = assert_ok!(RuntimeConfig::from_lookup(lookup(&[
            ("FAAS_FUNCTION_ID", "thumbnailer"),
            ("FAAS_HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("FAAS_MAX_BODY_BYTES", "1024"),
        ])));

        assert_eq!(config.function_id, "thumbnailer");
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.max_body_size, 1024);
    }

    #[test]
    fn test_faas_port_wins_over_port() {
        let config = assert_ok!(RuntimeConfig::from_lookup(lookup(&[
            ("FAAS_PORT", "7000"),
            ("PORT", "9000"),
        ])));

        assert_eq!(config.port, 7000);
    }

    #[test]
    fn test_empty_port_falls_through() {
        let config = assert_ok!(RuntimeConfig::from_lookup(lookup(&[
            ("FAAS_PORT", ""),
            ("PORT", "9100"),
        ])));
        assert_eq!(config.port, 9100);

        let config = assert_ok!(RuntimeConfig::from_lookup(lookup(&[
            ("FAAS_PORT", ""),
            ("PORT", ""),
        ])));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_empty_function_id_keeps_default() {
        let config = assert_ok!(RuntimeConfig::from_lookup(lookup(&[("FAAS_FUNCTION_ID", "")])));

        assert_eq!(config.function_id, "unknown");
    }

    #[test]
    fn test_invalid_values() {
        let err = assert_err!(RuntimeConfig::from_lookup(lookup(&[("PORT", "http")])));
        assert!(err.to_string().contains("PORT"));

        assert_err!(RuntimeConfig::from_lookup(lookup(&[(
            "FAAS_MAX_BODY_BYTES",
            "-1"
        )])));
    }

    #[test]
    fn test_builder() {
        let config = RuntimeConfig::new()
            .host("127.0.0.1")
            .port(0)
            .function_id("fn")
            .max_body_size(16);

        assert_eq!(config.bind_addr(), "127.0.0.1:0");
        assert_eq!(config.function_id, "fn");
        assert_eq!(config.max_body_size, 16);
    }
}
