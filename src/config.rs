// Copyright (c) 2025 - Cowboy AI, Inc.

//! Connection and logging configuration
//!
//! Values come from the environment, falling back to local development
//! defaults:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `NEO4J_URI` | `bolt://localhost:7687` |
//! | `NEO4J_USERNAME` | `neo4j` |
//! | `NEO4J_PASSWORD` | `password` |
//! | `NEO4J_DATABASE` | `neo4j` |
//! | `NEO4J_MAX_CONNECTIONS` | `16` |
//! | `LOG_LEVEL` | `info` |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{StoreError, StoreResult};

pub const DEFAULT_URI: &str = "bolt://localhost:7687";
pub const DEFAULT_USERNAME: &str = "neo4j";
pub const DEFAULT_PASSWORD: &str = "password";
pub const DEFAULT_DATABASE: &str = "neo4j";
pub const DEFAULT_MAX_CONNECTIONS: usize = 16;
pub const DEFAULT_FETCH_SIZE: usize = 500;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration for the Neo4j connection
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neo4jConfig {
    /// Neo4j URI (e.g., "bolt://localhost:7687")
    pub uri: String,

    pub username: String,

    pub password: String,

    /// Database name
    pub database: String,

    /// Connection pool size
    pub max_connections: usize,

    /// Rows pulled per round-trip when streaming results
    pub fetch_size: usize,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            fetch_size: DEFAULT_FETCH_SIZE,
        }
    }
}

impl fmt::Debug for Neo4jConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Neo4jConfig")
            .field("uri", &self.uri)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .field("fetch_size", &self.fetch_size)
            .finish()
    }
}

impl Neo4jConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> StoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> StoreResult<Self> {
        let defaults = Self::default();

        let max_connections = match lookup("NEO4J_MAX_CONNECTIONS") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                StoreError::Configuration(format!("NEO4J_MAX_CONNECTIONS={}: {}", raw, e))
            })?,
            None => defaults.max_connections,
        };

        let config = Self {
            uri: lookup("NEO4J_URI").unwrap_or(defaults.uri),
            username: lookup("NEO4J_USERNAME").unwrap_or(defaults.username),
            password: lookup("NEO4J_PASSWORD").unwrap_or(defaults.password),
            database: lookup("NEO4J_DATABASE").unwrap_or(defaults.database),
            max_connections,
            fetch_size: defaults.fetch_size,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.uri.trim().is_empty() {
            return Err(StoreError::Configuration("URI is empty".to_string()));
        }
        if self.max_connections == 0 {
            return Err(StoreError::Configuration(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            level: lookup("LOG_LEVEL")
                .map(|level| level.trim().to_lowercase())
                .filter(|level| !level.is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_config_default() {
        let config = Neo4jConfig::default();
        assert_eq!(config.uri, "bolt://localhost:7687");
        assert_eq!(config.username, "neo4j");
        assert_eq!(config.database, "neo4j");
    }

    #[test]
    fn test_missing_variables_fall_back_to_defaults() {
        let config = Neo4jConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, Neo4jConfig::default());
    }

    #[test]
    fn test_variables_override_defaults() {
        let env = vars(&[
            ("NEO4J_URI", "neo4j://graph.internal:7687"),
            ("NEO4J_USERNAME", "topology"),
            ("NEO4J_PASSWORD", "s3cret"),
            ("NEO4J_DATABASE", "infra"),
            ("NEO4J_MAX_CONNECTIONS", "4"),
        ]);
        let config = Neo4jConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.uri, "neo4j://graph.internal:7687");
        assert_eq!(config.username, "topology");
        assert_eq!(config.database, "infra");
        assert_eq!(config.max_connections, 4);
    }

    #[test]
    fn test_bad_pool_size_is_configuration_error() {
        let env = vars(&[("NEO4J_MAX_CONNECTIONS", "many")]);
        let result = Neo4jConfig::from_lookup(|k| env.get(k).cloned());
        assert!(matches!(result, Err(StoreError::Configuration(_))));

        let env = vars(&[("NEO4J_MAX_CONNECTIONS", "0")]);
        let result = Neo4jConfig::from_lookup(|k| env.get(k).cloned());
        assert!(matches!(result, Err(StoreError::Configuration(_))));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = Neo4jConfig {
            password: "hunter2".to_string(),
            ..Default::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("bolt://localhost:7687"));
    }

    #[test]
    fn test_log_level() {
        assert_eq!(LogConfig::from_lookup(|_| None).level, "info");
        let env = vars(&[("LOG_LEVEL", " DEBUG ")]);
        assert_eq!(LogConfig::from_lookup(|k| env.get(k).cloned()).level, "debug");
    }
}
