//! Configuration loading and management
//!
//! The service is configured from a YAML file (see `marketplace.yaml`), with
//! a handful of environment variables taking precedence:
//! `PORT`, `JWT_SECRET`, `MONGO_URI` and `LOG_LEVEL`.

use crate::core::auth::{Principal, Role};
use crate::core::error::{ConfigError, MarketError, MarketResult};
use crate::entities::Product;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use uuid::Uuid;

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub events: EventsConfig,

    /// Tracing filter used when `RUST_LOG` is not set
    #[serde(default)]
    pub log_level: Option<String>,

    /// Products inserted at startup
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret for bearer tokens
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Fixed tokens accepted in addition to JWTs
    #[serde(default)]
    pub tokens: Vec<StaticToken>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            tokens: Vec::new(),
        }
    }
}

fn default_jwt_secret() -> String {
    "change-me".to_string()
}

/// A fixed token and the principal it stands for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticToken {
    pub token: String,
    pub user: Uuid,
    pub role: Role,
}

impl StaticToken {
    pub fn principal(&self) -> Principal {
        Principal::new(self.user, self.role)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    InMemory,
    Mongodb,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    #[serde(default = "default_mongo_uri")]
    pub mongo_uri: String,

    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            mongo_uri: default_mongo_uri(),
            database: default_database(),
        }
    }
}

fn default_mongo_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_database() -> String {
    "marketplace".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Broadcast buffer size before slow subscribers start lagging
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    1024
}

/// A product to seed the catalog with.
///
/// The id is mandatory so that seeding the same file again updates the
/// products instead of adding copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    pub seller: Uuid,
}

impl CatalogEntry {
    pub fn to_product(&self) -> Product {
        let mut product = Product::new(self.title.clone(), self.price, self.seller);
        product.id = self.id;
        if let Some(description) = &self.description {
            product = product.with_description(description.clone());
        }
        product
    }
}

impl MarketplaceConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> MarketResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| {
            MarketError::Config(ConfigError::ParseError {
                file: Some(path.to_string()),
                message: e.to_string(),
            })
        })
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> MarketResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Override values from the process environment
    pub fn apply_env_overrides(&mut self) -> MarketResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> MarketResult<()> {
        if let Some(port) = var("PORT") {
            self.server.port = port.parse().map_err(|_| {
                MarketError::Config(ConfigError::InvalidValue {
                    field: "PORT".to_string(),
                    value: port.clone(),
                    message: "expected a port number".to_string(),
                })
            })?;
        }
        if let Some(secret) = var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(uri) = var("MONGO_URI") {
            self.storage.mongo_uri = uri;
            self.storage.backend = StorageBackend::Mongodb;
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.log_level = Some(level);
        }
        Ok(())
    }

    /// Reject values the service cannot start with
    pub fn validate(&self) -> MarketResult<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(MarketError::Config(ConfigError::InvalidValue {
                field: "auth.jwt_secret".to_string(),
                value: String::new(),
                message: "must not be empty".to_string(),
            }));
        }
        if self.events.capacity == 0 {
            return Err(MarketError::Config(ConfigError::InvalidValue {
                field: "events.capacity".to_string(),
                value: "0".to_string(),
                message: "must be at least 1".to_string(),
            }));
        }
        if let Some(entry) = self.catalog.iter().find(|entry| entry.price.is_sign_negative()) {
            return Err(MarketError::Config(ConfigError::InvalidValue {
                field: format!("catalog[{}].price", entry.id),
                value: entry.price.to_string(),
                message: "must not be negative".to_string(),
            }));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> MarketResult<SocketAddr> {
        let raw = format!("{}:{}", self.server.host, self.server.port);
        raw.parse().map_err(|_| {
            MarketError::Config(ConfigError::InvalidValue {
                field: "server.host".to_string(),
                value: raw.clone(),
                message: "not a socket address".to_string(),
            })
        })
    }
}
