use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
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

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    5000
}

/// Which persistence variant backs the ticket store.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Normalized tables with foreign keys and transactions.
    #[default]
    Relational,
    /// One JSON document per ticket and per comment.
    Document,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// Import sample tickets when the store starts out empty.
    #[serde(default)]
    pub seed: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_db_path(),
            seed: false,
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("helpdesk.db")
}

/// Cross-origin settings for the browser client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    #[serde(default = "default_origins")]
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: default_origins(),
        }
    }
}

fn default_origins() -> Vec<String> {
    vec!["http://localhost:4200".to_string()]
}
