use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub index: IndexConfig,
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
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration (the repack collection)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("repackhub.db")
}

/// Search index configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    /// Maximum results per search (default: 100)
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    /// Capacity of the worker's command queue (default: 64)
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
    /// Capacity of the build notification channel (default: 16)
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Queue a build as soon as the worker starts (default: true)
    #[serde(default = "default_build_on_startup")]
    pub build_on_startup: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            search_limit: default_search_limit(),
            command_buffer: default_command_buffer(),
            event_buffer: default_event_buffer(),
            build_on_startup: default_build_on_startup(),
        }
    }
}

fn default_search_limit() -> usize {
    100
}

fn default_command_buffer() -> usize {
    64
}

fn default_event_buffer() -> usize {
    16
}

fn default_build_on_startup() -> bool {
    true
}
