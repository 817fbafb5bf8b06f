use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use globe_shared::GlobeConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Play history loaded at startup (streaming-API JSON or a record array)
    pub history_path: Option<PathBuf>,
    /// Shuffle each incoming history batch with this seed before placement
    pub shuffle_seed: Option<u64>,
    pub max_connections: usize,
    /// Origins allowed by CORS. Empty allows any origin.
    pub allowed_origins: Vec<String>,
    pub broadcast_capacity: usize,
    pub globe: GlobeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9002".to_string(),
            history_path: None,
            shuffle_seed: None,
            max_connections: 256,
            allowed_origins: Vec::new(),
            broadcast_capacity: 64,
            globe: GlobeConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read a TOML config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "listen_addr '{}' is not a socket address",
                self.listen_addr
            )));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be >= 1".to_string(),
            ));
        }
        if self.broadcast_capacity == 0 {
            return Err(ConfigError::Invalid(
                "broadcast_capacity must be >= 1".to_string(),
            ));
        }
        self.globe.validate().map_err(ConfigError::Invalid)
    }
}
