//! Runtime configuration.
//!
//! Values resolve in this order: command-line flag, environment variable (for
//! the flags that declare one), TOML file given with `--config`, compiled
//! default. Only the binary applies flags; the library sees the merged result.

use crate::error::{ClusterError, Result};
use crate::worker::{DEFAULT_CHUNK_LINES, default_pool_size};

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_BASE_PORT: u16 = 7000;
pub const DEFAULT_OUTPUT_EXTENSION: &str = "out";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Stdout,
    /// Sibling of the input file with its extension replaced.
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClusterConfig {
    /// Address every worker listens on.
    pub host: String,
    /// Worker of rank `r` listens on `base_port + r`.
    pub base_port: u16,
    /// Conversation identifier stamped on every frame.
    pub conversation: u32,
    pub chunk_lines: usize,
    /// Chunk pool size; `None` picks one less than the available cores.
    pub pool_size: Option<usize>,
    /// How many times the dispatcher tries to reach each worker.
    pub connect_attempts: u32,
    pub connect_backoff_ms: u64,
    pub output: OutputMode,
    pub output_extension: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            base_port: DEFAULT_BASE_PORT,
            conversation: crate::channel::frame::DEFAULT_CONVERSATION,
            chunk_lines: DEFAULT_CHUNK_LINES,
            pool_size: None,
            connect_attempts: 50,
            connect_backoff_ms: 100,
            output: OutputMode::Stdout,
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
        }
    }
}

impl ClusterConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ClusterError::Startup(format!("invalid configuration: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClusterError::Startup(format!("cannot read configuration {:?}: {}", path, e))
        })?;
        let config = Self::from_toml_str(&content)?;

        tracing::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size.unwrap_or_else(default_pool_size).max(1)
    }

    pub fn connect_backoff(&self) -> Duration {
        Duration::from_millis(self.connect_backoff_ms)
    }

    /// Listening address of the worker with the given rank.
    pub fn worker_addr(&self, rank: usize) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| ClusterError::Startup(format!("invalid host '{}': {}", self.host, e)))?;

        let port = u16::try_from(rank)
            .ok()
            .and_then(|rank| self.base_port.checked_add(rank))
            .ok_or_else(|| {
                ClusterError::Startup(format!(
                    "rank {} does not fit above base port {}",
                    rank, self.base_port
                ))
            })?;

        Ok(SocketAddr::new(ip, port))
    }

    /// `corpus.txt` -> `corpus.out` (with the default extension).
    pub fn output_path(&self, input: &Path) -> PathBuf {
        input.with_extension(&self.output_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClusterConfig::default();

        assert_eq!(config.chunk_lines, 20);
        assert_eq!(config.output, OutputMode::Stdout);
        assert!(config.pool_size() >= 1);
        assert_eq!(
            config.worker_addr(2).unwrap(),
            "127.0.0.1:7002".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClusterConfig::from_toml_str(
            r#"
            base_port = 9100
            chunk_lines = 5
            pool_size = 0
            output = "file"
            "#,
        )
        .unwrap();

        assert_eq!(config.base_port, 9100);
        assert_eq!(config.chunk_lines, 5);
        assert_eq!(config.pool_size(), 1);
        assert_eq!(config.output, OutputMode::File);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.output_extension, "out");
    }

    #[test]
    fn test_invalid_toml_is_startup_failure() {
        let result = ClusterConfig::from_toml_str("chunk_lines = \"many\"");
        assert!(matches!(result, Err(ClusterError::Startup(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cluster.toml");
        std::fs::write(&path, "host = \"0.0.0.0\"\nconversation = 4\n").unwrap();

        let config = ClusterConfig::load(&path).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.conversation, 4);
    }

    #[test]
    fn test_output_path_replaces_extension() {
        let config = ClusterConfig::default();

        assert_eq!(
            config.output_path(Path::new("data/corpus.txt")),
            PathBuf::from("data/corpus.out")
        );
        assert_eq!(config.output_path(Path::new("plain")), PathBuf::from("plain.out"));
    }

    #[test]
    fn test_worker_addr_rejects_bad_host_and_overflow() {
        let mut config = ClusterConfig::default();
        config.base_port = u16::MAX;
        assert!(config.worker_addr(1).is_err());

        config.base_port = 7000;
        config.host = "not-an-ip".to_string();
        assert!(config.worker_addr(1).is_err());
    }
}
