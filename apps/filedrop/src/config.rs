//! filedrop configuration.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/filedrop/config.toml`
//! - Windows: `%APPDATA%/filedrop/config.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use filedrop_client::ClientConfig;
use filedrop_protocol::constants::{CONNECT_TIMEOUT, DEFAULT_PORT};
use filedrop_server::ServerConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Port the server listens on and the client connects to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory the server stores uploads in.
    #[serde(default = "default_dir")]
    pub storage_dir: String,

    /// Host the client connects to.
    #[serde(default = "default_server_host")]
    pub server_host: String,

    /// Directory the client writes downloads to.
    #[serde(default = "default_dir")]
    pub download_dir: String,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_dir() -> String {
    ".".into()
}

fn default_server_host() -> String {
    "127.0.0.1".into()
}

fn default_connect_timeout() -> u64 {
    CONNECT_TIMEOUT.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            storage_dir: default_dir(),
            server_host: default_server_host(),
            download_dir: default_dir(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Config {
    /// Loads the configuration from the platform path, creating a default
    /// file if none exists.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            port: self.port,
            storage_dir: PathBuf::from(&self.storage_dir),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            server_addr: format!("{}:{}", self.server_host, self.port),
            download_dir: PathBuf::from(&self.download_dir),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("filedrop")
            .join("config.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("filedrop").join("config.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/filedrop/config.toml"))
    }
}
