use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Where the embedding server lives and which routes it serves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_stream_path")]
    pub stream_path: String,
    #[serde(default = "default_process_path")]
    pub process_path: String,
    /// Seconds between connection attempts before first contact.
    #[serde(default = "default_connect_retry_secs")]
    pub connect_retry_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory the file picker opens in.
    #[serde(default = "default_music_dir")]
    pub music_dir: PathBuf,
}

impl ServerConfig {
    pub fn stream_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.stream_path)
    }

    pub fn process_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.process_path
        )
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            stream_path: default_stream_path(),
            process_path: default_process_path(),
            connect_retry_secs: default_connect_retry_secs(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            music_dir: default_music_dir(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_stream_path() -> String {
    "/stream".to_string()
}

fn default_process_path() -> String {
    "/process".to_string()
}

fn default_connect_retry_secs() -> u64 {
    3
}

fn default_music_dir() -> PathBuf {
    dirs::audio_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.server.stream_url(), "http://127.0.0.1:5000/stream");
        assert_eq!(config.server.process_url(), "http://127.0.0.1:5000/process");
        assert_eq!(config.server.connect_retry_secs, 3);
    }

    #[test]
    fn test_trailing_slash_in_base_url() {
        let server = ServerConfig {
            base_url: "http://example.com:5000/".to_string(),
            ..ServerConfig::default()
        };
        assert_eq!(server.stream_url(), "http://example.com:5000/stream");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            base_url = "http://10.0.0.2:5000"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.base_url, "http://10.0.0.2:5000");
        assert_eq!(config.server.stream_path, "/stream");
    }
}
