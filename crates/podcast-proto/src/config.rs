use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub mpv: MpvConfig,
}

/// Settings for the `/api/podcast` relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upstream RSS document relayed verbatim.
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    #[serde(default = "default_cache_control")]
    pub cache_control: String,
}

/// Where the player fetches the (proxied) feed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Rows the episode grid must be scrolled past before the mini-player shows.
    #[serde(default = "default_mini_player_threshold")]
    pub mini_player_threshold: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MpvConfig {
    #[serde(default = "default_volume")]
    pub default_volume: f32,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            feed_url: default_feed_url(),
            cache_control: default_cache_control(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            proxy_url: default_proxy_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            mini_player_threshold: default_mini_player_threshold(),
        }
    }
}

impl Default for MpvConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8989
}

fn default_feed_url() -> String {
    "https://anchor.fm/s/podcast/podcast/rss".to_string()
}

fn default_cache_control() -> String {
    "s-maxage=300, stale-while-revalidate".to_string()
}

fn default_proxy_url() -> String {
    format!("http://{}:{}/api/podcast", default_bind_address(), default_port())
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_mini_player_threshold() -> usize {
    3
}

fn default_volume() -> f32 {
    0.5
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
            proxy: ProxyConfig::default(),
            feed: FeedConfig::default(),
            ui: UiConfig::default(),
            mpv: MpvConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.proxy.port, 8989);
        assert_eq!(config.proxy.bind_address, "127.0.0.1");
        assert!(config.proxy.feed_url.starts_with("https://"));
        assert_eq!(config.feed.proxy_url, "http://127.0.0.1:8989/api/podcast");
        assert_eq!(config.ui.mini_player_threshold, 3);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [proxy]
            feed_url = "https://example.com/rss"

            [ui]
            mini_player_threshold = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.proxy.feed_url, "https://example.com/rss");
        assert_eq!(config.proxy.port, 8989);
        assert_eq!(config.proxy.cache_control, "s-maxage=300, stale-while-revalidate");
        assert_eq!(config.feed.timeout_secs, 20);
        assert_eq!(config.ui.mini_player_threshold, 8);
        assert_eq!(config.mpv.default_volume, 0.5);
    }
}
