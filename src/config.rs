use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_server_config")]
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default = "default_links_config")]
    pub links: LinksConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Expected value of the pre-shared key header.
    pub api_psk: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LinksConfig {
    /// Base URL for stored-message permalinks.
    #[serde(default = "default_link_base")]
    pub base_url: String,
}

fn default_bind() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_link_base() -> String {
    "https://matrix.example.com".to_string()
}

fn default_server_config() -> ServerConfig {
    ServerConfig {
        bind: default_bind(),
    }
}

fn default_links_config() -> LinksConfig {
    LinksConfig {
        base_url: default_link_base(),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;

        if config.auth.api_psk.is_empty() {
            anyhow::bail!("[auth] api_psk must not be empty");
        }

        Ok(config)
    }
}
