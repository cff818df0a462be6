use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_ASSETS_URL: &str = "https://rest.coincap.io/v3/assets";
pub const DEFAULT_ICON_BASE_URL: &str = "https://assets.coincap.io/assets/icons";
pub const DEFAULT_USER_AGENT: &str = "coincap-browser/0.1";

/// Loaded once at startup and passed to everything that talks to CoinCap.
#[derive(Debug, Clone)]
pub struct Config {
    /// Sent verbatim as `apiKey`; a missing or bad key shows up as an
    /// upstream error.
    pub api_key: String,
    pub endpoints: Endpoints,
}

/// Optional YAML overrides for the upstream locations.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Endpoints {
    pub assets_url: String,
    pub icon_base_url: String,
    pub user_agent: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            assets_url: DEFAULT_ASSETS_URL.to_string(),
            icon_base_url: DEFAULT_ICON_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    pub fn new(api_key: String, endpoints: Endpoints) -> Result<Self> {
        let config = Self {
            api_key,
            endpoints: endpoints.normalized(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: Option<&Path>, api_key: String) -> Result<Self> {
        let endpoints = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_yaml::from_str(&contents)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => Endpoints::default(),
        };
        Self::new(api_key, endpoints)
    }

    fn validate(&self) -> Result<()> {
        for (field, url) in [
            ("assets_url", &self.endpoints.assets_url),
            ("icon_base_url", &self.endpoints.icon_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{field} must start with http:// or https://, got '{url}'");
            }
        }
        Ok(())
    }

    /// Icon location for an asset, keyed by its lowercased symbol.
    pub fn icon_url(&self, symbol: &str) -> String {
        format!(
            "{}/{}@2x.png",
            self.endpoints.icon_base_url,
            symbol.to_lowercase()
        )
    }
}

impl Endpoints {
    fn normalized(self) -> Self {
        Self {
            assets_url: self.assets_url.trim().trim_end_matches('/').to_string(),
            icon_base_url: self.icon_base_url.trim().trim_end_matches('/').to_string(),
            user_agent: self.user_agent,
        }
    }
}
