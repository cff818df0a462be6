use super::AssetSource;
use crate::config::Config;
use crate::error::{DecodeError, FetchError, Result};
use crate::types::{Asset, AssetListResponse, AssetResponse};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

pub struct CoinCap {
    client: reqwest::Client,
    assets_url: String,
    api_key: String,
}

impl CoinCap {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            assets_url: config.endpoints.assets_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl AssetSource for CoinCap {
    fn name(&self) -> &str {
        "coincap"
    }

    async fn list(&self, limit: u64, offset: u64) -> Result<Vec<Asset>> {
        debug!("GET {} limit={} offset={}", self.assets_url, limit, offset);
        let resp = self
            .client
            .get(&self.assets_url)
            .query(&[
                ("apiKey", self.api_key.clone()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let parsed: AssetListResponse = serde_json::from_slice(&body)
            .map_err(|e| DecodeError::new("asset list", e))?;
        Ok(parsed.data)
    }

    async fn detail(&self, id: &str) -> Result<AssetResponse> {
        let url = format!("{}/{}", self.assets_url, id);
        debug!("GET {}", url);
        let resp = self
            .client
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;
        match decode_detail(&body) {
            Ok(response) => Ok(response),
            Err(_) if !status.is_success() => Err(status_error(status, &body)),
            Err(e) => Err(e.into()),
        }
    }
}

/// Error-shaped bodies win over the data payload, matching how the upstream
/// reports unknown identifiers.
fn decode_detail(body: &[u8]) -> std::result::Result<AssetResponse, DecodeError> {
    const ENDPOINT: &str = "asset detail";

    let mut value: Value = serde_json::from_slice(body).map_err(|e| DecodeError::new(ENDPOINT, e))?;
    if let Some(error) = value.get("error") {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Ok(AssetResponse::Error(message));
    }

    let data = value
        .get_mut("data")
        .map(Value::take)
        .ok_or_else(|| DecodeError::new(ENDPOINT, serde::de::Error::missing_field("data")))?;
    let asset: Asset = serde_json::from_value(data).map_err(|e| DecodeError::new(ENDPOINT, e))?;
    Ok(AssetResponse::Data(asset))
}

fn status_error(status: reqwest::StatusCode, body: &[u8]) -> FetchError {
    FetchError::Status {
        status,
        body: String::from_utf8_lossy(body).into_owned(),
    }
}
