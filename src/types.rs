use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One asset as served by the CoinCap `/assets` endpoints. Numeric values
/// arrive as strings and any of them may be `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub supply: Option<String>,
    #[serde(default)]
    pub max_supply: Option<String>,
    #[serde(default)]
    pub market_cap_usd: Option<String>,
    #[serde(default)]
    pub volume_usd24_hr: Option<String>,
    #[serde(default)]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub change_percent24_hr: Option<String>,
    #[serde(default)]
    pub vwap24_hr: Option<String>,
    #[serde(default)]
    pub explorer: Option<String>,
}

/// An [`Asset`] together with the currency strings derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayAsset {
    #[serde(flatten)]
    pub asset: Asset,
    pub formatted_price: String,
    pub formatted_market: String,
    pub formatted_volume: String,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetListResponse {
    pub data: Vec<Asset>,
}

/// Body of the single-asset endpoint: either the asset or an error message.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetResponse {
    Data(Asset),
    Error(String),
}

/// Profit/loss class of a 24h change. Only a strictly positive change is a
/// profit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeClass {
    Profit,
    Loss,
}

impl ChangeClass {
    pub fn of(change: f64) -> Self {
        if change > 0.0 {
            ChangeClass::Profit
        } else {
            ChangeClass::Loss
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_camel_case_fields_and_nulls() {
        let asset: Asset = serde_json::from_value(json!({
            "id": "bitcoin",
            "rank": "1",
            "symbol": "BTC",
            "name": "Bitcoin",
            "supply": "19500000.0",
            "maxSupply": null,
            "marketCapUsd": "850000000000",
            "volumeUsd24Hr": "12000000000",
            "priceUsd": "43250.55",
            "changePercent24Hr": "-1.25",
            "vwap24Hr": "43100.1",
            "explorer": "https://blockchain.info/"
        }))
        .unwrap();

        assert_eq!(asset.id, "bitcoin");
        assert_eq!(asset.price_usd.as_deref(), Some("43250.55"));
        assert_eq!(asset.volume_usd24_hr.as_deref(), Some("12000000000"));
        assert_eq!(asset.change_percent24_hr.as_deref(), Some("-1.25"));
        assert_eq!(asset.vwap24_hr.as_deref(), Some("43100.1"));
        assert_eq!(asset.max_supply, None);
    }

    #[test]
    fn missing_identity_fields_are_rejected() {
        let result: Result<Asset, _> = serde_json::from_value(json!({
            "name": "Bitcoin",
            "symbol": "BTC"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn change_class_is_profit_only_when_strictly_positive() {
        assert_eq!(ChangeClass::of(0.0001), ChangeClass::Profit);
        assert_eq!(ChangeClass::of(0.0), ChangeClass::Loss);
        assert_eq!(ChangeClass::of(-0.0), ChangeClass::Loss);
        assert_eq!(ChangeClass::of(-3.2), ChangeClass::Loss);
        assert_eq!(ChangeClass::of(f64::NAN), ChangeClass::Loss);
    }
}
