use crate::config::Config;
use crate::format::{format_change, parse_number};
use crate::screens::{DetailScreen, DetailState, ListingScreen};
use crate::types::{ChangeClass, DisplayAsset};
use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use serde::Serialize;

pub const LOADING_DETAILS: &str = "Loading details, please wait...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// A display record with everything the views derive from it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssetView<'a> {
    #[serde(flatten)]
    asset: &'a DisplayAsset,
    icon_url: String,
    change: String,
    change_class: ChangeClass,
}

impl<'a> AssetView<'a> {
    fn new(asset: &'a DisplayAsset, config: &Config) -> Self {
        let change = parse_number(asset.asset.change_percent24_hr.as_deref());
        Self {
            asset,
            icon_url: config.icon_url(&asset.asset.symbol),
            change: format_change(change),
            change_class: ChangeClass::of(change),
        }
    }

    fn colored_change(&self, width: usize) -> ColoredString {
        let cell = format!("{:>width$}", self.change);
        match self.change_class {
            ChangeClass::Profit => cell.green(),
            ChangeClass::Loss => cell.red(),
        }
    }
}

pub fn listing_table(screen: &ListingScreen, config: &Config) -> String {
    let mut out = format!(
        "\n{:<5} {:<28} {:>14} {:>16} {:>14} {:>12}  {}\n",
        "#", "Asset", "Market cap", "Price", "Volume", "Change 24h", "Icon"
    );
    out.push_str(&"-".repeat(110));
    out.push('\n');

    for (row, entry) in screen.entries().iter().enumerate() {
        let view = AssetView::new(entry, config);
        let label = format!("{} | {}", entry.asset.name, entry.asset.symbol);
        out.push_str(&format!(
            "{:<5} {:<28} {:>14} {:>16} {:>14} {}  {}\n",
            row + 1,
            label,
            entry.formatted_market,
            entry.formatted_price,
            entry.formatted_volume,
            view.colored_change(12),
            view.icon_url,
        ));
    }

    out.push_str(&format!(
        "\n{} asset(s), next page after offset {}\n",
        screen.entries().len(),
        screen.offset()
    ));

    let mut failures = screen.failures().peekable();
    if failures.peek().is_some() {
        out.push('\n');
        for failure in failures {
            out.push_str(&format!(
                "Could not load assets at offset {} ({})\n",
                failure.offset, failure.reason
            ));
        }
        out.push_str("Type `retry` to try again.\n");
    }
    out
}

pub fn detail_view(screen: &DetailScreen, config: &Config) -> String {
    let display = match screen.state() {
        DetailState::Loading => return format!("{LOADING_DETAILS}\n"),
        DetailState::Redirecting => return String::new(),
        DetailState::Loaded(display) => display,
    };
    let view = AssetView::new(display, config);
    let asset = &display.asset;
    let or_dash = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    let mut out = format!("\n{} | {}\n", asset.name.as_str().bold(), asset.symbol);
    out.push_str(&"-".repeat(40));
    out.push('\n');
    for (label, value) in [
        ("Rank", or_dash(&asset.rank)),
        ("Price", display.formatted_price.clone()),
        ("Market cap", display.formatted_market.clone()),
        ("Volume 24h", display.formatted_volume.clone()),
    ] {
        out.push_str(&format!("{:<12} {}\n", label, value));
    }
    out.push_str(&format!("{:<12} {}\n", "Change 24h", view.colored_change(0)));
    for (label, value) in [
        ("VWAP 24h", or_dash(&asset.vwap24_hr)),
        ("Supply", or_dash(&asset.supply)),
        ("Max supply", or_dash(&asset.max_supply)),
        ("Explorer", or_dash(&asset.explorer)),
        ("Icon", view.icon_url.clone()),
        ("Updated", display.fetched_at.to_rfc3339()),
    ] {
        out.push_str(&format!("{:<12} {}\n", label, value));
    }
    out
}

pub fn listing_json(screen: &ListingScreen, config: &Config) -> Result<String> {
    let views: Vec<AssetView> = screen
        .entries()
        .iter()
        .map(|entry| AssetView::new(entry, config))
        .collect();
    serde_json::to_string_pretty(&views).context("serializing asset listing")
}

pub fn detail_json(screen: &DetailScreen, config: &Config) -> Result<String> {
    match screen.state() {
        DetailState::Loaded(display) => serde_json::to_string_pretty(&AssetView::new(display, config))
            .context("serializing asset detail"),
        DetailState::Loading | DetailState::Redirecting => Ok("null".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::types::{Asset, AssetResponse};

    fn asset(id: &str, symbol: &str, change: &str) -> Asset {
        Asset {
            id: id.to_string(),
            name: id.to_string(),
            symbol: symbol.to_string(),
            rank: Some("1".to_string()),
            supply: Some("19500000".to_string()),
            max_supply: None,
            market_cap_usd: Some("850000000000".to_string()),
            volume_usd24_hr: Some("12000000000".to_string()),
            price_usd: Some("43250.55".to_string()),
            change_percent24_hr: Some(change.to_string()),
            vwap24_hr: None,
            explorer: None,
        }
    }

    fn config() -> Config {
        Config::load(None, String::new()).unwrap()
    }

    #[test]
    fn test_listing_rows_follow_entries() {
        let (mut screen, request) = ListingScreen::mount(1);
        screen.apply(
            request,
            Ok(vec![asset("bitcoin", "BTC", "1.23456"), asset("ethereum", "ETH", "-2")]),
        );

        let table = listing_table(&screen, &config());
        let rows: Vec<&str> = table.lines().filter(|l| l.contains(" | ")).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("bitcoin | BTC"));
        assert!(rows[0].contains("$850B"));
        assert!(rows[0].contains("$43,250.55"));
        assert!(rows[0].contains("$12B"));
        assert!(rows[0].contains("1.2346"));
        assert!(rows[0].contains("https://assets.coincap.io/assets/icons/btc@2x.png"));
        assert!(rows[1].contains("-2.0000"));
    }

    #[test]
    fn test_empty_listing_is_header_only() {
        let (screen, _) = ListingScreen::mount(1);
        let table = listing_table(&screen, &config());
        assert_eq!(table.lines().filter(|l| l.contains(" | ")).count(), 0);
        assert!(table.contains("Market cap"));
    }

    #[test]
    fn test_listing_failure_shows_retry_hint() {
        let (mut screen, request) = ListingScreen::mount(1);
        screen.apply(request, Err(FetchError::Upstream("nope".into())));
        assert!(listing_table(&screen, &config()).contains("retry"));
    }

    #[test]
    fn test_retry_hint_names_every_failed_offset() {
        let (mut screen, first) = ListingScreen::mount(1);
        let second = screen.load_more();
        screen.apply(first, Err(FetchError::Upstream("first".into())));
        screen.apply(second, Err(FetchError::Upstream("second".into())));

        let table = listing_table(&screen, &config());
        assert!(table.contains("offset 0 (upstream error: first)"));
        assert!(table.contains("offset 10 (upstream error: second)"));
        assert_eq!(table.matches("Type `retry`").count(), 1);
    }

    #[test]
    fn test_missing_detail_fields_render_as_dash() {
        let (mut screen, request) = DetailScreen::mount(1, "bitcoin".to_string());
        screen.apply(request, Ok(AssetResponse::Data(asset("bitcoin", "BTC", "0"))));

        let view = detail_view(&screen, &config());
        let max_supply = view.lines().find(|l| l.starts_with("Max supply")).unwrap();
        assert_eq!(max_supply.trim_end(), format!("{:<12} -", "Max supply"));
        assert!(!view.contains('\u{2014}'));
    }

    #[test]
    fn test_detail_loading_shows_only_waiting_message() {
        let (screen, _) = DetailScreen::mount(1, "bitcoin".to_string());
        assert_eq!(detail_view(&screen, &config()), format!("{LOADING_DETAILS}\n"));
        assert_eq!(detail_json(&screen, &config()).unwrap(), "null");
    }

    #[test]
    fn test_detail_loaded_view() {
        let (mut screen, request) = DetailScreen::mount(1, "bitcoin".to_string());
        screen.apply(request, Ok(AssetResponse::Data(asset("bitcoin", "BTC", "0"))));

        let view = detail_view(&screen, &config());
        assert!(view.contains("BTC"));
        assert!(view.contains("$43,250.55"));
        assert!(view.contains("$850B"));
        assert!(view.contains("0.0000"));
        assert!(view.contains("btc@2x.png"));
    }

    #[test]
    fn test_json_carries_change_class() {
        let (mut screen, request) = ListingScreen::mount(1);
        screen.apply(
            request,
            Ok(vec![asset("bitcoin", "BTC", "0.5"), asset("tether", "USDT", "0")]),
        );

        let json: serde_json::Value =
            serde_json::from_str(&listing_json(&screen, &config()).unwrap()).unwrap();
        assert_eq!(json[0]["changeClass"], "profit");
        assert_eq!(json[0]["change"], "0.5000");
        assert_eq!(json[0]["formattedPrice"], "$43,250.55");
        assert_eq!(json[0]["formattedMarket"], "$850B");
        assert_eq!(json[0]["priceUsd"], "43250.55");
        assert!(json[0].get("fetchedAt").is_some());
        assert!(json[0].get("formatted_price").is_none());
        assert_eq!(json[1]["changeClass"], "loss");
        assert_eq!(json[1]["iconUrl"], "https://assets.coincap.io/assets/icons/usdt@2x.png");
    }
}
