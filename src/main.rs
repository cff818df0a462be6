mod app;
mod config;
mod error;
mod format;
mod output;
mod router;
mod screens;
mod sources;
mod types;

use anyhow::{Context, Result};
use app::{App, Command, Flow, Screen};
use clap::{Parser, Subcommand};
use output::OutputFormat;
use router::Route;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "coincap-browser",
    about = "Browse CoinCap asset listings and per-asset price details"
)]
struct Args {
    /// Optional YAML file overriding the CoinCap endpoints
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CoinCap API key
    #[arg(long, env = "COINCAP_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,

    /// Output format for rendered views
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Interactive browser (default)
    Browse {
        /// Route to start at, e.g. "/" or "/detail/bitcoin"
        #[arg(long, default_value = "/")]
        route: Route,
    },
    /// Print the accumulated listing after loading N pages
    List {
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        pages: u64,
    },
    /// Print the detail view for one asset identifier
    Show { id: String },
}

const HELP: &str = "\
commands:
  more | m              load the next page
  retry | r             reload the page that failed
  search <id> | /<id>   open an asset by identifier
  open <row|id>         open a listed asset
  back | b              return to the listing
  quit | q              exit";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let cfg = config::Config::load(args.config.as_deref(), args.api_key.clone())
        .context("loading configuration")?;
    info!("Using CoinCap endpoint {}", cfg.endpoints.assets_url);

    let client = reqwest::Client::builder()
        .user_agent(cfg.endpoints.user_agent.as_str())
        .build()
        .context("building HTTP client")?;
    let source: Arc<dyn sources::AssetSource> =
        Arc::new(sources::coincap::CoinCap::new(client, &cfg));
    info!("Registered asset source '{}'", source.name());

    match args.command.unwrap_or(Cmd::Browse {
        route: Route::Listing,
    }) {
        Cmd::Browse { route } => browse(App::new(source, route), &cfg, args.output).await,
        Cmd::List { pages } => {
            let mut app = App::new(source, Route::Listing);
            for _ in 1..pages {
                app.execute(Command::More);
            }
            app.settle().await;
            print_screen(&app, &cfg, args.output)
        }
        Cmd::Show { id } => {
            let mut app = App::new(source, Route::Detail(id));
            app.settle().await;
            print_screen(&app, &cfg, args.output)
        }
    }
}

async fn browse(mut app: App, cfg: &config::Config, format: OutputFormat) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_screen(&app, cfg, format)?;
    println!("{HELP}");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading input")? else {
                    break;
                };
                let command = match Command::parse(&line) {
                    Ok(command) => command,
                    Err(message) => {
                        println!("{message}");
                        continue;
                    }
                };
                if command == Command::Help {
                    println!("{HELP}");
                    continue;
                }
                let before = app.route();
                if app.execute(command) == Flow::Quit {
                    break;
                }
                if app.route() != before {
                    print_screen(&app, cfg, format)?;
                }
            }
            completion = app.next_completion() => {
                if app.apply(completion) {
                    print_screen(&app, cfg, format)?;
                }
            }
        }
    }
    Ok(())
}

fn print_screen(app: &App, cfg: &config::Config, format: OutputFormat) -> Result<()> {
    let rendered = match (app.screen(), format) {
        (Screen::Listing(screen), OutputFormat::Table) => output::listing_table(screen, cfg),
        (Screen::Listing(screen), OutputFormat::Json) => output::listing_json(screen, cfg)?,
        (Screen::Detail(screen), OutputFormat::Table) => output::detail_view(screen, cfg),
        (Screen::Detail(screen), OutputFormat::Json) => output::detail_json(screen, cfg)?,
    };
    if !rendered.is_empty() {
        println!("{}", rendered);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_pages_defaults_to_one() {
        let args = Args::try_parse_from(["coincap-browser", "list"]).unwrap();
        assert!(matches!(args.command, Some(Cmd::List { pages: 1 })));
    }

    #[test]
    fn test_list_rejects_zero_pages() {
        assert!(Args::try_parse_from(["coincap-browser", "list", "--pages", "0"]).is_err());
        let args = Args::try_parse_from(["coincap-browser", "list", "--pages", "3"]).unwrap();
        assert!(matches!(args.command, Some(Cmd::List { pages: 3 })));
    }
}
