#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the Fogos.PT incident watcher.
//!
//! `run` (the default) polls the feed on a fixed period and pushes
//! notifications through the console transport while reading subscriber
//! commands from stdin. `show` and `districts` are one-shot helpers that
//! skip the stores entirely.

mod console;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use fogo_watch_engine::scheduler::{DEFAULT_INITIAL_DELAY, DEFAULT_POLL_PERIOD};
use fogo_watch_engine::{Engine, Scheduler};
use fogo_watch_feed::{DEFAULT_FEED_URL, FeedClient, IncidentFeed as _};
use fogo_watch_incident_models::District;
use fogo_watch_notify::{Notifier, Transport, render};
use fogo_watch_store::{open_preferences, open_snapshot};

#[derive(Parser)]
#[command(name = "fogo_watch_cli", about = "Fogos.PT incident watcher")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the feed and push notifications; subscriber commands are read
    /// from stdin
    Run {
        /// Feed endpoint (falls back to the `FOGO_WATCH_FEED_URL` env var)
        #[arg(long)]
        feed_url: Option<String>,
        /// Directory holding `users.json` and `incidents.json` (falls back
        /// to the `FOGO_WATCH_DATA_DIR` env var, then `data`)
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Seconds between polling cycles (must be at least 1)
        #[arg(long, default_value_t = DEFAULT_POLL_PERIOD.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
        period: u64,
        /// Seconds before the first polling cycle
        #[arg(long, default_value_t = DEFAULT_INITIAL_DELAY.as_secs())]
        initial_delay: u64,
    },
    /// Fetch the feed once and print the active incidents
    Show {
        /// Only show incidents in this district (e.g. "Faro")
        #[arg(long)]
        district: Option<String>,
        /// Feed endpoint (falls back to the `FOGO_WATCH_FEED_URL` env var)
        #[arg(long)]
        feed_url: Option<String>,
    },
    /// List the districts a subscriber can choose from
    Districts,
}

fn resolve_feed_url(flag: Option<String>) -> String {
    flag.or_else(|| std::env::var("FOGO_WATCH_FEED_URL").ok())
        .unwrap_or_else(|| DEFAULT_FEED_URL.to_string())
}

fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var("FOGO_WATCH_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return run(None, None, DEFAULT_POLL_PERIOD, DEFAULT_INITIAL_DELAY).await;
    };

    match command {
        Commands::Run {
            feed_url,
            data_dir,
            period,
            initial_delay,
        } => {
            run(
                feed_url,
                data_dir,
                Duration::from_secs(period),
                Duration::from_secs(initial_delay),
            )
            .await
        }
        Commands::Show { district, feed_url } => show(district, feed_url).await,
        Commands::Districts => {
            for district in District::menu() {
                println!("{district}");
            }
            Ok(())
        }
    }
}

async fn run(
    feed_url: Option<String>,
    data_dir: Option<PathBuf>,
    period: Duration,
    initial_delay: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = resolve_data_dir(data_dir);
    let preferences = Arc::new(open_preferences(&data_dir)?);
    let snapshot = Arc::new(open_snapshot(&data_dir)?);

    let feed = Arc::new(FeedClient::new(&resolve_feed_url(feed_url))?);
    let transport: Arc<dyn Transport> = Arc::new(console::ConsoleTransport);
    let engine = Arc::new(Engine::new(
        feed,
        preferences,
        snapshot,
        Notifier::new(transport),
    ));

    let _poller = Scheduler::new(Arc::clone(&engine), period, initial_delay).spawn();

    log::info!("Type /start, /ver or /alterar <district>; close stdin to exit");
    console::command_loop(engine).await?;
    Ok(())
}

async fn show(
    district: Option<String>,
    feed_url: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = match district {
        Some(ref name) => name
            .parse::<District>()
            .map_err(|_| format!("Unknown district: {name}"))?,
        None => District::Todos,
    };

    let feed = FeedClient::new(&resolve_feed_url(feed_url))?;
    let incidents = feed.fetch_active().await?;
    let filtered: Vec<_> = incidents
        .iter()
        .filter(|incident| filter.covers(incident.district))
        .collect();

    if filtered.is_empty() {
        println!("{}", render::NO_INCIDENTS_TEXT);
        return Ok(());
    }
    for incident in filtered {
        println!("{}\n", render::render_incident(incident));
    }
    Ok(())
}
