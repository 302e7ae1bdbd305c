use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod alert;
mod checker;
mod config;
mod discord;
mod error;
mod form;
mod models;
mod report;
mod results;
mod scheduler;
mod session;
mod traits;

use alert::{FallbackNotifier, TerminalBell};
use config::{CheckerConfig, SiteConfig, Station, TimeWindow};
use discord::DiscordNotifier;
use scheduler::{RunMode, Scheduler};

/// Taiwan Railway seat availability checker
#[derive(Parser, Debug)]
#[command(name = "tra-seat-watcher", version)]
struct Cli {
    /// Passenger ID submitted with every search
    #[arg(long, env = "TRA_PID")]
    pid: String,

    /// Ride dates to check (YYYY/MM/DD), comma or space separated
    #[arg(long, env = "TRA_DATES", value_delimiter = ',', num_args = 1.., required = true)]
    dates: Vec<String>,

    /// Number of seats to ask for
    #[arg(long, default_value_t = 1, value_name = "N")]
    qty: u32,

    /// Origin station as CODE-NAME
    #[arg(long = "from", env = "TRA_FROM", default_value = "2220-清水")]
    origin: Station,

    /// Destination station as CODE-NAME
    #[arg(long = "to", env = "TRA_TO", default_value = "1000-臺北")]
    destination: Station,

    /// Departure window HH:MM-HH:MM; repeat for several (default 06:00-14:00 and 14:00-22:00)
    #[arg(long = "window", value_name = "HH:MM-HH:MM")]
    windows: Vec<TimeWindow>,

    /// Keep checking until Ctrl+C
    #[arg(long = "loop")]
    continuous: bool,

    /// Seconds between passes in loop mode
    #[arg(long, default_value_t = 60, value_name = "SECS")]
    interval: u64,

    /// Booking site root
    #[arg(long, env = "TRA_BASE_URL", default_value = config::DEFAULT_BASE_URL)]
    base_url: String,
}

/// Flatten date arguments, splitting each on commas and whitespace.
fn split_dates(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|value| value.split(|c: char| c == ',' || c.is_whitespace()))
        .filter(|date| !date.is_empty())
        .map(str::to_string)
        .collect()
}

impl Cli {
    fn into_config(self) -> Result<CheckerConfig> {
        let mut config = CheckerConfig::new(self.origin, self.destination, self.pid)
            .with_site(SiteConfig::new(self.base_url))
            .with_seat_qty(self.qty)
            .with_dates(split_dates(&self.dates));
        if !self.windows.is_empty() {
            config = config.with_windows(self.windows);
        }
        Ok(config.validated()?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mode = if cli.continuous {
        RunMode::Every(Duration::from_secs(cli.interval.max(1)))
    } else {
        RunMode::Once
    };
    let config = cli.into_config().context("invalid configuration")?;

    info!(
        "Checking {} → {} for {} date(s)",
        config.origin,
        config.destination,
        config.dates.len()
    );

    let notifier = FallbackNotifier::new(
        DiscordNotifier::from_env(config.site.query_page_url()),
        TerminalBell,
    );
    let sessions = config.site.clone();
    let scheduler = Scheduler::new(config, sessions, notifier);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = shutdown_tx.send(true);
            }
            Err(e) => warn!("Cannot listen for Ctrl+C: {}", e),
        }
    });

    scheduler
        .run(mode, shutdown_rx)
        .await
        .context("cannot construct the HTTP session")?;

    Ok(())
}
