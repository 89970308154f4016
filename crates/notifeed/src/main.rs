//! notifeed - watch and send notifications from the terminal.
//!
//! Mounts a recent-activity feed against a JSON spool file, prints the
//! reconciled view, and performs send-now / schedule actions whose results
//! appear before the next poll.

mod render;
mod spool;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notifeed_core::{Draft, FeedConfig, RecentActivityFeed, StatusTab, ViewQuery};
use spool::SpoolBackend;

#[derive(Parser)]
#[command(name = "notifeed")]
#[command(about = "Recent notification activity with optimistic sends")]
struct Cli {
    /// Spool file acting as the notification backend
    #[arg(long, short = 's')]
    spool: Option<PathBuf>,

    /// Settings file (defaults to the user config directory)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override the number of records kept
    #[arg(long)]
    capacity: Option<usize>,

    /// Override the poll interval, in seconds
    #[arg(long)]
    interval: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the recent-activity view once
    List {
        /// Case-insensitive text filter
        #[arg(long, short = 'q', default_value = "")]
        query: String,
        /// Status tab: all, pending, sent, failed, cancelled
        #[arg(long, short = 't', default_value = "all")]
        tab: StatusTab,
    },

    /// Keep polling and reprint the view on every snapshot
    Watch {
        /// Case-insensitive text filter
        #[arg(long, short = 'q', default_value = "")]
        query: String,
        /// Status tab: all, pending, sent, failed, cancelled
        #[arg(long, short = 't', default_value = "all")]
        tab: StatusTab,
        /// Stop after this many snapshots
        #[arg(long)]
        polls: Option<u64>,
    },

    /// Send a notification now, or schedule it with --at
    Send {
        /// Recipients, separated by commas or whitespace
        #[arg(long)]
        to: String,
        /// Subject line
        #[arg(long, default_value = "")]
        subject: String,
        /// Message body
        #[arg(long, default_value = "")]
        body: String,
        /// Delivery time (RFC 3339); sends immediately when omitted
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notifeed=info,notifeed_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let settings_path = cli.config.clone().unwrap_or_else(default_settings_path);
    let mut config = load_settings(&settings_path).await?;
    if let Some(capacity) = cli.capacity {
        config.capacity = capacity;
    }
    if let Some(interval) = cli.interval {
        config.poll_interval_secs = interval;
    }
    config.validate().context("invalid feed settings")?;

    let backend = Arc::new(SpoolBackend::new(
        cli.spool.clone().unwrap_or_else(default_spool_path),
    ));
    info!("Using spool {}", backend.path().display());

    match cli.command {
        Commands::List { query, tab } => list(backend, &config, query_for(query, tab)).await,
        Commands::Watch { query, tab, polls } => {
            watch(backend, &config, query_for(query, tab), polls).await
        }
        Commands::Send {
            to,
            subject,
            body,
            at,
        } => send(backend, &config, Draft::from_form(&to, subject, body), at).await,
    }
}

fn query_for(text: String, tab: StatusTab) -> ViewQuery {
    ViewQuery::text(text).with_tab(tab)
}

async fn list(
    backend: Arc<SpoolBackend>,
    config: &FeedConfig,
    query: ViewQuery,
) -> anyhow::Result<()> {
    let mut feed = RecentActivityFeed::mount(backend, config)?;
    let loaded = first_load(&mut feed, config).await;
    if loaded.is_ok() {
        print!("{}", render::view(&feed.view(&query), Utc::now()));
    }
    feed.unmount().await;
    loaded
}

/// Wait for the initial snapshot, at most one poll interval.
///
/// Failed fetches are only logged by the poll task, so an unreadable spool
/// never produces one.
async fn first_load(
    feed: &mut RecentActivityFeed<SpoolBackend>,
    config: &FeedConfig,
) -> anyhow::Result<()> {
    match tokio::time::timeout(config.poll_interval(), feed.next_snapshot()).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => bail!("the poll task stopped before the first snapshot"),
        Err(_) => bail!(
            "no snapshot within {}s; check that the spool file is readable JSON",
            config.poll_interval_secs
        ),
    }
}

async fn watch(
    backend: Arc<SpoolBackend>,
    config: &FeedConfig,
    query: ViewQuery,
    polls: Option<u64>,
) -> anyhow::Result<()> {
    let mut feed = RecentActivityFeed::mount(backend, config)?;
    let mut remaining = polls;

    loop {
        tokio::select! {
            report = feed.next_snapshot() => {
                if report.is_none() {
                    warn!("Poll task stopped");
                    break;
                }
                print!("{}", render::view(&feed.view(&query), Utc::now()));
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }

        if let Some(left) = remaining.as_mut() {
            *left = left.saturating_sub(1);
            if *left == 0 {
                break;
            }
        }
    }

    feed.unmount().await;
    Ok(())
}

async fn send(
    backend: Arc<SpoolBackend>,
    config: &FeedConfig,
    draft: Draft,
    at: Option<DateTime<Utc>>,
) -> anyhow::Result<()> {
    if draft.recipients.is_empty() {
        bail!("--to needs at least one recipient");
    }

    let mut feed = RecentActivityFeed::mount(backend, config)?;
    if let Err(e) = first_load(&mut feed, config).await {
        warn!("Sending without the current activity: {e}");
    }

    let result = match at {
        Some(at) => feed.schedule_send(&draft, at).await,
        None => feed.send_now(&draft).await,
    };

    let outcome = match result {
        Ok(summary) => summary.outcome(),
        Err(e) => {
            feed.unmount().await;
            return Err(e).context("send failed");
        }
    };

    println!("{}", render::outcome(outcome));
    print!("{}", render::view(&feed.view(&ViewQuery::default()), Utc::now()));
    feed.unmount().await;
    Ok(())
}

fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notifeed")
        .join("settings.json")
}

fn default_spool_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notifeed")
        .join("spool.json")
}

/// Load feed settings, falling back to defaults when the file is absent.
async fn load_settings(path: &Path) -> anyhow::Result<FeedConfig> {
    if !path.exists() {
        return Ok(FeedConfig::default());
    }

    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    FeedConfig::from_json(&contents).with_context(|| format!("parsing {}", path.display()))
}
