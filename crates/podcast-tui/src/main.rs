mod action;
mod app;
mod component;
mod components;
mod mpv;
mod surface;
mod theme;
mod widgets;

use std::time::Duration;

use clap::Parser;
use podcast_proto::config::Config;
use podcast_proto::ingest::{FeedIngester, HttpFeedSource};
use podcast_proto::platform;
use podcast_proto::player::PlayerState;
use tokio::sync::mpsc;

/// Terminal podcast player.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Feed proxy endpoint (overrides `[feed] proxy_url`).
    #[arg(long)]
    proxy_url: Option<String>,

    /// Grid rows to scroll past before the mini-player shows (overrides `[ui] mini_player_threshold`).
    #[arg(long)]
    threshold: Option<usize>,

    /// Fetch the feed once, print the episodes as JSON and exit.
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("tui.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // RUST_LOG overrides; HTTP client internals stay quiet by default.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("pod log: {}", log_path.display());
    tracing::info!("pod starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let mut config = Config::load().unwrap_or_default();
    if let Some(url) = args.proxy_url {
        config.feed.proxy_url = url;
    }
    if let Some(threshold) = args.threshold {
        config.ui.mini_player_threshold = threshold;
    }

    let source = HttpFeedSource::new(
        config.feed.proxy_url.clone(),
        Duration::from_secs(config.feed.timeout_secs),
    )?;
    let ingester = FeedIngester::new(source);

    if args.list {
        let episodes = ingester.fetch().await?;
        println!("{}", serde_json::to_string_pretty(&episodes)?);
        return Ok(());
    }

    // ── Player ───────────────────────────────────────────────────────────────
    let (mpv_tx, mpv_rx) = mpsc::channel(64);
    let sink = mpv::MpvSink::new(config.mpv.default_volume, mpv_tx);
    let player = PlayerState::new(sink, surface::TuiSurface::new())
        .with_mini_player_threshold(config.ui.mini_player_threshold);

    app::App::new(player, ingester).run(mpv_rx).await
}
