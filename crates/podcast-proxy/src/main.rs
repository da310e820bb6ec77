use clap::Parser;
use podcast_proto::config::Config;
use podcast_proxy::proxy::{self, ProxyState};
use tracing::info;

/// Relay a podcast RSS feed on `/api/podcast`.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Address to bind (overrides `[proxy] bind_address`).
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on (overrides `[proxy] port`).
    #[arg(long)]
    port: Option<u16>,

    /// Upstream RSS URL (overrides `[proxy] feed_url`).
    #[arg(long)]
    feed_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,podcast_proxy=debug")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load()?;
    info!("Config loaded from: {:?}", Config::config_path());

    if let Some(bind) = args.bind {
        config.proxy.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.proxy.port = port;
    }
    if let Some(feed_url) = args.feed_url {
        config.proxy.feed_url = feed_url;
    }

    let state = ProxyState::new(config.proxy.feed_url.clone(), &config.proxy.cache_control)?;
    info!(
        "Player endpoint: {}",
        proxy::proxy_url(&config.proxy.bind_address, config.proxy.port)
    );
    proxy::serve(&config.proxy.bind_address, config.proxy.port, state).await
}
