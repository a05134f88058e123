use std::sync::Arc;

use anyhow::Result;
use licscraper::{config::Config, fetch, server, store};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) load config & build shared state ─────────────────────────
    let config = Config::from_env()?;
    info!(shared_url = %config.shared_url, bind = %config.bind_addr, "configured");

    let client = fetch::client()?;
    let cache = store::Cache::new(config.cache_ttl, Arc::new(store::SystemClock));
    let bind_addr = config.bind_addr;
    let state = Arc::new(server::AppState {
        client,
        config,
        cache,
    });

    // ─── 3) serve ────────────────────────────────────────────────────
    let app = server::router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
