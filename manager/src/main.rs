//! Page viewer binary
//!
//! Navigates to each page named on the command line in turn, printing what the
//! page area shows before and after the fetch settles, then the state of every
//! requested page as JSON.
//!
//! ```text
//! PAGE_VIEWER_BASE_URL=https://example.com/pages page-viewer home about missing
//! ```

use anyhow::{bail, Context};
use keyed_request_manager::fetchers::{HttpFetcher, TimeoutFetcher};
use keyed_request_manager::{KeyedRequestManager, ManagerConfig};
use keyed_request_runtime::metrics::MetricsServer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "page_viewer=info,keyed_request_manager=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pages: Vec<String> = std::env::args().skip(1).collect();
    if pages.is_empty() {
        bail!("usage: page-viewer <page>...");
    }

    let config = ManagerConfig::from_env().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    tracing::info!(base_url = %config.fetch.base_url, pages = pages.len(), "Starting page viewer");

    let metrics = if config.metrics.enabled {
        let mut server = MetricsServer::new(config.metrics.addr()?);
        server.start()?;
        Some(server)
    } else {
        None
    };

    let fetcher = TimeoutFetcher::new(HttpFetcher::from_config(&config.fetch)?, config.fetch_timeout());
    let manager = KeyedRequestManager::with_config(fetcher, config.store_config());

    for page in pages {
        let mut handle = manager.navigate(page.clone()).await?;
        println!("[{page}] {}", manager.render().await);

        handle.wait().await;
        println!("[{page}] {}", manager.render().await);
    }

    let snapshot = manager.snapshot().await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    manager
        .shutdown_default()
        .await
        .context("fetches still running at shutdown")?;

    if let Some(text) = metrics.as_ref().and_then(MetricsServer::render) {
        println!("{text}");
    }

    Ok(())
}
