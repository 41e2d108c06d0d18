use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use transit_server::cache::{RouteNumberCache, RouteStopCache};
use transit_server::collector::{CollectionScheduler, SegmentWeightCollector};
use transit_server::config::Settings;
use transit_server::graph::RailLine;
use transit_server::names::NameResolver;
use transit_server::planner::JourneyPlanner;
use transit_server::quota::ApiQuotaManager;
use transit_server::store::{FileWeightStore, SegmentWeightStore};
use transit_server::transit_api::{QuotaGatedSource, TransitApiClient};
use transit_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("transit_server=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    if settings.api.api_key.is_empty() {
        warn!("TRANSIT_API_KEY not set; transit API calls will fail");
    }

    // Transit data, metered by the daily budget
    let quota = Arc::new(ApiQuotaManager::new(settings.daily_quota));
    let client = TransitApiClient::new(settings.api.clone())?;
    let source = Arc::new(QuotaGatedSource::new(client, Arc::clone(&quota)));
    let stop_cache = RouteStopCache::new();

    let store = Arc::new(FileWeightStore::open(&settings.store_path)?);
    info!(path = %settings.store_path.display(), "segment weight store opened");

    // Background collection
    let collector = SegmentWeightCollector::new(
        Arc::clone(&source),
        Arc::clone(&store),
        stop_cache.clone(),
        settings.collector.clone(),
    );
    let scheduler = Arc::new(CollectionScheduler::new(
        Arc::new(collector),
        settings.scheduler.clone(),
    ));
    let loop_handle = scheduler.spawn();

    // Planning
    let rail = Arc::new(RailLine::light_rail());
    let names = NameResolver::new(
        Arc::clone(&rail),
        stop_cache,
        RouteNumberCache::new(),
        Arc::clone(&source),
    );
    let planner = JourneyPlanner::new(
        Arc::clone(&store),
        Arc::new(names),
        rail,
        settings.planner.clone(),
    );

    let state = AppState::new(Arc::new(planner), Arc::clone(&scheduler), quota);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    info!(addr = %settings.bind_addr, "transit journey planner listening");
    info!("  GET  /health             - Health check");
    info!("  GET  /plan               - Plan a journey");
    info!("  POST /collector/run      - Run one collection pass");
    info!("  POST /collector/toggle   - Enable or disable the collection loop");
    info!("  POST /collector/interval - Change the collection interval");
    info!("  GET  /collector/status   - Collection loop status");
    info!("  GET  /quota              - Daily API budget");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop();
    if let Err(e) = loop_handle.await {
        warn!(error = %e, "collection loop ended abnormally");
    }
    store.flush().await?;
    info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
