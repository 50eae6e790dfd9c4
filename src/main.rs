// Initialize configuration
// Set up logging
// Connect the time-series database
// Build caches, services and the invalidation listener
// Start event polling, ingestion workers and cache warmers
// Wait for ctrl-c, then cancel every loop

use dex_data_service::{
    blockchain::{self, GatewayClient},
    cache,
    config::Config,
    db::{self, SqliteTimeSeries},
    providers::HttpPriceOracle,
    state::{AppState, Backends},
    warmer::{
        self, AnalyticsWarmer, FarmJob, FarmWarmer, PairJob, PairWarmer, PriceDiscoveryWarmer, ProxyWarmer,
        WarmerJob,
    },
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting dex-data-service");

    let config = Config::from_env();
    tracing::info!("Configuration loaded: {:?}", config);

    let db_pool = db::connection::establish_connection(&config.database_url).await?;
    tracing::info!("Time-series database ready");

    let gateway = Arc::new(GatewayClient::new(&config)?);
    let (remote, bus) = cache::connect_shared(&config).await?;
    tracing::info!("Shared cache backend: {:?}", config.cache_backend);

    let state = AppState::new(
        config.clone(),
        Backends {
            ledger: gateway.clone(),
            metadata: gateway.clone(),
            oracle: Arc::new(HttpPriceOracle::new(&config)?),
            remote,
            bus: bus.clone(),
            time_series: Arc::new(SqliteTimeSeries::new(db_pool)),
        },
    );
    tracing::info!(
        "Cache initialized with private capacity {} and default TTL {:?}",
        config.local_cache_capacity,
        config.default_local_ttl
    );

    let shutdown = CancellationToken::new();
    let mut handles = vec![cache::invalidation::spawn_invalidation_listener(
        state.store.clone(),
        bus.as_ref(),
        shutdown.clone(),
    )];

    let worker_pool = blockchain::WorkerPool::new(
        state.ingestor.clone(),
        config.ingest_workers,
        config.event_batch_size * 10,
        shutdown.clone(),
    );
    let poll_sender = worker_pool.get_sender();
    let poll_shutdown = shutdown.clone();
    let feed = gateway.clone();
    let (poll_interval, batch_size) = (config.event_poll_interval, config.event_batch_size);
    handles.push(tokio::spawn(async move {
        blockchain::start_event_polling(feed, poll_sender, poll_interval, batch_size, poll_shutdown).await;
    }));
    tracing::info!("Event polling started with {} ingestion workers", config.ingest_workers);

    let intervals = &state.config.warmer;
    let farm_job = |job: FarmJob| -> Arc<dyn WarmerJob> {
        Arc::new(FarmWarmer::new(
            job,
            state.farms.clone(),
            state.farm_pricing.clone(),
            state.tokens.clone(),
        ))
    };
    let mut jobs: Vec<(Arc<dyn WarmerJob>, Duration)> = vec![
        (farm_job(FarmJob::Tokens), intervals.farm_tokens),
        (farm_job(FarmJob::Info), intervals.farm_info),
        (farm_job(FarmJob::Reserves), intervals.farm_reserves),
        (farm_job(FarmJob::Prices), intervals.farm_prices),
        (farm_job(FarmJob::Apr), intervals.farm_apr),
        (
            Arc::new(PairWarmer::new(PairJob::Info, state.pairs.clone(), state.router.clone())),
            intervals.pair_info,
        ),
        (
            Arc::new(PairWarmer::new(PairJob::Analytics, state.pairs.clone(), state.router.clone())),
            intervals.pair_analytics,
        ),
        (
            Arc::new(PriceDiscoveryWarmer::new(
                state.config.price_discovery.clone(),
                state.price_discovery.clone(),
                state.time_series.clone(),
            )),
            intervals.price_discovery,
        ),
        (
            Arc::new(AnalyticsWarmer::new(state.analytics.clone(), state.router.clone())),
            intervals.analytics,
        ),
    ];
    if let Some(proxy) = state.config.proxy_pair_address.as_deref() {
        jobs.push((Arc::new(ProxyWarmer::new(proxy, state.proxy_pair.clone())), intervals.proxy));
    }
    for (job, period) in jobs {
        handles.push(warmer::spawn_warmer(job, bus.clone(), period, shutdown.clone()));
    }
    tracing::info!("Cache warmers started");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    shutdown.cancel();

    for handle in handles {
        let _ = handle.await;
    }
    worker_pool.join().await;

    tracing::info!("dex-data-service stopped");
    Ok(())
}
