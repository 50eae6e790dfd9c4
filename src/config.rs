// Configuration structure for:
// - Gateway, metadata API and price oracle endpoints
// - Time-series database connection string
// - Cache settings (capacities, default private TTL)
// - Contract addresses per family
// - Ingestion and cache warmer intervals

use crate::models::{FarmVersion, GovernanceFamily};
use dotenv::dotenv;
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub gateway_url: String,
    pub api_url: String,
    pub oracle_url: String,
    pub rpc_timeout_secs: u64,
    pub rpc_rate_limit: Option<u32>,
    pub local_cache_capacity: u64,
    pub shared_cache_capacity: u64,
    pub cache_backend: CacheBackend,
    pub default_local_ttl: Duration,
    pub epochs_in_week: u64,
    pub router_address: String,
    pub escrow_address: Option<String>,
    pub farms: Vec<(String, FarmVersion)>,
    pub governance: Vec<(String, GovernanceFamily)>,
    pub price_discovery: Vec<String>,
    pub simple_lock: Vec<String>,
    pub proxy_pair_address: Option<String>,
    pub usd_reference_symbol: String,
    pub oracle_symbols: HashMap<String, String>,
    pub common_tokens: Vec<String>,
    pub ingest_workers: usize,
    pub event_poll_interval: Duration,
    pub event_batch_size: usize,
    pub warmer: WarmerIntervals,
}

/// Where the shared cache tier and the invalidation bus live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackend {
    /// In-process; only instances inside this process share entries
    Memory,
    Redis(String),
}

impl CacheBackend {
    pub fn from_url(url: Option<String>) -> Self {
        match url.map(|url| url.trim().to_string()) {
            Some(url) if !url.is_empty() => CacheBackend::Redis(url),
            _ => CacheBackend::Memory,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WarmerIntervals {
    pub farm_tokens: Duration,
    pub farm_info: Duration,
    pub farm_reserves: Duration,
    pub farm_prices: Duration,
    pub farm_apr: Duration,
    pub pair_info: Duration,
    pub pair_analytics: Duration,
    pub price_discovery: Duration,
    pub analytics: Duration,
    pub proxy: Duration,
}

impl Default for WarmerIntervals {
    fn default() -> Self {
        Self {
            farm_tokens: Duration::from_secs(3600),
            farm_info: Duration::from_secs(60),
            farm_reserves: Duration::from_secs(30),
            farm_prices: Duration::from_secs(30),
            farm_apr: Duration::from_secs(30),
            pair_info: Duration::from_secs(3600),
            pair_analytics: Duration::from_secs(60),
            price_discovery: Duration::from_secs(60),
            analytics: Duration::from_secs(300),
            proxy: Duration::from_secs(3600),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:timeseries.db".to_string(),
            gateway_url: "http://127.0.0.1:8079".to_string(),
            api_url: "http://127.0.0.1:3001".to_string(),
            oracle_url: "http://127.0.0.1:3002".to_string(),
            rpc_timeout_secs: 30,
            rpc_rate_limit: None,
            local_cache_capacity: 10_000,
            shared_cache_capacity: 100_000,
            cache_backend: CacheBackend::Memory,
            default_local_ttl: Duration::from_secs(30),
            epochs_in_week: 7,
            router_address: String::new(),
            escrow_address: None,
            farms: Vec::new(),
            governance: Vec::new(),
            price_discovery: Vec::new(),
            simple_lock: Vec::new(),
            proxy_pair_address: None,
            usd_reference_symbol: "USDC".to_string(),
            oracle_symbols: HashMap::new(),
            common_tokens: Vec::new(),
            ingest_workers: num_cpus::get(),
            event_poll_interval: Duration::from_secs(6),
            event_batch_size: 100,
            warmer: WarmerIntervals::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = Config::default();

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);
        let gateway_url = env::var("GATEWAY_URL").unwrap_or(defaults.gateway_url);
        let api_url = env::var("API_URL").unwrap_or(defaults.api_url);
        let oracle_url = env::var("ORACLE_URL").unwrap_or(defaults.oracle_url);
        let rpc_timeout_secs = env::var("RPC_TIMEOUT_SECS")
            .map(|v| v.parse().unwrap_or(defaults.rpc_timeout_secs))
            .unwrap_or(defaults.rpc_timeout_secs);
        let rpc_rate_limit = env::var("RPC_RATE_LIMIT")
            .map(|v| v.parse().ok())
            .unwrap_or(None);
        let local_cache_capacity = env::var("LOCAL_CACHE_CAPACITY")
            .map(|v| v.parse().unwrap_or(defaults.local_cache_capacity))
            .unwrap_or(defaults.local_cache_capacity);
        let shared_cache_capacity = env::var("SHARED_CACHE_CAPACITY")
            .map(|v| v.parse().unwrap_or(defaults.shared_cache_capacity))
            .unwrap_or(defaults.shared_cache_capacity);
        let cache_backend = CacheBackend::from_url(env::var("REDIS_URL").ok());
        let default_local_ttl = secs_var("LOCAL_CACHE_TTL", defaults.default_local_ttl);
        let epochs_in_week = env::var("EPOCHS_IN_WEEK")
            .map(|v| v.parse().unwrap_or(defaults.epochs_in_week))
            .unwrap_or(defaults.epochs_in_week);
        let router_address = env::var("ROUTER_ADDRESS").unwrap_or(defaults.router_address);
        let escrow_address = env::var("ESCROW_ADDRESS").ok().filter(|v| !v.is_empty());

        let farms = tagged_list("FARM_ADDRESSES", FarmVersion::parse);
        let governance = tagged_list("GOVERNANCE_ADDRESSES", GovernanceFamily::parse);
        let price_discovery = plain_list("PRICE_DISCOVERY_ADDRESSES");
        let simple_lock = plain_list("SIMPLE_LOCK_ADDRESSES");
        let proxy_pair_address = env::var("PROXY_PAIR_ADDRESS").ok().filter(|v| !v.is_empty());

        let usd_reference_symbol =
            env::var("USD_REFERENCE_SYMBOL").unwrap_or(defaults.usd_reference_symbol);
        let oracle_symbols = tagged_list("ORACLE_SYMBOLS", |symbol| Some(symbol.trim().to_string()))
            .into_iter()
            .collect();
        let common_tokens = plain_list("COMMON_TOKENS");

        let ingest_workers = env::var("INGEST_WORKERS")
            .map(|v| v.parse().unwrap_or(defaults.ingest_workers))
            .unwrap_or(defaults.ingest_workers)
            .max(1);
        let event_poll_interval = secs_var("EVENT_POLL_INTERVAL", defaults.event_poll_interval);
        let event_batch_size = env::var("EVENT_BATCH_SIZE")
            .map(|v| v.parse().unwrap_or(defaults.event_batch_size))
            .unwrap_or(defaults.event_batch_size);

        let warmer = WarmerIntervals {
            farm_tokens: secs_var("WARM_FARM_TOKENS_SECS", defaults.warmer.farm_tokens),
            farm_info: secs_var("WARM_FARM_INFO_SECS", defaults.warmer.farm_info),
            farm_reserves: secs_var("WARM_FARM_RESERVES_SECS", defaults.warmer.farm_reserves),
            farm_prices: secs_var("WARM_FARM_PRICES_SECS", defaults.warmer.farm_prices),
            farm_apr: secs_var("WARM_FARM_APR_SECS", defaults.warmer.farm_apr),
            pair_info: secs_var("WARM_PAIR_INFO_SECS", defaults.warmer.pair_info),
            pair_analytics: secs_var("WARM_PAIR_ANALYTICS_SECS", defaults.warmer.pair_analytics),
            price_discovery: secs_var("WARM_PRICE_DISCOVERY_SECS", defaults.warmer.price_discovery),
            analytics: secs_var("WARM_ANALYTICS_SECS", defaults.warmer.analytics),
            proxy: secs_var("WARM_PROXY_SECS", defaults.warmer.proxy),
        };

        Self {
            database_url,
            gateway_url,
            api_url,
            oracle_url,
            rpc_timeout_secs,
            rpc_rate_limit,
            local_cache_capacity,
            shared_cache_capacity,
            cache_backend,
            default_local_ttl,
            epochs_in_week,
            router_address,
            escrow_address,
            farms,
            governance,
            price_discovery,
            simple_lock,
            proxy_pair_address,
            usd_reference_symbol,
            oracle_symbols,
            common_tokens,
            ingest_workers,
            event_poll_interval,
            event_batch_size,
            warmer,
        }
    }
}

fn secs_var(name: &str, default: Duration) -> Duration {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

fn plain_list(name: &str) -> Vec<String> {
    env::var(name)
        .unwrap_or_default()
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Parses `key:tag,key:tag` lists; malformed entries are skipped with a warning.
fn tagged_list<T>(name: &str, parse: impl Fn(&str) -> Option<T>) -> Vec<(String, T)> {
    plain_list(name)
        .into_iter()
        .filter_map(|entry| {
            let parsed = entry
                .split_once(':')
                .and_then(|(key, tag)| parse(tag).map(|tag| (key.trim().to_string(), tag)));
            if parsed.is_none() {
                warn!("Ignoring malformed {} entry: {}", name, entry);
            }
            parsed
        })
        .collect()
}
