use crate::blockchain::{EventIngestor, EventNotifier, LedgerReader};
use crate::cache::{init_cache, CacheStore, InvalidationBus, RemoteCache};
use crate::compute::analytics::AnalyticsCompute;
use crate::compute::farm::{FarmPricing, FarmRegistry};
use crate::compute::governance::GovernanceRegistry;
use crate::compute::pair::PairCompute;
use crate::compute::price_discovery::PriceDiscoveryCompute;
use crate::compute::router::RouterCompute;
use crate::compute::simple_lock::SimpleLockService;
use crate::compute::token::TokenService;
use crate::compute::week::WeekTimekeepingCompute;
use crate::config::Config;
use crate::contracts::{
    EscrowAbi, FarmAbi, GovernanceAbi, PairAbi, PriceDiscoveryAbi, ProxyPairAbi, RouterAbi, SimpleLockAbi,
    WeekTimekeepingAbi,
};
use crate::db::TimeSeriesStore;
use crate::providers::{PriceOracle, TokenMetadataSource};
use std::sync::Arc;

/// External collaborators the services are built on
pub struct Backends {
    pub ledger: Arc<dyn LedgerReader>,
    pub metadata: Arc<dyn TokenMetadataSource>,
    pub oracle: Arc<dyn PriceOracle>,
    pub remote: Arc<dyn RemoteCache>,
    pub bus: Arc<dyn InvalidationBus>,
    pub time_series: Arc<dyn TimeSeriesStore>,
}

pub struct AppState {
    pub config: Config,
    pub store: Arc<CacheStore>,
    pub bus: Arc<dyn InvalidationBus>,
    pub notifier: Arc<EventNotifier>,
    pub tokens: Arc<TokenService>,
    pub pairs: Arc<PairCompute>,
    pub router: Arc<RouterCompute>,
    pub farm_pricing: Arc<FarmPricing>,
    pub farms: Arc<FarmRegistry>,
    pub governance: Arc<GovernanceRegistry>,
    pub week: Arc<WeekTimekeepingCompute>,
    pub price_discovery: Arc<PriceDiscoveryCompute>,
    pub escrow: Option<EscrowAbi>,
    pub proxy_pair: ProxyPairAbi,
    pub simple_lock: Arc<SimpleLockService>,
    pub analytics: Arc<AnalyticsCompute>,
    pub ingestor: Arc<EventIngestor>,
    pub time_series: Arc<dyn TimeSeriesStore>,
}

impl AppState {
    pub fn new(config: Config, backends: Backends) -> Self {
        let store = init_cache(&config, backends.remote);
        let ledger = backends.ledger;

        let pair_abi = PairAbi::new(ledger.clone(), store.clone());
        let router_abi = RouterAbi::new(ledger.clone(), store.clone(), &config.router_address);

        let tokens = Arc::new(TokenService::new(
            store.clone(),
            backends.metadata.clone(),
            backends.oracle,
            pair_abi.clone(),
            router_abi.clone(),
            config.oracle_symbols.clone(),
            config.common_tokens.clone(),
            &config.usd_reference_symbol,
        ));
        let pairs = Arc::new(PairCompute::new(
            store.clone(),
            pair_abi.clone(),
            tokens.clone(),
            backends.time_series.clone(),
        ));
        let router = Arc::new(RouterCompute::new(store.clone(), router_abi, pair_abi, pairs.clone()));

        let farm_pricing = Arc::new(FarmPricing::new(
            store.clone(),
            FarmAbi::new(ledger.clone(), store.clone()),
            tokens.clone(),
            router.clone(),
            pairs.clone(),
        ));
        let farms = Arc::new(FarmRegistry::new(farm_pricing.clone(), &config.farms));

        let governance = Arc::new(GovernanceRegistry::new(
            store.clone(),
            GovernanceAbi::new(ledger.clone(), store.clone()),
            tokens.clone(),
            &config.governance,
        ));
        let week = Arc::new(WeekTimekeepingCompute::new(
            store.clone(),
            WeekTimekeepingAbi::new(ledger.clone(), store.clone()),
            config.epochs_in_week,
        ));
        let price_discovery = Arc::new(PriceDiscoveryCompute::new(
            store.clone(),
            PriceDiscoveryAbi::new(ledger.clone(), store.clone()),
            tokens.clone(),
            backends.time_series.clone(),
        ));
        let escrow = config
            .escrow_address
            .as_deref()
            .map(|address| EscrowAbi::new(ledger.clone(), store.clone(), address));

        let proxy_pair = ProxyPairAbi::new(ledger.clone(), store.clone());
        let simple_lock = Arc::new(SimpleLockService::new(
            store.clone(),
            SimpleLockAbi::new(ledger.clone(), store.clone()),
            backends.metadata,
            config.simple_lock.clone(),
        ));
        let analytics = Arc::new(AnalyticsCompute::new(
            store.clone(),
            router.clone(),
            farms.clone(),
            backends.time_series.clone(),
        ));

        let notifier = Arc::new(EventNotifier::default());
        let ingestor = Arc::new(EventIngestor::new(
            pairs.clone(),
            router.clone(),
            tokens.clone(),
            backends.bus.clone(),
            notifier.clone(),
            backends.time_series.clone(),
        ));

        Self {
            config,
            store,
            bus: backends.bus,
            notifier,
            tokens,
            pairs,
            router,
            farm_pricing,
            farms,
            governance,
            week,
            price_discovery,
            escrow,
            proxy_pair,
            simple_lock,
            analytics,
            ingestor,
            time_series: backends.time_series,
        }
    }
}
