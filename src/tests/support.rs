//! In-memory fakes for the ledger, the price oracle, token metadata and the
//! shared cache tier, plus a small two-pair exchange fixture.

use crate::blockchain::client::{LedgerArg, LedgerError, LedgerReader, StorageKey};
use crate::blockchain::models::encode_biguint;
use crate::cache::{BroadcastBus, CacheError, CacheStore, InvalidationBus, MemoryRemoteCache, RemoteCache, RemoteEntry};
use crate::config::Config;
use crate::db::{migration, SqliteTimeSeries};
use crate::models::Token;
use crate::providers::{OracleError, PriceOracle, TokenMetadataSource};
use crate::state::{AppState, Backends};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use parking_lot::Mutex;
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

pub fn dec(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

/// A valid 32-byte hex address made of one repeated byte
pub fn address(byte: u8) -> String {
    hex::encode([byte; 32])
}

pub fn biguint(value: &str) -> Vec<u8> {
    encode_biguint(&dec(value)).unwrap()
}

pub fn u64_bytes(value: u64) -> Vec<u8> {
    encode_biguint(&BigDecimal::from(value)).unwrap()
}

pub fn string_bytes(value: &str) -> Vec<u8> {
    value.as_bytes().to_vec()
}

pub fn address_bytes(value: &str) -> Vec<u8> {
    hex::decode(value).unwrap()
}

#[derive(Default)]
pub struct MockLedger {
    views: Mutex<HashMap<String, Vec<Vec<u8>>>>,
    storage: Mutex<HashMap<String, String>>,
    calls: AtomicUsize,
}

impl MockLedger {
    fn view_key(contract: &str, method: &str, args: &[LedgerArg]) -> String {
        let args: Vec<String> = args.iter().map(|arg| arg.to_hex().unwrap()).collect();
        format!("{}::{}({})", contract, method, args.join(","))
    }

    pub fn set_view(&self, contract: &str, method: &str, values: Vec<Vec<u8>>) {
        self.set_view_with_args(contract, method, &[], values);
    }

    pub fn set_view_with_args(&self, contract: &str, method: &str, args: &[LedgerArg], values: Vec<Vec<u8>>) {
        self.views.lock().insert(Self::view_key(contract, method, args), values);
    }

    pub fn set_storage(&self, contract: &str, path: &[StorageKey], value: &str) {
        let key = format!("{}/{}", contract, StorageKey::path_hex(path));
        self.storage.lock().insert(key, value.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerReader for MockLedger {
    async fn read(&self, contract: &str, method: &str, args: &[LedgerArg]) -> Result<Vec<Vec<u8>>, LedgerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = Self::view_key(contract, method, args);
        self.views
            .lock()
            .get(&key)
            .cloned()
            .ok_or_else(|| LedgerError::Decode(format!("no mocked view {}", key)))
    }

    async fn read_storage(&self, contract: &str, path: &[StorageKey]) -> Result<String, LedgerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = format!("{}/{}", contract, StorageKey::path_hex(path));
        Ok(self.storage.lock().get(&key).cloned().unwrap_or_default())
    }

    async fn read_storage_keys(&self, contract: &str) -> Result<BTreeMap<String, String>, LedgerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prefix = format!("{}/", contract);
        Ok(self
            .storage
            .lock()
            .iter()
            .filter_map(|(key, value)| key.strip_prefix(&prefix).map(|key| (key.to_string(), value.clone())))
            .collect())
    }
}

#[derive(Default)]
pub struct MockOracle {
    prices: Mutex<HashMap<String, BigDecimal>>,
    calls: AtomicUsize,
}

impl MockOracle {
    pub fn set_price(&self, symbol: &str, price: &str) {
        self.prices.lock().insert(symbol.to_string(), dec(price));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceOracle for MockOracle {
    async fn get_price(&self, symbol: &str) -> Result<BigDecimal, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prices
            .lock()
            .get(symbol)
            .cloned()
            .ok_or_else(|| OracleError::Unavailable(symbol.to_string()))
    }
}

#[derive(Default)]
pub struct MockMetadata {
    tokens: Mutex<HashMap<String, Token>>,
    attributes: Mutex<HashMap<String, String>>,
    attribute_calls: AtomicUsize,
}

impl MockMetadata {
    pub fn add(&self, identifier: &str, decimals: u32) {
        let ticker = identifier.split('-').next().unwrap_or(identifier).to_string();
        self.tokens.lock().insert(
            identifier.to_string(),
            Token {
                identifier: identifier.to_string(),
                ticker,
                decimals,
            },
        );
    }

    pub fn set_attributes(&self, owner: &str, identifier: &str, attributes: &str) {
        self.attributes
            .lock()
            .insert(format!("{}/{}", owner, identifier), attributes.to_string());
    }

    pub fn attribute_calls(&self) -> usize {
        self.attribute_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenMetadataSource for MockMetadata {
    async fn token(&self, identifier: &str) -> Result<Token, LedgerError> {
        self.tokens
            .lock()
            .get(identifier)
            .cloned()
            .ok_or_else(|| LedgerError::Decode(format!("unknown token {}", identifier)))
    }

    async fn nft_attributes(&self, owner: &str, identifier: &str) -> Result<String, LedgerError> {
        self.attribute_calls.fetch_add(1, Ordering::SeqCst);
        self.attributes
            .lock()
            .get(&format!("{}/{}", owner, identifier))
            .cloned()
            .ok_or_else(|| LedgerError::Decode(format!("no attributes for {}", identifier)))
    }
}

/// Shared tier that is always unreachable
#[derive(Default)]
pub struct FailingRemote {
    calls: AtomicUsize,
}

impl FailingRemote {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteCache for FailingRemote {
    async fn get(&self, _key: &str) -> Result<Option<RemoteEntry>, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _payload: String, _ttl: Duration) -> Result<(), CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Backend("connection refused".to_string()))
    }
}

/// Broadcast bus that remembers every published message
#[derive(Default)]
pub struct RecordingBus {
    inner: BroadcastBus,
    published: Mutex<Vec<Vec<String>>>,
}

impl RecordingBus {
    pub fn published(&self) -> Vec<Vec<String>> {
        self.published.lock().clone()
    }
}

#[async_trait]
impl InvalidationBus for RecordingBus {
    async fn publish(&self, topic: &str, keys: Vec<String>) -> Result<(), CacheError> {
        self.published.lock().push(keys.clone());
        self.inner.publish(topic, keys).await
    }

    fn subscribe(&self, topic: &str) -> broadcast::Receiver<Vec<String>> {
        self.inner.subscribe(topic)
    }
}

pub fn memory_store() -> Arc<CacheStore> {
    Arc::new(CacheStore::new(
        1_000,
        Duration::from_secs(30),
        Arc::new(MemoryRemoteCache::new(10_000)),
    ))
}

pub async fn memory_time_series() -> SqliteTimeSeries {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    migration::run_migrations(&pool).await.expect("Failed to run migrations");
    SqliteTimeSeries::new(pool)
}

pub const WEGLD: &str = "WEGLD-abc123";
pub const USDC: &str = "USDC-123456";
pub const MEX: &str = "MEX-def456";
pub const EGLD_USDC_LP: &str = "EGLDUSDC-aaaaaa";
pub const EGLD_MEX_LP: &str = "EGLDMEX-bbbbbb";
pub const FARM_TOKEN: &str = "EGLDUSDCF-cccccc";

/// Two pairs behind one router:
/// WEGLD/USDC holding 1 000 WEGLD and 40 000 USDC, and
/// MEX/WEGLD holding 1 000 000 MEX and 500 WEGLD.
/// The oracle prices EGLD at 40 and USDC at 1.
pub struct Fixture {
    pub ledger: Arc<MockLedger>,
    pub oracle: Arc<MockOracle>,
    pub metadata: Arc<MockMetadata>,
    pub bus: Arc<RecordingBus>,
    pub time_series: Arc<SqliteTimeSeries>,
    pub config: Config,
    pub router: String,
    pub usdc_pair: String,
    pub mex_pair: String,
}

impl Fixture {
    pub async fn new() -> Self {
        let ledger = Arc::new(MockLedger::default());
        let oracle = Arc::new(MockOracle::default());
        let metadata = Arc::new(MockMetadata::default());

        let router = address(1);
        let usdc_pair = address(10);
        let mex_pair = address(11);

        ledger.set_view(
            &router,
            "getAllPairsManagedAddresses",
            vec![address_bytes(&usdc_pair), address_bytes(&mex_pair)],
        );
        Self::set_pair(&ledger, &usdc_pair, WEGLD, USDC, EGLD_USDC_LP);
        Self::set_pair(&ledger, &mex_pair, MEX, WEGLD, EGLD_MEX_LP);
        Self::set_reserves(&ledger, &usdc_pair, "1000000000000000000000", "40000000000", "100000000000000000000");
        Self::set_reserves(
            &ledger,
            &mex_pair,
            "1000000000000000000000000",
            "500000000000000000000",
            "1000000000000000000000",
        );

        metadata.add(WEGLD, 18);
        metadata.add(USDC, 6);
        metadata.add(MEX, 18);
        metadata.add(EGLD_USDC_LP, 18);
        metadata.add(EGLD_MEX_LP, 18);
        metadata.add(FARM_TOKEN, 18);

        oracle.set_price("EGLD", "40");
        oracle.set_price("USDC", "1");

        let mut config = Config {
            router_address: router.clone(),
            usd_reference_symbol: "USDC".to_string(),
            common_tokens: vec![WEGLD.to_string(), USDC.to_string()],
            ..Config::default()
        };
        config.oracle_symbols.insert(WEGLD.to_string(), "EGLD".to_string());
        config.oracle_symbols.insert(USDC.to_string(), "USDC".to_string());

        Self {
            ledger,
            oracle,
            metadata,
            bus: Arc::new(RecordingBus::default()),
            time_series: Arc::new(memory_time_series().await),
            config,
            router,
            usdc_pair,
            mex_pair,
        }
    }

    pub fn set_pair(ledger: &MockLedger, pair: &str, first: &str, second: &str, lp: &str) {
        ledger.set_view(pair, "getFirstTokenId", vec![string_bytes(first)]);
        ledger.set_view(pair, "getSecondTokenId", vec![string_bytes(second)]);
        ledger.set_view(pair, "getLpTokenIdentifier", vec![string_bytes(lp)]);
        ledger.set_view(pair, "getTotalFeePercent", vec![u64_bytes(300)]);
        ledger.set_view(pair, "getState", vec![u64_bytes(1)]);
    }

    pub fn set_reserves(ledger: &MockLedger, pair: &str, first: &str, second: &str, lp_supply: &str) {
        ledger.set_view(
            pair,
            "getReservesAndTotalSupply",
            vec![biguint(first), biguint(second), biguint(lp_supply)],
        );
    }

    pub fn state(&self) -> AppState {
        self.state_with(self.config.clone(), Arc::new(MemoryRemoteCache::new(10_000)))
    }

    pub fn state_with(&self, config: Config, remote: Arc<dyn RemoteCache>) -> AppState {
        AppState::new(
            config,
            Backends {
                ledger: self.ledger.clone(),
                metadata: self.metadata.clone(),
                oracle: self.oracle.clone(),
                remote,
                bus: self.bus.clone(),
                time_series: self.time_series.clone(),
            },
        )
    }
}
