use crate::blockchain::models::encode_biguint;
use crate::config::Config;
use crate::models::{PairEvent, Token};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bigdecimal::BigDecimal;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Typed argument of a contract view call
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerArg {
    Address(String),
    BigUint(BigDecimal),
    U64(u64),
    Str(String),
}

impl LedgerArg {
    pub fn to_hex(&self) -> Result<String, LedgerError> {
        match self {
            Self::Address(address) => {
                hex::decode(address)
                    .map_err(|_| LedgerError::Decode(format!("invalid address argument: {}", address)))?;
                Ok(address.to_lowercase())
            }
            Self::BigUint(value) => Ok(hex::encode(encode_biguint(value)?)),
            Self::U64(value) => Ok(hex::encode(encode_u64(*value))),
            Self::Str(value) => Ok(hex::encode(value.as_bytes())),
        }
    }
}

/// One segment of a storage key path
#[derive(Debug, Clone, PartialEq)]
pub enum StorageKey {
    Name(String),
    Address(String),
    U64(u64),
}

impl StorageKey {
    /// Concatenate the segments into the hex key the node expects
    pub fn path_hex(path: &[StorageKey]) -> String {
        path.iter()
            .map(|segment| match segment {
                StorageKey::Name(name) => hex::encode(name.as_bytes()),
                StorageKey::Address(address) => address.to_lowercase(),
                StorageKey::U64(value) => hex::encode(value.to_be_bytes()),
            })
            .collect()
    }
}

fn encode_u64(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}

/// Read access to contract views and raw contract storage
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Run a view function, returning the raw return-data entries
    async fn read(
        &self,
        contract: &str,
        method: &str,
        args: &[LedgerArg],
    ) -> Result<Vec<Vec<u8>>, LedgerError>;

    /// Raw storage value as hex; empty when the key was never written
    async fn read_storage(&self, contract: &str, path: &[StorageKey]) -> Result<String, LedgerError>;

    /// Every storage entry of a contract, hex key to hex value
    async fn read_storage_keys(&self, contract: &str) -> Result<BTreeMap<String, String>, LedgerError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    sc_address: &'a str,
    func_name: &'a str,
    args: Vec<String>,
}

#[derive(Deserialize)]
struct GatewayResponse<T> {
    data: T,
}

#[derive(Deserialize)]
struct QueryData {
    data: QueryResult,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResult {
    #[serde(default)]
    return_data: Vec<Option<String>>,
}

#[derive(Deserialize)]
struct StorageValue {
    #[serde(default)]
    value: String,
}

#[derive(Deserialize)]
struct StoragePairs {
    #[serde(default)]
    pairs: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct NftAttributes {
    #[serde(default)]
    attributes: String,
}

/// HTTP client for the ledger gateway and the metadata API
pub struct GatewayClient {
    http: reqwest::Client,
    gateway_url: String,
    api_url: String,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl GatewayClient {
    pub fn new(config: &Config) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.rpc_timeout_secs))
            .build()?;

        let limiter = config
            .rpc_rate_limit
            .and_then(NonZeroU32::new)
            .map(|rate| RateLimiter::direct(Quota::per_second(rate)));

        info!(
            "Initializing gateway client for {} (rate limit: {:?})",
            config.gateway_url, config.rpc_rate_limit
        );

        Ok(Self {
            http,
            gateway_url: config.gateway_url.trim_end_matches('/').to_string(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            limiter,
        })
    }

    async fn throttle(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Static token metadata from the API
    pub async fn get_token(&self, identifier: &str) -> Result<Token, LedgerError> {
        self.throttle().await;
        let url = format!("{}/tokens/{}", self.api_url, identifier);
        let token = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Token>()
            .await?;
        Ok(token)
    }

    /// Base64 attributes of one token nonce held by `owner`
    pub async fn get_nft_attributes(&self, owner: &str, identifier: &str) -> Result<String, LedgerError> {
        self.throttle().await;
        let url = format!("{}/accounts/{}/nfts/{}", self.api_url, owner, identifier);
        let nft = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<NftAttributes>()
            .await?;
        Ok(nft.attributes)
    }

    /// A batch of pair events starting at the given cursor
    pub async fn get_events(&self, from: u64, size: usize) -> Result<Vec<PairEvent>, LedgerError> {
        self.throttle().await;
        let url = format!("{}/events", self.gateway_url);
        let events = self
            .http
            .get(&url)
            .query(&[("from", from.to_string()), ("size", size.to_string())])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<PairEvent>>()
            .await?;
        Ok(events)
    }
}

#[async_trait]
impl LedgerReader for GatewayClient {
    async fn read(
        &self,
        contract: &str,
        method: &str,
        args: &[LedgerArg],
    ) -> Result<Vec<Vec<u8>>, LedgerError> {
        let args = args.iter().map(LedgerArg::to_hex).collect::<Result<Vec<_>, _>>()?;
        self.throttle().await;

        debug!("Querying {}::{}", contract, method);
        let url = format!("{}/vm-values/query", self.gateway_url);
        let response = self
            .http
            .post(&url)
            .json(&QueryRequest {
                sc_address: contract,
                func_name: method,
                args,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<GatewayResponse<QueryData>>()
            .await?;

        response
            .data
            .data
            .return_data
            .into_iter()
            .map(|entry| match entry {
                Some(encoded) => STANDARD
                    .decode(encoded)
                    .map_err(|e| LedgerError::Decode(format!("{}::{} return data: {}", contract, method, e))),
                None => Ok(Vec::new()),
            })
            .collect()
    }

    async fn read_storage(&self, contract: &str, path: &[StorageKey]) -> Result<String, LedgerError> {
        self.throttle().await;
        let key = StorageKey::path_hex(path);
        let url = format!("{}/address/{}/key/{}", self.gateway_url, contract, key);
        let response = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<GatewayResponse<StorageValue>>()
            .await?;
        Ok(response.data.value)
    }

    async fn read_storage_keys(&self, contract: &str) -> Result<BTreeMap<String, String>, LedgerError> {
        self.throttle().await;
        debug!("Listing storage of {}", contract);
        let url = format!("{}/address/{}/keys", self.gateway_url, contract);
        let response = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<GatewayResponse<StoragePairs>>()
            .await?;
        Ok(response.data.pairs)
    }
}
