use super::ComputeError;
use crate::blockchain::client::LedgerError;
use crate::blockchain::models::{token_identifier, NestedDecoder};
use crate::cache::{CacheAside, CacheStore, CacheTtlInfo};
use crate::contracts::SimpleLockAbi;
use crate::models::{FarmProxyTokenAttributes, FarmType, LockedTokenAttributes, LpProxyTokenAttributes};
use crate::providers::TokenMetadataSource;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

fn attribute_bytes(attributes: &str) -> Result<Vec<u8>, LedgerError> {
    STANDARD
        .decode(attributes.trim())
        .map_err(|e| LedgerError::Decode(format!("invalid attributes encoding: {}", e)))
}

pub fn decode_locked_token_attributes(identifier: &str, attributes: &str) -> Result<LockedTokenAttributes, LedgerError> {
    let raw = attribute_bytes(attributes)?;
    let mut decoder = NestedDecoder::new(&raw);
    Ok(LockedTokenAttributes {
        identifier: identifier.to_string(),
        attributes: attributes.to_string(),
        original_token_id: decoder.read_string()?,
        original_token_nonce: decoder.read_u64()?,
        unlock_epoch: decoder.read_u64()?,
    })
}

pub fn decode_lp_proxy_token_attributes(
    identifier: &str,
    attributes: &str,
) -> Result<LpProxyTokenAttributes, LedgerError> {
    let raw = attribute_bytes(attributes)?;
    let mut decoder = NestedDecoder::new(&raw);
    Ok(LpProxyTokenAttributes {
        identifier: identifier.to_string(),
        attributes: attributes.to_string(),
        lp_token_id: decoder.read_string()?,
        first_token_id: decoder.read_string()?,
        first_token_locked_nonce: decoder.read_u64()?,
        second_token_id: decoder.read_string()?,
        second_token_locked_nonce: decoder.read_u64()?,
    })
}

pub fn decode_farm_proxy_token_attributes(
    identifier: &str,
    attributes: &str,
) -> Result<FarmProxyTokenAttributes, LedgerError> {
    let raw = attribute_bytes(attributes)?;
    let mut decoder = NestedDecoder::new(&raw);
    let discriminant = decoder.read_u8()?;
    let farm_type = FarmType::from_discriminant(discriminant)
        .ok_or_else(|| LedgerError::Decode(format!("unknown farm type {}", discriminant)))?;
    Ok(FarmProxyTokenAttributes {
        identifier: identifier.to_string(),
        attributes: attributes.to_string(),
        farm_type,
        farm_token_id: decoder.read_string()?,
        farm_token_nonce: decoder.read_u64()?,
        farming_token_id: decoder.read_string()?,
        farming_token_locked_nonce: decoder.read_u64()?,
    })
}

/// Decoded attributes of simple-lock token nonces, cached under `simpleLock`.
///
/// Attributes of a nonce never change once minted, so a decoded value is
/// only dropped when its TTL runs out.
pub struct SimpleLockService {
    cache: CacheAside,
    abi: SimpleLockAbi,
    metadata: Arc<dyn TokenMetadataSource>,
    contracts: Vec<String>,
}

impl SimpleLockService {
    pub fn new(
        store: Arc<CacheStore>,
        abi: SimpleLockAbi,
        metadata: Arc<dyn TokenMetadataSource>,
        contracts: Vec<String>,
    ) -> Self {
        Self {
            cache: CacheAside::new(store, "simpleLock"),
            abi,
            metadata,
            contracts,
        }
    }

    pub fn abi(&self) -> &SimpleLockAbi {
        &self.abi
    }

    /// The configured simple-lock contract issuing `token_id` as its locked,
    /// LP proxy or farm proxy collection
    pub async fn contract_by_token_id(&self, token_id: &str) -> Result<String, ComputeError> {
        for contract in &self.contracts {
            let (locked, lp_proxy, farm_proxy) = tokio::try_join!(
                self.abi.locked_token_id(contract),
                self.abi.lp_proxy_token_id(contract),
                self.abi.farm_proxy_token_id(contract)
            )?;
            if token_id == locked || token_id == lp_proxy || token_id == farm_proxy {
                return Ok(contract.clone());
            }
        }
        Err(ComputeError::NotFound(format!("simple lock contract for {}", token_id)))
    }

    async fn decoded<T>(
        &self,
        contract: &str,
        identifier: &str,
        decode: fn(&str, &str) -> Result<T, LedgerError>,
    ) -> Result<T, ComputeError>
    where
        T: Serialize + DeserializeOwned,
    {
        let key = self.cache.key("decodedAttributes").arg(identifier);
        self.cache
            .wrap(key, CacheTtlInfo::ATTRIBUTES, || async {
                let attributes = self.metadata.nft_attributes(contract, identifier).await?;
                Ok::<_, ComputeError>(decode(identifier, &attributes)?)
            })
            .await
    }

    pub async fn locked_token_attributes(
        &self,
        token_id: &str,
        nonce: u64,
    ) -> Result<LockedTokenAttributes, ComputeError> {
        let contract = self.contract_by_token_id(token_id).await?;
        let collection = self.abi.locked_token_id(&contract).await?;
        let identifier = token_identifier(&collection, nonce);

        self.decoded(&contract, &identifier, decode_locked_token_attributes).await
    }

    pub async fn lp_proxy_token_attributes(
        &self,
        token_id: &str,
        nonce: u64,
    ) -> Result<LpProxyTokenAttributes, ComputeError> {
        let contract = self.contract_by_token_id(token_id).await?;
        let collection = self.abi.lp_proxy_token_id(&contract).await?;
        let identifier = token_identifier(&collection, nonce);

        self.decoded(&contract, &identifier, decode_lp_proxy_token_attributes).await
    }

    /// Decode many `(identifier, attributes)` pairs without touching the cache
    pub fn decode_batch_locked_token_attributes(
        &self,
        batch: &[(String, String)],
    ) -> Result<Vec<LockedTokenAttributes>, LedgerError> {
        batch
            .iter()
            .map(|(identifier, attributes)| decode_locked_token_attributes(identifier, attributes))
            .collect()
    }

    pub fn decode_batch_lp_proxy_token_attributes(
        &self,
        batch: &[(String, String)],
    ) -> Result<Vec<LpProxyTokenAttributes>, LedgerError> {
        batch
            .iter()
            .map(|(identifier, attributes)| decode_lp_proxy_token_attributes(identifier, attributes))
            .collect()
    }

    pub fn decode_batch_farm_proxy_token_attributes(
        &self,
        batch: &[(String, String)],
    ) -> Result<Vec<FarmProxyTokenAttributes>, LedgerError> {
        batch
            .iter()
            .map(|(identifier, attributes)| decode_farm_proxy_token_attributes(identifier, attributes))
            .collect()
    }
}
