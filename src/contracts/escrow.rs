use super::ViewCache;
use crate::blockchain::client::{LedgerArg, LedgerError, LedgerReader, StorageKey};
use crate::blockchain::models::{
    decode_address, decode_hex_address, decode_hex_string, decode_hex_u64, decode_u64, first_value, NestedDecoder,
};
use crate::cache::{CacheStore, CacheTtlInfo};
use crate::models::{LockedFunds, Permission, ScheduledTransfer, TokenPayment};
use std::sync::Arc;
use tracing::warn;

const ALL_SENDERS: &str = "allSenders";
const ITEM_SUFFIX: &str = ".item";

/// Escrow contract views and storage reads
#[derive(Clone)]
pub struct EscrowAbi {
    views: ViewCache,
    address: String,
}

impl EscrowAbi {
    pub fn new(ledger: Arc<dyn LedgerReader>, store: Arc<CacheStore>, address: &str) -> Self {
        Self {
            views: ViewCache::new(ledger, store, "escrow"),
            address: address.to_string(),
        }
    }

    async fn storage(&self, path: Vec<StorageKey>) -> Result<String, LedgerError> {
        self.views.ledger().read_storage(&self.address, &path).await
    }

    /// Unset storage reads as zero
    async fn storage_u64(&self, path: Vec<StorageKey>) -> Result<u64, LedgerError> {
        let value = self.storage(path).await?;
        if value.is_empty() {
            return Ok(0);
        }
        decode_hex_u64(&value)
    }

    pub async fn scheduled_transfers(&self, receiver: &str) -> Result<Vec<ScheduledTransfer>, LedgerError> {
        let key = self.views.key("scheduledTransfers").arg(receiver);
        self.views
            .cached(key, CacheTtlInfo::ESCROW, self.read_scheduled_transfers(receiver))
            .await
    }

    pub async fn read_scheduled_transfers(&self, receiver: &str) -> Result<Vec<ScheduledTransfer>, LedgerError> {
        let values = self
            .views
            .ledger()
            .read(
                &self.address,
                "getScheduledTransfers",
                &[LedgerArg::Address(receiver.to_string())],
            )
            .await?;
        // An empty list comes back as no return data at all
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let raw = first_value(values, "getScheduledTransfers")?;

        let mut decoder = NestedDecoder::new(&raw);
        let mut transfers = Vec::new();
        while !decoder.is_empty() {
            let sender = decoder.read_address()?;
            let funds = decoder.read_list(|item| {
                Ok(TokenPayment {
                    token_identifier: item.read_string()?,
                    token_nonce: item.read_u64()?,
                    amount: item.read_biguint()?,
                })
            })?;
            let locked_epoch = decoder.read_u64()?;
            transfers.push(ScheduledTransfer {
                sender,
                locked_funds: LockedFunds { funds, locked_epoch },
            });
        }
        Ok(transfers)
    }

    pub async fn address_permission(&self, address: &str) -> Result<Vec<Permission>, LedgerError> {
        let key = self.views.key("addressPermission").arg(address);
        self.views
            .cached(key, CacheTtlInfo::ESCROW, self.read_address_permission(address))
            .await
    }

    pub async fn read_address_permission(&self, address: &str) -> Result<Vec<Permission>, LedgerError> {
        let raw = self
            .views
            .read_one(&self.address, "getPermissions", &[LedgerArg::Address(address.to_string())])
            .await?;
        let mask = decode_u64(&raw)?;
        if mask & !Permission::known_bits() != 0 {
            warn!("Address {} has unknown permission bits in {:#b}", address, mask);
        }
        Ok(Permission::decompose(mask))
    }

    pub async fn all_senders(&self, receiver: &str) -> Result<Vec<String>, LedgerError> {
        let key = self.views.key("allSenders").arg(receiver);
        let read = async {
            self.views
                .ledger()
                .read(&self.address, "getAllSenders", &[LedgerArg::Address(receiver.to_string())])
                .await?
                .iter()
                .map(|value| decode_address(value))
                .collect::<Result<Vec<_>, LedgerError>>()
        };
        self.views.cached(key, CacheTtlInfo::ESCROW, read).await
    }

    pub async fn all_receivers(&self, sender: &str) -> Result<Vec<String>, LedgerError> {
        let key = self.views.key("allReceivers").arg(sender);
        self.views
            .cached(key, CacheTtlInfo::ESCROW, self.read_all_receivers(sender))
            .await
    }

    /// Receivers whose `allSenders` set holds `sender`, found by scanning the
    /// contract storage for `allSenders{receiver}.item{index}` entries
    pub async fn read_all_receivers(&self, sender: &str) -> Result<Vec<String>, LedgerError> {
        let entries = self.views.ledger().read_storage_keys(&self.address).await?;
        let senders_hex = hex::encode(ALL_SENDERS);
        let item_hex = hex::encode(ITEM_SUFFIX);
        let sender = sender.to_lowercase();

        let mut receivers: Vec<String> = Vec::new();
        for (key, value) in entries {
            if value.to_lowercase() != sender {
                continue;
            }
            let Some((_, rest)) = key.split_once(&senders_hex) else {
                continue;
            };
            let Some((receiver_hex, _)) = rest.split_once(&item_hex) else {
                continue;
            };
            let receiver = decode_hex_address(receiver_hex)?;
            if !receivers.contains(&receiver) {
                receivers.push(receiver);
            }
        }
        Ok(receivers)
    }

    pub async fn sender_last_transfer_epoch(&self, sender: &str) -> Result<u64, LedgerError> {
        let key = self.views.key("senderLastTransferEpoch").arg(sender);
        let read = self.storage_u64(vec![
            StorageKey::Name("senderLastTransferEpoch".to_string()),
            StorageKey::Address(sender.to_string()),
        ]);
        self.views.cached(key, CacheTtlInfo::ESCROW, read).await
    }

    pub async fn receiver_last_transfer_epoch(&self, receiver: &str) -> Result<u64, LedgerError> {
        let key = self.views.key("receiverLastTransferEpoch").arg(receiver);
        let read = self.storage_u64(vec![
            StorageKey::Name("receiverLastTransferEpoch".to_string()),
            StorageKey::Address(receiver.to_string()),
        ]);
        self.views.cached(key, CacheTtlInfo::ESCROW, read).await
    }

    pub async fn energy_factory_address(&self) -> Result<String, LedgerError> {
        let key = self.views.key("energyFactoryAddress");
        let read = async {
            let value = self
                .storage(vec![StorageKey::Name("energyFactoryAddress".to_string())])
                .await?;
            decode_hex_address(&value)
        };
        self.views.cached(key, CacheTtlInfo::CONTRACT_INFO, read).await
    }

    pub async fn locked_token_id(&self) -> Result<String, LedgerError> {
        let key = self.views.key("lockedTokenID");
        let read = async {
            let value = self.storage(vec![StorageKey::Name("lockedTokenId".to_string())]).await?;
            decode_hex_string(&value)
        };
        self.views.cached(key, CacheTtlInfo::TOKEN, read).await
    }

    pub async fn min_lock_epochs(&self) -> Result<u64, LedgerError> {
        let key = self.views.key("minLockEpochs");
        let read = self.storage_u64(vec![StorageKey::Name("minLockEpochs".to_string())]);
        self.views.cached(key, CacheTtlInfo::CONTRACT_INFO, read).await
    }

    pub async fn epochs_cooldown_duration(&self) -> Result<u64, LedgerError> {
        let key = self.views.key("epochsCooldownDuration");
        let read = self.storage_u64(vec![StorageKey::Name("epochsCooldownDuration".to_string())]);
        self.views.cached(key, CacheTtlInfo::CONTRACT_INFO, read).await
    }
}
