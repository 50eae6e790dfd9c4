// Domain types shared by the cache, compute and ingestion layers.
// Amounts are raw integer token units carried as BigDecimal; prices and USD
// values are fractional BigDecimals.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Static token metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub identifier: String,
    pub ticker: String,
    pub decimals: u32,
}

/// Shadow copy of a pair's on-chain reserves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairReserveSnapshot {
    pub pair_address: String,
    pub first_token_reserve: BigDecimal,
    pub second_token_reserve: BigDecimal,
    pub lp_supply: BigDecimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairState {
    Inactive,
    Active,
    PartialActive,
}

impl PairState {
    pub fn from_discriminant(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::Inactive),
            1 => Some(Self::Active),
            2 => Some(Self::PartialActive),
            _ => None,
        }
    }
}

/// A swap as emitted by a pair contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapEvent {
    pub pair_address: String,
    pub token_in_id: String,
    pub token_out_id: String,
    pub amount_in: BigDecimal,
    pub amount_out: BigDecimal,
    pub reserves_in_after: BigDecimal,
    pub reserves_out_after: BigDecimal,
    pub timestamp: i64,
}

/// A fee-less swap; only forwarded to live subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapNoFeeEvent {
    pub pair_address: String,
    pub token_in_id: String,
    pub amount_in: BigDecimal,
    pub token_out_id: String,
    pub timestamp: i64,
}

/// Events consumed by the ingestion workers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "identifier", content = "data")]
pub enum PairEvent {
    #[serde(rename = "swapTokensFixedInput")]
    SwapFixedInput(SwapEvent),
    #[serde(rename = "swapTokensFixedOutput")]
    SwapFixedOutput(SwapEvent),
    #[serde(rename = "swapNoFeeAndForward")]
    SwapNoFee(SwapNoFeeEvent),
}

impl PairEvent {
    pub fn pair_address(&self) -> &str {
        match self {
            Self::SwapFixedInput(event) | Self::SwapFixedOutput(event) => &event.pair_address,
            Self::SwapNoFee(event) => &event.pair_address,
        }
    }
}

/// Per-pair values recomputed from one swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairDelta {
    pub pair_address: String,
    pub first_token_price: BigDecimal,
    pub second_token_price: BigDecimal,
    pub first_token_locked: BigDecimal,
    pub second_token_locked: BigDecimal,
    pub first_token_locked_value_usd: BigDecimal,
    pub second_token_locked_value_usd: BigDecimal,
    pub first_token_volume: BigDecimal,
    pub second_token_volume: BigDecimal,
    pub locked_value_usd: BigDecimal,
    pub liquidity: BigDecimal,
    pub volume_usd: BigDecimal,
    pub fees_usd: BigDecimal,
}

/// Per-token aggregate values recomputed from one swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenDelta {
    pub token_id: String,
    pub locked_value: BigDecimal,
    pub locked_value_usd: BigDecimal,
    pub price_usd: BigDecimal,
    pub volume: BigDecimal,
    pub volume_usd: BigDecimal,
}

/// Protocol-wide values recomputed from one swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactoryDelta {
    pub total_locked_value_usd: BigDecimal,
}

/// Everything one ingestion pass produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapDeltas {
    pub pair: PairDelta,
    pub first_token: TokenDelta,
    pub second_token: TokenDelta,
    pub factory: FactoryDelta,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapType {
    FixedInput,
    FixedOutput,
}

impl SwapType {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::FixedInput => "swapTokensFixedInput",
            Self::FixedOutput => "swapTokensFixedOutput",
        }
    }
}

/// Caller-supplied multi-hop route with per-hop estimates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSpec {
    pub swap_type: SwapType,
    pub address_route: Vec<String>,
    pub token_route: Vec<String>,
    pub intermediary_amounts: Vec<BigDecimal>,
    pub tolerance: BigDecimal,
}

impl RouteSpec {
    pub fn hops(&self) -> usize {
        self.address_route.len()
    }
}

/// One hop of a multi-pair swap with its slippage-adjusted amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HopSwap {
    pub pair_address: String,
    pub endpoint: String,
    pub token_out: String,
    pub amount: BigDecimal,
}

/// Arguments for a router multi-pair swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiPairSwap {
    pub token_in: String,
    pub amount_in: BigDecimal,
    pub swaps: Vec<HopSwap>,
    pub gas_limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FarmVersion {
    V1_2,
    V1_3,
}

impl FarmVersion {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "v1.2" | "v1_2" | "1.2" => Some(Self::V1_2),
            "v1.3" | "v1_3" | "1.3" => Some(Self::V1_3),
            _ => None,
        }
    }
}

impl fmt::Display for FarmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1_2 => write!(f, "v1.2"),
            Self::V1_3 => write!(f, "v1.3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GovernanceFamily {
    TokenSnapshot,
    Energy,
}

impl GovernanceFamily {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "token-snapshot" | "token_snapshot" | "snapshot" => Some(Self::TokenSnapshot),
            "energy" => Some(Self::Energy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FarmState {
    Inactive,
    Active,
}

impl FarmState {
    pub fn from_discriminant(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::Inactive),
            1 => Some(Self::Active),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceDiscoveryPhase {
    Idle,
    NoPenalty,
    LinearIncreasingPenalty,
    FixedPenalty,
    Withdraw,
    Redeem,
}

impl PriceDiscoveryPhase {
    pub fn from_discriminant(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::NoPenalty),
            2 => Some(Self::LinearIncreasingPenalty),
            3 => Some(Self::FixedPenalty),
            4 => Some(Self::Withdraw),
            5 => Some(Self::Redeem),
            _ => None,
        }
    }
}

/// Named permission flags held by an address on the escrow contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    None,
    Owner,
    Admin,
    Pause,
}

impl Permission {
    pub const FLAGS: [(u64, Permission); 3] = [
        (1 << 0, Permission::Owner),
        (1 << 1, Permission::Admin),
        (1 << 2, Permission::Pause),
    ];

    /// Split a raw permission bitmask into its named flags.
    /// Zero maps to `[None]`; bits outside the known flags are dropped.
    pub fn decompose(mask: u64) -> Vec<Permission> {
        if mask == 0 {
            return vec![Permission::None];
        }
        Self::FLAGS
            .iter()
            .filter(|(bit, _)| mask & bit != 0)
            .map(|(_, flag)| *flag)
            .collect()
    }

    pub fn known_bits() -> u64 {
        Self::FLAGS.iter().fold(0, |acc, (bit, _)| acc | bit)
    }
}

/// One point of a time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricPoint {
    pub timestamp: i64,
    pub value: BigDecimal,
}

/// A token amount with its nonce, as carried inside contract structs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPayment {
    pub token_identifier: String,
    pub token_nonce: u64,
    pub amount: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedFunds {
    pub funds: Vec<TokenPayment>,
    pub locked_epoch: u64,
}

/// Funds a sender has queued on the escrow for one receiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTransfer {
    pub sender: String,
    pub locked_funds: LockedFunds,
}

/// Decoded attributes of a simple-lock locked token nonce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedTokenAttributes {
    pub identifier: String,
    pub attributes: String,
    pub original_token_id: String,
    pub original_token_nonce: u64,
    pub unlock_epoch: u64,
}

/// Decoded attributes of a simple-lock LP proxy token nonce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpProxyTokenAttributes {
    pub identifier: String,
    pub attributes: String,
    pub lp_token_id: String,
    pub first_token_id: String,
    pub first_token_locked_nonce: u64,
    pub second_token_id: String,
    pub second_token_locked_nonce: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FarmType {
    SimpleFarm,
    FarmWithLockedRewards,
}

impl FarmType {
    pub fn from_discriminant(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::SimpleFarm),
            1 => Some(Self::FarmWithLockedRewards),
            _ => None,
        }
    }
}

/// Decoded attributes of a simple-lock farm proxy token nonce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmProxyTokenAttributes {
    pub identifier: String,
    pub attributes: String,
    pub farm_type: FarmType,
    pub farm_token_id: String,
    pub farm_token_nonce: u64,
    pub farming_token_id: String,
    pub farming_token_locked_nonce: u64,
}
