use super::amm::pow10;
use super::token::TokenService;
use super::ComputeError;
use crate::cache::{CacheAside, CacheStore, CacheTtlInfo};
use crate::contracts::GovernanceAbi;
use crate::models::GovernanceFamily;
use bigdecimal::{BigDecimal, RoundingMode, Zero};
use std::collections::HashMap;
use std::sync::Arc;

/// Fraction digits kept when a smoothed value is rendered
const RENDER_SCALE: i64 = 20;

/// Length of the plain decimal rendering of `value`, fraction included,
/// after rounding to `RENDER_SCALE` places and dropping trailing zeros
pub fn rendered_len(value: &BigDecimal) -> usize {
    value
        .with_scale_round(RENDER_SCALE, RoundingMode::HalfUp)
        .normalized()
        .to_plain_string()
        .len()
}

/// Maps a raw quorum amount to voting power
pub trait Smoothing: Send + Sync {
    fn smooth(&self, quorum: &BigDecimal) -> BigDecimal;
}

/// One token, one vote
pub struct IdentitySmoothing;

impl Smoothing for IdentitySmoothing {
    fn smooth(&self, quorum: &BigDecimal) -> BigDecimal {
        quorum.clone()
    }
}

/// Square-root voting, dampening large holders
pub struct SquareRootSmoothing;

impl Smoothing for SquareRootSmoothing {
    fn smooth(&self, quorum: &BigDecimal) -> BigDecimal {
        if *quorum <= BigDecimal::zero() {
            return BigDecimal::zero();
        }
        quorum.sqrt().unwrap_or_else(BigDecimal::zero)
    }
}

pub fn smoothing_for(family: GovernanceFamily) -> Arc<dyn Smoothing> {
    match family {
        GovernanceFamily::TokenSnapshot => Arc::new(IdentitySmoothing),
        GovernanceFamily::Energy => Arc::new(SquareRootSmoothing),
    }
}

/// Voting power metrics of one governance family, cached under `governance`
pub struct GovernanceCompute {
    cache: CacheAside,
    abi: GovernanceAbi,
    tokens: Arc<TokenService>,
    smoothing: Arc<dyn Smoothing>,
}

impl GovernanceCompute {
    pub fn new(
        store: Arc<CacheStore>,
        abi: GovernanceAbi,
        tokens: Arc<TokenService>,
        smoothing: Arc<dyn Smoothing>,
    ) -> Self {
        Self {
            cache: CacheAside::new(store, "governance"),
            abi,
            tokens,
            smoothing,
        }
    }

    /// Decimals of the smoothed voting power: rendered length of the smoothed
    /// value of one whole fee token, minus one. A fractional result (square
    /// root of an odd power of ten) counts its fraction digits and the point.
    pub async fn voting_power_decimals(&self, contract: &str) -> Result<u32, ComputeError> {
        let key = self.cache.key("votingPowerDecimals").arg(contract);
        self.cache
            .wrap(key, CacheTtlInfo::CONTRACT_STATE, || async {
                let fee_token_id = self.abi.fee_token_id(contract).await?;
                let fee_token = self.tokens.token(&fee_token_id).await?;
                let smoothed = self.smoothing.smooth(&pow10(i64::from(fee_token.decimals)));
                let length = rendered_len(&smoothed) as u32;
                Ok::<_, ComputeError>(length.saturating_sub(1))
            })
            .await
    }

    pub async fn total_voting_power(&self, contract: &str, proposal_id: u64) -> Result<BigDecimal, ComputeError> {
        let key = self.cache.key("totalVotingPower").arg(contract).arg(proposal_id);
        self.cache
            .wrap(key, CacheTtlInfo::CONTRACT_STATE, || async {
                let quorum = self
                    .abi
                    .read_proposal_total_quorum(contract, proposal_id)
                    .await?
                    .ok_or_else(|| {
                        ComputeError::NotFound(format!("proposal {} on {}", proposal_id, contract))
                    })?;
                Ok::<_, ComputeError>(self.smoothing.smooth(&quorum))
            })
            .await
    }
}

/// Governance contracts by address, each bound to its family's smoothing
#[derive(Default)]
pub struct GovernanceRegistry {
    contracts: HashMap<String, Arc<GovernanceCompute>>,
}

impl GovernanceRegistry {
    pub fn new(
        store: Arc<CacheStore>,
        abi: GovernanceAbi,
        tokens: Arc<TokenService>,
        contracts: &[(String, GovernanceFamily)],
    ) -> Self {
        let mut families: HashMap<GovernanceFamily, Arc<GovernanceCompute>> = HashMap::new();
        let contracts = contracts
            .iter()
            .map(|(address, family)| {
                let compute = families
                    .entry(*family)
                    .or_insert_with(|| {
                        Arc::new(GovernanceCompute::new(
                            store.clone(),
                            abi.clone(),
                            tokens.clone(),
                            smoothing_for(*family),
                        ))
                    })
                    .clone();
                (address.clone(), compute)
            })
            .collect();

        Self { contracts }
    }

    pub fn for_contract(&self, address: &str) -> Result<Arc<GovernanceCompute>, ComputeError> {
        self.contracts
            .get(address)
            .cloned()
            .ok_or_else(|| ComputeError::NotFound(format!("governance contract {}", address)))
    }
}
