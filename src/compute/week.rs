use super::ComputeError;
use crate::cache::{CacheAside, CacheStore, CacheTtlInfo};
use crate::contracts::WeekTimekeepingAbi;
use crate::validation::{validate_week, ValidationError};

/// Epoch/week conversions for contracts with weekly reward periods.
/// Week 1 starts at the contract's first week start epoch.
pub struct WeekTimekeepingCompute {
    cache: CacheAside,
    abi: WeekTimekeepingAbi,
    epochs_in_week: u64,
}

impl WeekTimekeepingCompute {
    pub fn new(store: std::sync::Arc<CacheStore>, abi: WeekTimekeepingAbi, epochs_in_week: u64) -> Self {
        Self {
            cache: CacheAside::new(store, "weekTimekeeping"),
            abi,
            epochs_in_week: epochs_in_week.max(1),
        }
    }

    pub async fn week_for_epoch(&self, contract: &str, epoch: u64) -> Result<u64, ComputeError> {
        let key = self.cache.key("weekForEpoch").arg(contract).arg(epoch);
        self.cache
            .wrap(key, CacheTtlInfo::CONTRACT_STATE, || async {
                let first_week_start_epoch = self.abi.first_week_start_epoch(contract).await?;
                if epoch < first_week_start_epoch {
                    return Err(ComputeError::from(ValidationError::EpochBeforeFirstWeek {
                        epoch,
                        first_week_start_epoch,
                    }));
                }
                Ok::<_, ComputeError>((epoch - first_week_start_epoch) / self.epochs_in_week + 1)
            })
            .await
    }

    pub async fn start_epoch_for_week(&self, contract: &str, week: i64) -> Result<u64, ComputeError> {
        let key = self.cache.key("startEpochForWeek").arg(contract).arg(week);
        self.cache
            .wrap(key, CacheTtlInfo::CONTRACT_STATE, || self.compute_start_epoch_for_week(contract, week))
            .await
    }

    async fn compute_start_epoch_for_week(&self, contract: &str, week: i64) -> Result<u64, ComputeError> {
        let week = validate_week(week)?;
        let first_week_start_epoch = self.abi.first_week_start_epoch(contract).await?;
        (week - 1)
            .checked_mul(self.epochs_in_week)
            .and_then(|offset| offset.checked_add(first_week_start_epoch))
            .ok_or_else(|| ComputeError::Arithmetic(format!("start epoch for week {} overflows", week)))
    }

    pub async fn end_epoch_for_week(&self, contract: &str, week: i64) -> Result<u64, ComputeError> {
        let key = self.cache.key("endEpochForWeek").arg(contract).arg(week);
        self.cache
            .wrap(key, CacheTtlInfo::CONTRACT_STATE, || async {
                let start = self.compute_start_epoch_for_week(contract, week).await?;
                start
                    .checked_add(self.epochs_in_week - 1)
                    .ok_or_else(|| ComputeError::Arithmetic(format!("end epoch for week {} overflows", week)))
            })
            .await
    }
}
