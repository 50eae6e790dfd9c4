#[cfg(test)]
mod tests {
    use crate::compute::ComputeError;
    use crate::tests::support::{address, u64_bytes, Fixture};
    use crate::validation::ValidationError;

    async fn fixture_with_first_week(start: u64) -> (Fixture, String) {
        let fixture = Fixture::new().await;
        let contract = address(30);
        fixture
            .ledger
            .set_view(&contract, "getFirstWeekStartEpoch", vec![u64_bytes(start)]);
        (fixture, contract)
    }

    #[tokio::test]
    async fn test_week_bounds() {
        let (fixture, contract) = fixture_with_first_week(100).await;
        let state = fixture.state();

        assert_eq!(state.week.start_epoch_for_week(&contract, 1).await.unwrap(), 100);
        assert_eq!(state.week.end_epoch_for_week(&contract, 1).await.unwrap(), 106);
        assert_eq!(state.week.start_epoch_for_week(&contract, 3).await.unwrap(), 114);
    }

    #[tokio::test]
    async fn test_week_for_epoch() {
        let (fixture, contract) = fixture_with_first_week(100).await;
        let state = fixture.state();

        assert_eq!(state.week.week_for_epoch(&contract, 100).await.unwrap(), 1);
        assert_eq!(state.week.week_for_epoch(&contract, 106).await.unwrap(), 1);
        assert_eq!(state.week.week_for_epoch(&contract, 107).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_invalid_inputs() {
        let (fixture, contract) = fixture_with_first_week(100).await;
        let state = fixture.state();

        let before = state.week.week_for_epoch(&contract, 50).await;
        assert!(matches!(
            before,
            Err(ComputeError::Validation(ValidationError::EpochBeforeFirstWeek {
                epoch: 50,
                first_week_start_epoch: 100
            }))
        ));

        let zero = state.week.start_epoch_for_week(&contract, 0).await;
        assert!(matches!(zero, Err(ComputeError::Validation(ValidationError::InvalidWeek(0)))));
        let negative = state.week.end_epoch_for_week(&contract, -2).await;
        assert!(matches!(negative, Err(ComputeError::Validation(ValidationError::InvalidWeek(-2)))));
    }

    #[tokio::test]
    async fn test_huge_week_is_an_arithmetic_error() {
        let (fixture, contract) = fixture_with_first_week(100).await;
        let state = fixture.state();

        let start = state.week.start_epoch_for_week(&contract, i64::MAX).await;
        assert!(matches!(start, Err(ComputeError::Arithmetic(_))));
        let end = state.week.end_epoch_for_week(&contract, i64::MAX).await;
        assert!(matches!(end, Err(ComputeError::Arithmetic(_))));

        // Largest week whose start epoch still fits
        let last = (u64::MAX - 100) / 7 + 1;
        let start = state.week.start_epoch_for_week(&contract, last as i64).await.unwrap();
        assert_eq!(start, 100 + (last - 1) * 7);
    }
}
