#[cfg(test)]
mod tests {
    use crate::db::{TimeBucket, TimeSeriesStore};
    use crate::tests::support::{dec, memory_time_series};

    #[test]
    fn test_bucket_floor() {
        assert_eq!(TimeBucket::Hour.floor(7_250), 7_200);
        assert_eq!(TimeBucket::Day.floor(86_399), 0);
        assert_eq!(TimeBucket::Minute.floor(-30), -60);
    }

    #[tokio::test]
    async fn test_aggregate_sums_each_bucket() {
        let store = memory_time_series().await;
        store.record("p", "volumeUSD", 3_600, &dec("10")).await.unwrap();
        store.record("p", "volumeUSD", 3_700, &dec("5.5")).await.unwrap();
        store.record("p", "volumeUSD", 7_300, &dec("1")).await.unwrap();
        store.record("p", "feesUSD", 3_650, &dec("99")).await.unwrap();
        store.record("q", "volumeUSD", 3_650, &dec("99")).await.unwrap();

        let points = store
            .query_aggregate("p", "volumeUSD", TimeBucket::Hour, 0)
            .await
            .unwrap();
        let values: Vec<_> = points.iter().map(|point| (point.timestamp, point.value.clone())).collect();
        assert_eq!(values, vec![(3_600, dec("15.5")), (7_200, dec("1"))]);

        let later = store
            .query_aggregate("p", "volumeUSD", TimeBucket::Hour, 7_000)
            .await
            .unwrap();
        assert_eq!(later.len(), 1);
    }

    #[tokio::test]
    async fn test_closing_keeps_the_last_value_per_bucket() {
        let store = memory_time_series().await;
        store.record("pd", "launchedTokenPrice", 10, &dec("1")).await.unwrap();
        store.record("pd", "launchedTokenPrice", 50, &dec("2")).await.unwrap();
        store.record("pd", "launchedTokenPrice", 70, &dec("3")).await.unwrap();

        let points = store
            .query_closing("pd", "launchedTokenPrice", TimeBucket::Minute, 0)
            .await
            .unwrap();
        let values: Vec<_> = points.iter().map(|point| (point.timestamp, point.value.clone())).collect();
        assert_eq!(values, vec![(0, dec("2")), (60, dec("3"))]);
    }

    #[tokio::test]
    async fn test_latest_value() {
        let store = memory_time_series().await;
        assert_eq!(store.query_latest("pd", "acceptedTokenPrice").await.unwrap(), None);

        store.record("pd", "acceptedTokenPrice", 20, &dec("0.5")).await.unwrap();
        store.record("pd", "acceptedTokenPrice", 10, &dec("0.4")).await.unwrap();
        assert_eq!(
            store.query_latest("pd", "acceptedTokenPrice").await.unwrap(),
            Some(dec("0.5"))
        );
    }
}
