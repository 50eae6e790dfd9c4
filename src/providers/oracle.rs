use crate::config::Config;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Oracle request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid price for {symbol}: {value}")]
    InvalidPrice { symbol: String, value: String },

    #[error("No price available for {0}")]
    Unavailable(String),
}

/// USD price feed keyed by ticker symbol
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn get_price(&self, symbol: &str) -> Result<BigDecimal, OracleError>;
}

#[derive(Deserialize)]
struct PriceResponse {
    price: serde_json::Value,
}

pub struct HttpPriceOracle {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPriceOracle {
    pub fn new(config: &Config) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.rpc_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.oracle_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PriceOracle for HttpPriceOracle {
    async fn get_price(&self, symbol: &str) -> Result<BigDecimal, OracleError> {
        let url = format!("{}/tokens/{}/price", self.base_url, symbol);
        let response = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<PriceResponse>()
            .await?;

        // The feed sends either a JSON number or a decimal string
        let raw = match response.price {
            serde_json::Value::String(value) => value,
            serde_json::Value::Number(value) => value.to_string(),
            serde_json::Value::Null => return Err(OracleError::Unavailable(symbol.to_string())),
            other => other.to_string(),
        };

        let price = BigDecimal::from_str(&raw).map_err(|_| OracleError::InvalidPrice {
            symbol: symbol.to_string(),
            value: raw.clone(),
        })?;
        debug!("Oracle price for {}: {}", symbol, price);
        Ok(price)
    }
}
