use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::types::TradingPair;

/// Anything that can produce a full list of trading pairs in one read.
pub trait PairSource {
    fn fetch_pairs(&self) -> impl Future<Output = Result<Vec<TradingPair>>> + Send;
}

/// REST client for the trading-pairs endpoint.
#[derive(Debug, Clone)]
pub struct HttpPairSource {
    client: reqwest::Client,
    url: String,
}

impl HttpPairSource {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: cfg.pairs_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl PairSource for HttpPairSource {
    async fn fetch_pairs(&self) -> Result<Vec<TradingPair>> {
        debug!("GET {}", self.url);
        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }
        let body = resp.text().await?;
        parse_pairs(&body)
    }
}

/// Decode the endpoint body: a JSON array of pair objects.
pub fn parse_pairs(body: &str) -> Result<Vec<TradingPair>> {
    Ok(serde_json::from_str::<Vec<TradingPair>>(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pair_array() {
        let body = r#"[
            {"id":1,"symbol":"BTCUSDT","category":"linear","last_price":"65000.1234","volume_24h":"500000000","funding_rate":"0.000100","price_change_percent_24h":"2.50"},
            {"id":2,"symbol":"ETHUSDT","category":"spot","last_price":"3000.50","volume_24h":"200000000","funding_rate":"-0.000050","price_change_percent_24h":"-1.20"}
        ]"#;
        let pairs = parse_pairs(body).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].symbol, "BTCUSDT");
        assert_eq!(pairs[1].category, "spot");
        assert_eq!(pairs[1].funding_rate(), Some(-0.00005));
    }

    #[test]
    fn empty_array_is_ok() {
        assert!(parse_pairs("[]").unwrap().is_empty());
    }

    #[test]
    fn non_array_is_json_error() {
        assert!(matches!(parse_pairs(r#"{"results":[]}"#), Err(AppError::Json(_))));
        assert!(matches!(parse_pairs("<html>"), Err(AppError::Json(_))));
    }

    #[test]
    fn missing_symbol_is_json_error() {
        let body = r#"[{"id":1,"category":"spot"}]"#;
        assert!(matches!(parse_pairs(body), Err(AppError::Json(_))));
    }
}
