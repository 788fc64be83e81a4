//! Environment configuration
//!
//! Read once at startup, after `.env` has been loaded. CLI flags override
//! the host and port.

use anyhow::{Context, Result};
use backtest_engine::{AlphaVantageClient, BinanceClient};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
const DEFAULT_ALPHA_VANTAGE_KEY: &str = "demo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub alpha_vantage_api_key: String,
    pub binance_base_url: Option<String>,
    pub alpha_vantage_base_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("TRADELOG_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("TRADELOG_PORT must be a port number, got '{}'", raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host: get("TRADELOG_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            alpha_vantage_api_key: get("ALPHA_VANTAGE_API_KEY")
                .unwrap_or_else(|| DEFAULT_ALPHA_VANTAGE_KEY.to_string()),
            binance_base_url: get("BINANCE_BASE_URL"),
            alpha_vantage_base_url: get("ALPHA_VANTAGE_BASE_URL"),
        })
    }

    pub fn binance_client(&self) -> BinanceClient {
        match &self.binance_base_url {
            Some(url) => BinanceClient::with_base_url(url.as_str()),
            None => BinanceClient::new(),
        }
    }

    pub fn alpha_vantage_client(&self) -> AlphaVantageClient {
        match &self.alpha_vantage_base_url {
            Some(url) => {
                AlphaVantageClient::with_base_url(url.as_str(), self.alpha_vantage_api_key.as_str())
            }
            None => AlphaVantageClient::new(self.alpha_vantage_api_key.as_str()),
        }
    }
}
