//! Configuration
//!
//! Deserialized from `config.json`; every key is optional and falls back to
//! the defaults below. Decimal-valued settings (prices, balances) are JSON
//! strings to keep precision.

use anyhow::Context;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub exchange: ExchangeConfig,
    pub failures: FailuresConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8765,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub symbols: Vec<String>,
    /// Market-data tick interval in seconds (millisecond precision)
    pub tick_interval: f64,
    pub initial_prices: HashMap<String, String>,
    /// Full bid/ask spread in basis points
    pub spread_bps: u32,
    /// Rolling price-history window per symbol
    pub history_size: usize,
    pub pricing_model: PricingModelConfig,
    pub default_balance: HashMap<String, String>,
    /// MARKET order with zero fill: REJECTED when true, CANCELLED otherwise
    pub reject_unfilled_market: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["BTC/USD".to_string()],
            tick_interval: 0.1,
            initial_prices: HashMap::from([("BTC/USD".to_string(), "50000".to_string())]),
            spread_bps: 10,
            history_size: 10_000,
            pricing_model: PricingModelConfig::default(),
            default_balance: HashMap::from([
                ("USD".to_string(), "100000".to_string()),
                ("BTC".to_string(), "10".to_string()),
            ]),
            reject_unfilled_market: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PricingModelConfig {
    /// "gbm" or "random_walk"
    pub model_type: String,
    /// Annualized drift (GBM only)
    pub drift: f64,
    /// Annualized volatility
    pub volatility: f64,
    /// Deterministic model seed; entropy when absent
    pub seed: Option<u64>,
}

impl Default for PricingModelConfig {
    fn default() -> Self {
        Self {
            model_type: "gbm".to_string(),
            drift: 0.05,
            volatility: 0.2,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FailuresConfig {
    pub enabled: bool,
    pub latency: LatencyConfig,
    /// Deterministic seed shared by the probabilistic strategies
    pub seed: Option<u64>,
    pub modes: ModesConfig,
}

impl Default for FailuresConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            latency: LatencyConfig::default(),
            seed: None,
            modes: ModesConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LatencyConfig {
    pub enabled: bool,
    /// "stable" (EV ~46 ms) or "typical" (EV ~155 ms)
    pub mode: String,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: "stable".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModesConfig {
    pub drop_messages: DropMode,
    pub delay_messages: DelayMode,
    pub duplicate: DuplicateMode,
    pub reorder: ReorderMode,
    pub corrupt: CorruptMode,
    pub throttle: ThrottleMode,
    pub rate_limit: RateLimitMode,
    pub silent_connection: SilentConnectionMode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DropMode {
    pub enabled: bool,
    pub probability: f64,
}

impl Default for DropMode {
    fn default() -> Self {
        Self {
            enabled: false,
            probability: 0.05,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DelayMode {
    pub enabled: bool,
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for DelayMode {
    fn default() -> Self {
        Self {
            enabled: false,
            min_ms: 100,
            max_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DuplicateMode {
    pub enabled: bool,
    pub probability: f64,
    pub max_duplicates: u32,
}

impl Default for DuplicateMode {
    fn default() -> Self {
        Self {
            enabled: false,
            probability: 0.05,
            max_duplicates: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReorderMode {
    pub enabled: bool,
    pub window_size: usize,
    pub max_hold_ms: u64,
}

impl Default for ReorderMode {
    fn default() -> Self {
        Self {
            enabled: false,
            window_size: 5,
            max_hold_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorruptMode {
    pub enabled: bool,
    pub probability: f64,
    pub corruption_level: f64,
}

impl Default for CorruptMode {
    fn default() -> Self {
        Self {
            enabled: false,
            probability: 0.01,
            corruption_level: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThrottleMode {
    pub enabled: bool,
    pub max_messages_per_second: u32,
}

impl Default for ThrottleMode {
    fn default() -> Self {
        Self {
            enabled: false,
            max_messages_per_second: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitMode {
    pub enabled: bool,
    pub baseline_rps: u32,
    pub wait_secs: u64,
    pub ban_secs: u64,
    pub violation_window_secs: u64,
}

impl Default for RateLimitMode {
    fn default() -> Self {
        Self {
            enabled: false,
            baseline_rps: 10,
            wait_secs: 10,
            ban_secs: 60,
            violation_window_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SilentConnectionMode {
    pub enabled: bool,
    pub after_messages: u64,
    pub reset_on_reconnect: bool,
}

impl Default for SilentConnectionMode {
    fn default() -> Self {
        Self {
            enabled: false,
            after_messages: 100,
            reset_on_reconnect: false,
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn initial_prices(&self) -> anyhow::Result<HashMap<String, Decimal>> {
        self.exchange
            .initial_prices
            .iter()
            .map(|(symbol, price)| {
                let value = Decimal::from_str(price)
                    .with_context(|| format!("initial price for {symbol}"))?;
                Ok((symbol.clone(), value))
            })
            .collect()
    }

    pub fn default_balances(&self) -> anyhow::Result<HashMap<String, Decimal>> {
        self.exchange
            .default_balance
            .iter()
            .map(|(asset, amount)| {
                let value = Decimal::from_str(amount)
                    .with_context(|| format!("default balance for {asset}"))?;
                Ok((asset.clone(), value))
            })
            .collect()
    }
}
