//! Configuration types

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Reserve policy for the balance analyzer
    #[serde(default)]
    pub balance: BalancePolicy,
    /// Decision engine sizing and fallback settings
    #[serde(default)]
    pub engine: EngineConfig,
    /// Efficiency guard limits
    #[serde(default)]
    pub guard: GuardConfig,
    /// Token allow-list and fallback pairs
    #[serde(default)]
    pub pairs: PairConfig,
    /// Model-backed decision source (optional)
    #[serde(default)]
    pub model: Option<ModelConfig>,
    /// Solana RPC used for balance lookups
    #[serde(default)]
    pub rpc: RpcConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

/// Balance reserve policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancePolicy {
    /// Balance always withheld for transaction fees
    #[serde(default = "default_min_gas_reserve")]
    pub min_gas_reserve: Decimal,
    /// Extra buffer on top of the gas reserve
    #[serde(default = "default_safety_margin")]
    pub safety_margin: Decimal,
    /// Share of available balance recommended per trade
    #[serde(default = "default_recommended_fraction")]
    pub recommended_fraction: Decimal,
    /// Share of available balance that may be used at most
    #[serde(default = "default_max_safe_fraction")]
    pub max_safe_fraction: Decimal,
    /// Available balance must exceed this for trading to be allowed
    #[serde(default = "default_min_viable_trade")]
    pub min_viable_trade: Decimal,
}

impl BalancePolicy {
    /// Total amount withheld from trading
    pub fn reserved_for_gas(&self) -> Decimal {
        self.min_gas_reserve + self.safety_margin
    }
}

impl Default for BalancePolicy {
    fn default() -> Self {
        Self {
            min_gas_reserve: default_min_gas_reserve(),
            safety_margin: default_safety_margin(),
            recommended_fraction: default_recommended_fraction(),
            max_safe_fraction: default_max_safe_fraction(),
            min_viable_trade: default_min_viable_trade(),
        }
    }
}

fn default_min_gas_reserve() -> Decimal {
    dec!(0.005)
}

fn default_safety_margin() -> Decimal {
    dec!(0.002)
}

fn default_recommended_fraction() -> Decimal {
    dec!(0.6)
}

fn default_max_safe_fraction() -> Decimal {
    dec!(0.8)
}

fn default_min_viable_trade() -> Decimal {
    dec!(0.001)
}

/// Decision engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Balance withheld before sizing a position
    #[serde(default = "default_engine_gas_reserve")]
    pub gas_reserve: Decimal,
    /// Smallest position the engine will size
    #[serde(default = "default_minimum_trade_size")]
    pub minimum_trade_size: Decimal,
    /// HOLD streak length after which a minimal BUY is forced
    #[serde(default = "default_max_consecutive_holds")]
    pub max_consecutive_holds: u32,
    /// Token bought by the conservative fallback and forced trades
    #[serde(default = "default_fallback_token")]
    pub fallback_token: String,
    /// Confidence reported by the conservative fallback
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f64,
    /// Share of available balance used by the conservative fallback
    #[serde(default = "default_fallback_fraction")]
    pub fallback_fraction: Decimal,
    /// Confidence reported by a forced anti-stagnation trade
    #[serde(default = "default_forced_trade_confidence")]
    pub forced_trade_confidence: f64,
    /// Upper bound on a single decision source call
    #[serde(default = "default_source_timeout_ms")]
    pub source_timeout_ms: u64,
}

impl EngineConfig {
    pub fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gas_reserve: default_engine_gas_reserve(),
            minimum_trade_size: default_minimum_trade_size(),
            max_consecutive_holds: default_max_consecutive_holds(),
            fallback_token: default_fallback_token(),
            fallback_confidence: default_fallback_confidence(),
            fallback_fraction: default_fallback_fraction(),
            forced_trade_confidence: default_forced_trade_confidence(),
            source_timeout_ms: default_source_timeout_ms(),
        }
    }
}

fn default_engine_gas_reserve() -> Decimal {
    dec!(0.05)
}

fn default_minimum_trade_size() -> Decimal {
    dec!(0.001)
}

fn default_max_consecutive_holds() -> u32 {
    10
}

fn default_fallback_token() -> String {
    "USDC".to_string()
}

fn default_fallback_confidence() -> f64 {
    0.4
}

fn default_fallback_fraction() -> Decimal {
    dec!(0.05)
}

fn default_forced_trade_confidence() -> f64 {
    0.3
}

fn default_source_timeout_ms() -> u64 {
    5000
}

/// Efficiency guard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Hard ceiling on reported confidence
    #[serde(default = "default_max_confidence")]
    pub max_confidence: f64,
    /// Non-HOLD decisions below this amount are downgraded
    #[serde(default = "default_minimum_trade_size")]
    pub minimum_trade_size: Decimal,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_confidence: default_max_confidence(),
            minimum_trade_size: default_minimum_trade_size(),
        }
    }
}

fn default_max_confidence() -> f64 {
    0.95
}

/// Token pair validation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairConfig {
    /// Asset every pair is quoted against
    #[serde(default = "default_base_token")]
    pub base_token: String,
    /// Symbols the validator accepts as-is
    #[serde(default = "default_known_tokens")]
    pub known_tokens: Vec<String>,
    /// Counter tokens substituted for unknown symbols
    #[serde(default = "default_fallback_targets")]
    pub fallback_targets: Vec<String>,
    /// Counter token used when a pair collapses onto the base asset
    #[serde(default = "default_fallback_token")]
    pub degenerate_fallback: String,
}

impl Default for PairConfig {
    fn default() -> Self {
        Self {
            base_token: default_base_token(),
            known_tokens: default_known_tokens(),
            fallback_targets: default_fallback_targets(),
            degenerate_fallback: default_fallback_token(),
        }
    }
}

fn default_base_token() -> String {
    "SOL".to_string()
}

fn default_known_tokens() -> Vec<String> {
    ["SOL", "USDC", "USDT", "BONK", "JUP", "RAY", "ORCA", "WIF"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_fallback_targets() -> Vec<String> {
    ["USDC", "USDT", "JUP"].iter().map(|s| s.to_string()).collect()
}

/// Model-backed decision source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_model_endpoint")]
    pub endpoint: String,
    /// Bearer token for the endpoint
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model identifier sent with each request
    #[serde(default = "default_model_name")]
    pub model: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_model_endpoint(),
            api_key: None,
            model: default_model_name(),
            timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_model_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_model_name() -> String {
    "meta-llama/llama-3.1-8b-instruct".to_string()
}

/// Solana RPC configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// JSON-RPC endpoint
    #[serde(default = "default_rpc_url")]
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_rpc_url() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Seconds between decision cycles in loop mode (0 = run once)
    #[serde(default)]
    pub interval_seconds: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            interval_seconds: 0,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
