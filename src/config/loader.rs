//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::{AppConfig, ModelConfig};
use crate::common::errors::{Result, TraderError};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with TRADER__)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    // e.g. TRADER__ENGINE__GAS_RESERVE=0.1
    builder = builder.add_source(
        Environment::with_prefix("TRADER")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| TraderError::Configuration(e.to_string()))?;

    let mut app: AppConfig = config
        .try_deserialize()
        .map_err(|e| TraderError::Configuration(e.to_string()))?;

    validate(&app)?;

    // A model section without a key cannot be used
    if app
        .model
        .as_ref()
        .is_some_and(|m| m.api_key.as_deref().unwrap_or_default().is_empty())
    {
        app.model = None;
    }

    Ok(app)
}

/// Load configuration from environment variables only
///
/// Reads `.env` if present. Only the collaborator endpoints are taken from
/// the environment; every policy constant keeps its default.
pub fn load_from_env() -> Result<AppConfig> {
    dotenvy::dotenv().ok();
    Ok(apply_env_overrides(AppConfig::default()))
}

/// Whether any `TRADER__` variable is set
pub fn has_prefixed_env() -> bool {
    std::env::vars().any(|(key, _)| key.starts_with("TRADER__"))
}

fn apply_env_overrides(mut app: AppConfig) -> AppConfig {
    if let Ok(url) = std::env::var("SOLANA_RPC_URL") {
        app.rpc.url = url;
    }

    app.model = std::env::var("MODEL_API_KEY").ok().map(|key| {
        let defaults = ModelConfig::default();
        ModelConfig {
            endpoint: std::env::var("MODEL_ENDPOINT").unwrap_or(defaults.endpoint),
            api_key: Some(key),
            model: std::env::var("MODEL_NAME").unwrap_or(defaults.model),
            timeout_seconds: defaults.timeout_seconds,
        }
    });

    app
}

/// Reject policies that would break the pipeline's ordering invariants
fn validate(app: &AppConfig) -> Result<()> {
    let balance = &app.balance;
    if balance.min_gas_reserve.is_sign_negative() || balance.safety_margin.is_sign_negative() {
        return Err(TraderError::Configuration(
            "balance reserves must be non-negative".to_string(),
        ));
    }
    if balance.recommended_fraction > balance.max_safe_fraction
        || balance.max_safe_fraction > rust_decimal::Decimal::ONE
        || balance.recommended_fraction.is_sign_negative()
    {
        return Err(TraderError::Configuration(format!(
            "expected 0 <= recommended_fraction ({}) <= max_safe_fraction ({}) <= 1",
            balance.recommended_fraction, balance.max_safe_fraction
        )));
    }
    if app.guard.minimum_trade_size > app.engine.minimum_trade_size {
        return Err(TraderError::Configuration(format!(
            "guard.minimum_trade_size ({}) must not exceed engine.minimum_trade_size ({})",
            app.guard.minimum_trade_size, app.engine.minimum_trade_size
        )));
    }
    if !(0.0..=1.0).contains(&app.guard.max_confidence) {
        return Err(TraderError::Configuration(format!(
            "guard.max_confidence must be within [0, 1], got {}",
            app.guard.max_confidence
        )));
    }
    if app.pairs.degenerate_fallback.eq_ignore_ascii_case(&app.pairs.base_token) {
        return Err(TraderError::Configuration(format!(
            "pairs.degenerate_fallback must differ from base token {}",
            app.pairs.base_token
        )));
    }
    if app.pairs.fallback_targets.is_empty() {
        return Err(TraderError::Configuration(
            "pairs.fallback_targets must not be empty".to_string(),
        ));
    }
    Ok(())
}
