//! Configuration loading and types

pub mod loader;
pub mod types;

pub use loader::{has_prefixed_env, load_config, load_from_env};
pub use types::{
    AppConfig, AppSettings, BalancePolicy, EngineConfig, GuardConfig, ModelConfig, PairConfig,
    RpcConfig,
};
