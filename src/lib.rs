//! Balance-aware trading library
//!
//! Converts a wallet balance and a few market scalars into a bounded,
//! validated trade instruction.

pub mod common;
pub mod config;
pub mod sources;
pub mod trading;

// Re-export commonly used types
pub use common::errors::{Result, TraderError};
pub use common::traits::{BalanceProvider, BoxedDecisionSource, DecisionSource};
pub use common::types::{
    Action, BalanceSnapshot, MarketContext, Proposal, Side, TradeDecision, ValidatedPair,
};
pub use config::types::AppConfig;
pub use sources::{HttpModelSource, SolanaRpcBalance, TrendHeuristicSource};
pub use trading::{
    BalanceAnalyzer, CycleReport, DecisionEngine, EfficiencyGuard, PipelineStats,
    TradingPairValidator, TradingPipeline,
};
