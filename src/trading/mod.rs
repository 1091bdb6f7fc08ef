//! Trading module: balance-aware sizing and decision validation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  MarketContext (balance, trend, volatility, performance)   │
//! └─────────────────────────────────────────────────────────────┘
//!        │
//!        ▼
//!  BalanceAnalyzer.analyze()      reserve gas, compute safe sizes
//!        │ can_trade == false ──────────────► HOLD (terminal)
//!        ▼
//!  DecisionEngine.decide()        DecisionSource → size by confidence
//!        │                         source error/timeout → fallback BUY
//!        │                         HOLD streak > N → forced minimal BUY
//!        ▼
//!  TradingPairValidator.validate() no self-pairs, allow-listed symbols
//!        │
//!        ▼
//!  cap at max_safe_trade_size
//!        │
//!        ▼
//!  EfficiencyGuard.validate()     confidence ceiling, minimum size
//!        │
//!        ▼
//!  TradeDecision → execution layer
//! ```
//!
//! # Components
//!
//! - [`BalanceAnalyzer`]: splits a balance into reserved and tradable capital
//! - [`TradingPairValidator`]: corrects degenerate or unknown token pairs
//! - [`DecisionEngine`]: turns a proposal into a sized decision
//! - [`EfficiencyGuard`]: clamps and validates the final numbers
//! - [`TradingPipeline`]: chains the stages and keeps cycle statistics
//!
//! No stage returns an error. Degenerate input always ends in a
//! well-formed HOLD.

mod balance;
mod engine;
mod guard;
mod pairs;
mod pipeline;

pub use balance::BalanceAnalyzer;
pub use engine::{DecisionEngine, MAX_SIZING_CONFIDENCE, MIN_SIZING_CONFIDENCE};
pub use guard::EfficiencyGuard;
pub use pairs::TradingPairValidator;
pub use pipeline::{CycleReport, PipelineStats, TradingPipeline};
