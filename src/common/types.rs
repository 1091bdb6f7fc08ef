//! Shared value types flowing through the decision pipeline

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a swap against the base asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

/// Action carried by a trade decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    /// Swap side for this action, `None` for HOLD
    pub fn side(&self) -> Option<Side> {
        match self {
            Action::Buy => Some(Side::Buy),
            Action::Sell => Some(Side::Sell),
            Action::Hold => None,
        }
    }

    pub fn is_hold(&self) -> bool {
        matches!(self, Action::Hold)
    }
}

impl From<Side> for Action {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => Action::Buy,
            Side::Sell => Action::Sell,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        };
        f.write_str(s)
    }
}

/// Market snapshot supplied by the caller for a single decision cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketContext {
    /// Wallet balance in the base asset
    pub balance: Decimal,
    /// Trend strength, 0.0 (bearish) to 1.0 (bullish)
    pub trend: f64,
    /// Volatility, non-negative
    pub volatility: f64,
    /// Recent realised performance, signed
    pub recent_performance: f64,
}

impl MarketContext {
    pub fn new(balance: Decimal, trend: f64, volatility: f64, recent_performance: f64) -> Self {
        Self {
            balance,
            trend,
            volatility,
            recent_performance,
        }
    }

    /// Copy with degenerate numbers replaced by neutral values
    ///
    /// Negative balance becomes zero, non-finite trend becomes 0.5, negative
    /// or non-finite volatility becomes zero, non-finite performance becomes zero.
    pub fn sanitized(&self) -> Self {
        let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        Self {
            balance: self.balance.max(Decimal::ZERO),
            trend: finite_or(self.trend, 0.5).clamp(0.0, 1.0),
            volatility: finite_or(self.volatility, 0.0).max(0.0),
            recent_performance: finite_or(self.recent_performance, 0.0),
        }
    }
}

/// Result of analysing a wallet balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    pub total_balance: Decimal,
    pub available_for_trading: Decimal,
    pub reserved_for_gas: Decimal,
    pub recommended_trade_size: Decimal,
    pub max_safe_trade_size: Decimal,
    pub can_trade: bool,
    /// Observability only, never branched on
    pub reasoning: String,
}

/// Token pair after validation
///
/// `from_token != to_token` holds for every value produced by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedPair {
    pub from_token: String,
    pub to_token: String,
    /// False when the requested pair had to be replaced
    pub is_valid: bool,
    pub reason: Option<String>,
}

impl ValidatedPair {
    /// The leg that is not the base asset
    pub fn counter_token(&self, side: Side) -> &str {
        match side {
            Side::Buy => &self.to_token,
            Side::Sell => &self.from_token,
        }
    }
}

/// Raw proposal from a decision source, before sizing and clamping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub action: Action,
    pub token: String,
    pub confidence: f64,
    pub reasoning: String,
}

impl Proposal {
    pub fn new(
        action: Action,
        token: impl Into<String>,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            action,
            token: token.into(),
            confidence,
            reasoning: reasoning.into(),
        }
    }
}

/// Final trade instruction handed to the execution layer
///
/// Built fresh every cycle and treated as immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDecision {
    pub action: Action,
    pub token: String,
    pub confidence: f64,
    pub amount: Decimal,
    /// Which path produced the decision, see [`strategy`]
    pub strategy: String,
    pub reasoning: String,
}

impl TradeDecision {
    /// A no-op decision with zero amount and zero confidence
    pub fn hold(
        token: impl Into<String>,
        strategy: impl Into<String>,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            action: Action::Hold,
            token: token.into(),
            confidence: 0.0,
            amount: Decimal::ZERO,
            strategy: strategy.into(),
            reasoning: reasoning.into(),
        }
    }

    pub fn is_hold(&self) -> bool {
        self.action.is_hold()
    }
}

/// Labels written into [`TradeDecision::strategy`]
pub mod strategy {
    pub const INSUFFICIENT_BALANCE: &str = "insufficient_balance";
    pub const DECISION_SOURCE: &str = "decision_source";
    pub const CONSERVATIVE_FALLBACK: &str = "conservative_fallback";
    pub const ANTI_STAGNATION: &str = "anti_stagnation";
    pub const EFFICIENCY_GUARD: &str = "efficiency_guard";
}
