//! Rule-based decision source driven by trend and volatility

use async_trait::async_trait;

use crate::common::errors::{Result, TraderError};
use crate::common::traits::DecisionSource;
use crate::common::types::{Action, MarketContext, Proposal};
use crate::trading::{MAX_SIZING_CONFIDENCE, MIN_SIZING_CONFIDENCE};

/// Trend above this proposes BUY
const BUY_TREND: f64 = 0.55;
/// Trend below this proposes SELL
const SELL_TREND: f64 = 0.45;

/// Deterministic proposer with no I/O
#[derive(Debug, Clone)]
pub struct TrendHeuristicSource {
    token: String,
}

impl TrendHeuristicSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Confidence in `[0.3, 0.95]` from trend strength, volatility and
    /// recent losses
    pub fn confidence(trend: f64, volatility: f64, recent_performance: f64) -> f64 {
        let strength = (trend - 0.5).abs() * 1.3;
        let volatility_penalty = volatility.clamp(0.0, 1.0) * 0.25;
        let drawdown_penalty = if recent_performance < 0.0 {
            recent_performance.abs().min(0.2)
        } else {
            0.0
        };

        (MIN_SIZING_CONFIDENCE + strength - volatility_penalty - drawdown_penalty)
            .clamp(MIN_SIZING_CONFIDENCE, MAX_SIZING_CONFIDENCE)
    }
}

impl Default for TrendHeuristicSource {
    fn default() -> Self {
        Self::new("USDC")
    }
}

#[async_trait]
impl DecisionSource for TrendHeuristicSource {
    async fn propose(&self, context: &MarketContext) -> Result<Proposal> {
        let MarketContext {
            trend,
            volatility,
            recent_performance,
            ..
        } = *context;

        if !(trend.is_finite() && volatility.is_finite() && recent_performance.is_finite()) {
            return Err(TraderError::InvalidResponse(
                "non-finite market context".to_string(),
            ));
        }

        let action = if trend > BUY_TREND {
            Action::Buy
        } else if trend < SELL_TREND {
            Action::Sell
        } else {
            Action::Hold
        };
        let confidence = Self::confidence(trend, volatility, recent_performance);

        Ok(Proposal::new(
            action,
            self.token.clone(),
            confidence,
            format!(
                "trend {:.2}, volatility {:.2}, recent performance {:+.2}",
                trend, volatility, recent_performance
            ),
        ))
    }

    fn name(&self) -> &'static str {
        "trend_heuristic"
    }
}
