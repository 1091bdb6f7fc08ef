use rust_decimal::Decimal;
use tracing::warn;

use crate::common::types::{strategy, Action, MarketContext, TradeDecision};
use crate::config::types::GuardConfig;

/// Final post-processing of a decision's numbers
///
/// Pure and idempotent. Every returned decision satisfies
/// `0 <= confidence <= max_confidence`, and either `action == HOLD` with a
/// zero amount or `amount >= minimum_trade_size`.
#[derive(Debug, Clone, Default)]
pub struct EfficiencyGuard {
    config: GuardConfig,
}

impl EfficiencyGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    pub fn validate(&self, decision: TradeDecision, context: &MarketContext) -> TradeDecision {
        let mut decision = decision;

        decision.confidence = self.clamp_confidence(decision.confidence);

        if decision.is_hold() {
            decision.amount = Decimal::ZERO;
            return decision;
        }

        // Never size beyond what the wallet holds
        let balance = context.balance.max(Decimal::ZERO);
        if decision.amount > balance {
            warn!(amount = %decision.amount, %balance, "Amount exceeds balance, capping");
            decision.amount = balance;
        }

        if decision.amount <= Decimal::ZERO {
            warn!(action = %decision.action, "Non-positive amount, downgrading to HOLD");
            return self.downgrade(
                decision,
                "Invalid trade amount: non-HOLD decision with zero or negative size".to_string(),
            );
        }

        if decision.amount < self.config.minimum_trade_size {
            warn!(
                amount = %decision.amount,
                minimum = %self.config.minimum_trade_size,
                "Amount below minimum trade size, downgrading to HOLD"
            );
            let reasoning = format!(
                "Trade size {} below minimum {}, holding instead of {}",
                decision.amount, self.config.minimum_trade_size, decision.action
            );
            return self.downgrade(decision, reasoning);
        }

        decision
    }

    fn clamp_confidence(&self, confidence: f64) -> f64 {
        if confidence.is_nan() {
            return 0.0;
        }
        confidence.clamp(0.0, self.config.max_confidence)
    }

    fn downgrade(&self, decision: TradeDecision, reasoning: String) -> TradeDecision {
        TradeDecision {
            action: Action::Hold,
            amount: Decimal::ZERO,
            strategy: strategy::EFFICIENCY_GUARD.to_string(),
            reasoning,
            ..decision
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn decision(action: Action, confidence: f64, amount: Decimal) -> TradeDecision {
        TradeDecision {
            action,
            token: "JUP".to_string(),
            confidence,
            amount,
            strategy: strategy::DECISION_SOURCE.to_string(),
            reasoning: "test".to_string(),
        }
    }

    fn ctx() -> MarketContext {
        MarketContext::new(dec!(1.0), 0.5, 0.1, 0.0)
    }

    #[test]
    fn test_caps_confidence() {
        let out = EfficiencyGuard::default().validate(decision(Action::Buy, 1.30, dec!(0.1)), &ctx());
        assert_eq!(out.confidence, 0.95);
        assert_eq!(out.action, Action::Buy);
        assert_eq!(out.amount, dec!(0.1));
    }

    #[test]
    fn test_negative_and_nan_confidence() {
        let guard = EfficiencyGuard::default();
        assert_eq!(guard.validate(decision(Action::Buy, -0.2, dec!(0.1)), &ctx()).confidence, 0.0);
        assert_eq!(guard.validate(decision(Action::Buy, f64::NAN, dec!(0.1)), &ctx()).confidence, 0.0);
    }

    #[test]
    fn test_below_minimum_downgrades() {
        let out = EfficiencyGuard::default().validate(decision(Action::Sell, 0.6, dec!(0.0005)), &ctx());
        assert_eq!(out.action, Action::Hold);
        assert_eq!(out.amount, Decimal::ZERO);
        assert_eq!(out.strategy, strategy::EFFICIENCY_GUARD);
        assert!(out.reasoning.contains("below minimum"));
    }

    #[test]
    fn test_zero_and_negative_amounts_downgrade() {
        let guard = EfficiencyGuard::default();
        for amount in [Decimal::ZERO, dec!(-0.5)] {
            let out = guard.validate(decision(Action::Buy, 0.6, amount), &ctx());
            assert_eq!(out.action, Action::Hold);
            assert_eq!(out.amount, Decimal::ZERO);
            assert!(out.reasoning.contains("Invalid trade amount"));
        }
    }

    #[test]
    fn test_hold_amount_is_zeroed() {
        let out = EfficiencyGuard::default().validate(decision(Action::Hold, 0.5, dec!(0.3)), &ctx());
        assert_eq!(out.action, Action::Hold);
        assert_eq!(out.amount, Decimal::ZERO);
        assert_eq!(out.strategy, strategy::DECISION_SOURCE);
    }

    #[test]
    fn test_amount_capped_at_balance() {
        let out = EfficiencyGuard::default().validate(decision(Action::Buy, 0.6, dec!(5)), &ctx());
        assert_eq!(out.amount, dec!(1.0));
    }

    #[test]
    fn test_minimum_is_inclusive() {
        let out = EfficiencyGuard::default().validate(decision(Action::Buy, 0.6, dec!(0.001)), &ctx());
        assert_eq!(out.action, Action::Buy);
    }

    #[test]
    fn test_idempotent() {
        let guard = EfficiencyGuard::default();
        let inputs = [
            decision(Action::Buy, 1.3, dec!(0.1)),
            decision(Action::Sell, 0.5, dec!(0.0001)),
            decision(Action::Hold, 0.7, dec!(2)),
            decision(Action::Buy, 0.4, dec!(3)),
        ];
        for input in inputs {
            let once = guard.validate(input, &ctx());
            let twice = guard.validate(once.clone(), &ctx());
            assert_eq!(once, twice);
        }
    }
}
