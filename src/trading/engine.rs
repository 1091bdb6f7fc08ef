use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::common::errors::{Result, TraderError};
use crate::common::traits::BoxedDecisionSource;
use crate::common::types::{strategy, Action, MarketContext, Proposal, TradeDecision};
use crate::config::types::EngineConfig;

/// Confidence band used for position sizing
pub const MIN_SIZING_CONFIDENCE: f64 = 0.3;
pub const MAX_SIZING_CONFIDENCE: f64 = 0.95;

/// Lamport precision
const AMOUNT_DP: u32 = 9;

/// Turns a market snapshot into a sized trade decision
///
/// The only state carried between calls is the HOLD streak counter (plus a
/// failure counter for logging). Both are atomics, so a single engine can be
/// shared between concurrent callers.
pub struct DecisionEngine {
    config: EngineConfig,
    source: Option<BoxedDecisionSource>,
    consecutive_holds: AtomicU32,
    source_failures: AtomicU64,
}

impl DecisionEngine {
    /// Engine with a decision source
    pub fn new(config: EngineConfig, source: BoxedDecisionSource) -> Self {
        Self {
            config,
            source: Some(source),
            consecutive_holds: AtomicU32::new(0),
            source_failures: AtomicU64::new(0),
        }
    }

    /// Engine without a decision source; every sized decision is the
    /// conservative fallback
    pub fn without_source(config: EngineConfig) -> Self {
        Self {
            config,
            source: None,
            consecutive_holds: AtomicU32::new(0),
            source_failures: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current HOLD streak
    pub fn consecutive_holds(&self) -> u32 {
        self.consecutive_holds.load(Ordering::SeqCst)
    }

    /// Total decision source failures since construction
    pub fn source_failures(&self) -> u64 {
        self.source_failures.load(Ordering::SeqCst)
    }

    /// Balance left for sizing after the engine's gas reserve
    pub fn available_balance(&self, balance: Decimal) -> Decimal {
        balance.max(Decimal::ZERO) - self.config.gas_reserve
    }

    /// Produce a decision for the given context
    ///
    /// Never fails: source errors, timeouts and malformed proposals all end
    /// in the conservative fallback.
    pub async fn decide(&self, context: &MarketContext) -> TradeDecision {
        let context = context.sanitized();
        let available = self.available_balance(context.balance);

        if available <= Decimal::ZERO || available < self.config.minimum_trade_size {
            debug!(balance = %context.balance, %available, "Insufficient balance for any trade");
            return TradeDecision::hold(
                self.config.fallback_token.clone(),
                strategy::INSUFFICIENT_BALANCE,
                format!(
                    "insufficient balance: {} available after {} gas reserve",
                    available.max(Decimal::ZERO),
                    self.config.gas_reserve
                ),
            );
        }

        let proposal = match self.propose(&context).await {
            Ok(proposal) => proposal,
            Err(e) => {
                let failures = self.source_failures.fetch_add(1, Ordering::SeqCst) + 1;
                warn!(error = %e, failures, "Decision source failed, using conservative fallback");
                self.reset_holds();
                return self.conservative_fallback(available, &e);
            }
        };

        if proposal.action.is_hold() {
            return self.on_hold(proposal, available);
        }

        self.reset_holds();
        self.size(proposal, available)
    }

    async fn propose(&self, context: &MarketContext) -> Result<Proposal> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| TraderError::SourceUnavailable("no decision source configured".to_string()))?;

        let proposal = timeout(self.config.source_timeout(), source.propose(context)).await??;

        if !proposal.confidence.is_finite() {
            return Err(TraderError::InvalidResponse(format!(
                "{} proposed non-finite confidence",
                source.name()
            )));
        }
        Ok(proposal)
    }

    /// Size a BUY/SELL proposal from its confidence
    fn size(&self, proposal: Proposal, available: Decimal) -> TradeDecision {
        let confidence = proposal
            .confidence
            .clamp(MIN_SIZING_CONFIDENCE, MAX_SIZING_CONFIDENCE);
        let base_percentage = dec!(0.05)
            + (Decimal::from_f64(confidence).unwrap_or(dec!(0.3)) - dec!(0.3)) * dec!(0.15);
        let amount = self.at_least_minimum((available * base_percentage).round_dp(AMOUNT_DP));

        debug!(
            action = %proposal.action,
            confidence,
            %base_percentage,
            %amount,
            "Sized proposal"
        );

        TradeDecision {
            action: proposal.action,
            token: proposal.token,
            confidence,
            amount,
            strategy: strategy::DECISION_SOURCE.to_string(),
            reasoning: proposal.reasoning,
        }
    }

    /// Record a HOLD and break the streak once it grows too long
    fn on_hold(&self, proposal: Proposal, available: Decimal) -> TradeDecision {
        let max_holds = self.config.max_consecutive_holds;
        let can_force = available >= self.config.minimum_trade_size;

        let previous = self
            .consecutive_holds
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                let next = n.saturating_add(1);
                Some(if next > max_holds && can_force { 0 } else { next })
            })
            .unwrap_or_else(|n| n);
        let streak = previous.saturating_add(1);

        if streak > max_holds && can_force {
            info!(streak, "HOLD streak exceeded, forcing minimal BUY");
            return TradeDecision {
                action: Action::Buy,
                token: self.config.fallback_token.clone(),
                confidence: self.config.forced_trade_confidence,
                amount: self.config.minimum_trade_size,
                strategy: strategy::ANTI_STAGNATION.to_string(),
                reasoning: format!(
                    "{} consecutive HOLDs, forcing minimal trade to break stagnation",
                    streak
                ),
            };
        }

        debug!(streak, "HOLD proposed");
        TradeDecision {
            action: Action::Hold,
            token: proposal.token,
            confidence: proposal
                .confidence
                .clamp(0.0, MAX_SIZING_CONFIDENCE),
            amount: Decimal::ZERO,
            strategy: strategy::DECISION_SOURCE.to_string(),
            reasoning: proposal.reasoning,
        }
    }

    fn conservative_fallback(&self, available: Decimal, cause: &TraderError) -> TradeDecision {
        TradeDecision {
            action: Action::Buy,
            token: self.config.fallback_token.clone(),
            confidence: self.config.fallback_confidence,
            amount: self.at_least_minimum(
                (available * self.config.fallback_fraction).round_dp(AMOUNT_DP),
            ),
            strategy: strategy::CONSERVATIVE_FALLBACK.to_string(),
            reasoning: format!("conservative fallback: {}", cause),
        }
    }

    /// Callers have already checked `available >= minimum_trade_size`, so a
    /// sized BUY/SELL never falls below what the guard accepts
    fn at_least_minimum(&self, amount: Decimal) -> Decimal {
        amount.max(self.config.minimum_trade_size)
    }

    fn reset_holds(&self) {
        self.consecutive_holds.store(0, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::traits::DecisionSource;
    use async_trait::async_trait;

    struct Fixed(Proposal);

    #[async_trait]
    impl DecisionSource for Fixed {
        async fn propose(&self, _context: &MarketContext) -> Result<Proposal> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct Failing;

    #[async_trait]
    impl DecisionSource for Failing {
        async fn propose(&self, _context: &MarketContext) -> Result<Proposal> {
            Err(TraderError::ModelReply("garbage".to_string()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct Slow;

    #[async_trait]
    impl DecisionSource for Slow {
        async fn propose(&self, _context: &MarketContext) -> Result<Proposal> {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok(Proposal::new(Action::Sell, "JUP", 0.9, "too late"))
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    fn engine_with(proposal: Proposal) -> DecisionEngine {
        DecisionEngine::new(EngineConfig::default(), Box::new(Fixed(proposal)))
    }

    fn ctx(balance: Decimal) -> MarketContext {
        MarketContext::new(balance, 0.6, 0.3, 0.0)
    }

    #[tokio::test]
    async fn test_insufficient_balance_holds() {
        let engine = engine_with(Proposal::new(Action::Buy, "JUP", 0.9, "go"));
        let decision = engine.decide(&ctx(dec!(0.04))).await;
        assert_eq!(decision.action, Action::Hold);
        assert_eq!(decision.amount, Decimal::ZERO);
        assert_eq!(decision.confidence, 0.0);
        assert_eq!(decision.strategy, strategy::INSUFFICIENT_BALANCE);
        assert!(decision.reasoning.contains("insufficient balance"));
    }

    #[tokio::test]
    async fn test_sizing_band() {
        // available = 1.05 - 0.05 = 1.0
        let low = engine_with(Proposal::new(Action::Buy, "JUP", 0.3, "weak"))
            .decide(&ctx(dec!(1.05)))
            .await;
        assert_eq!(low.amount, dec!(0.05));

        let high = engine_with(Proposal::new(Action::Sell, "JUP", 0.95, "strong"))
            .decide(&ctx(dec!(1.05)))
            .await;
        assert_eq!(high.action, Action::Sell);
        assert_eq!(high.amount, dec!(0.1475));
        assert_eq!(high.strategy, strategy::DECISION_SOURCE);
    }

    #[tokio::test]
    async fn test_confidence_is_clamped_for_sizing() {
        let decision = engine_with(Proposal::new(Action::Buy, "JUP", 1.3, "overconfident"))
            .decide(&ctx(dec!(1.05)))
            .await;
        assert_eq!(decision.confidence, MAX_SIZING_CONFIDENCE);
        assert_eq!(decision.amount, dec!(0.1475));

        let decision = engine_with(Proposal::new(Action::Buy, "JUP", 0.01, "timid"))
            .decide(&ctx(dec!(1.05)))
            .await;
        assert_eq!(decision.confidence, MIN_SIZING_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_failing_source_falls_back() {
        let engine = DecisionEngine::new(EngineConfig::default(), Box::new(Failing));
        let decision = engine.decide(&ctx(dec!(1.05))).await;
        assert_eq!(decision.action, Action::Buy);
        assert_eq!(decision.token, "USDC");
        assert_eq!(decision.confidence, 0.4);
        assert_eq!(decision.amount, dec!(0.05));
        assert_eq!(decision.strategy, strategy::CONSERVATIVE_FALLBACK);
        assert_eq!(engine.source_failures(), 1);
    }

    #[tokio::test]
    async fn test_small_sizes_are_raised_to_minimum() {
        // available = 0.06 - 0.05 = 0.01, so 5% would be 0.0005
        let weak = engine_with(Proposal::new(Action::Buy, "JUP", 0.3, "weak"))
            .decide(&ctx(dec!(0.06)))
            .await;
        assert_eq!(weak.action, Action::Buy);
        assert_eq!(weak.amount, dec!(0.001));

        let fallback = DecisionEngine::new(EngineConfig::default(), Box::new(Failing))
            .decide(&ctx(dec!(0.06)))
            .await;
        assert_eq!(fallback.strategy, strategy::CONSERVATIVE_FALLBACK);
        assert_eq!(fallback.amount, dec!(0.001));
    }

    #[tokio::test]
    async fn test_missing_source_falls_back() {
        let engine = DecisionEngine::without_source(EngineConfig::default());
        let decision = engine.decide(&ctx(dec!(2.05))).await;
        assert_eq!(decision.strategy, strategy::CONSERVATIVE_FALLBACK);
        assert_eq!(decision.amount, dec!(0.1));
    }

    #[tokio::test]
    async fn test_non_finite_confidence_falls_back() {
        let decision = engine_with(Proposal::new(Action::Buy, "JUP", f64::NAN, "?"))
            .decide(&ctx(dec!(1.05)))
            .await;
        assert_eq!(decision.strategy, strategy::CONSERVATIVE_FALLBACK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_times_out() {
        let engine = DecisionEngine::new(EngineConfig::default(), Box::new(Slow));
        let decision = engine.decide(&ctx(dec!(1.05))).await;
        assert_eq!(decision.strategy, strategy::CONSERVATIVE_FALLBACK);
        assert!(decision.reasoning.contains("timed out"));
    }

    #[tokio::test]
    async fn test_hold_streak_forces_buy_on_eleventh() {
        let engine = engine_with(Proposal::new(Action::Hold, "USDC", 0.5, "wait"));
        for i in 1..=10 {
            let decision = engine.decide(&ctx(dec!(1.05))).await;
            assert_eq!(decision.action, Action::Hold, "call {}", i);
            assert_eq!(decision.amount, Decimal::ZERO);
            assert_eq!(engine.consecutive_holds(), i);
        }

        let forced = engine.decide(&ctx(dec!(1.05))).await;
        assert_eq!(forced.action, Action::Buy);
        assert_eq!(forced.amount, dec!(0.001));
        assert_eq!(forced.confidence, 0.3);
        assert_eq!(forced.strategy, strategy::ANTI_STAGNATION);
        assert_eq!(engine.consecutive_holds(), 0);
    }

    #[tokio::test]
    async fn test_insufficient_balance_leaves_streak_untouched() {
        let engine = engine_with(Proposal::new(Action::Hold, "USDC", 0.5, "wait"));
        engine.decide(&ctx(dec!(1.05))).await;
        engine.decide(&ctx(dec!(1.05))).await;
        engine.decide(&ctx(dec!(0.01))).await;
        assert_eq!(engine.consecutive_holds(), 2);
    }

    #[tokio::test]
    async fn test_fallback_resets_streak() {
        let engine = engine_with(Proposal::new(Action::Hold, "USDC", 0.5, "wait"));
        engine.decide(&ctx(dec!(1.05))).await;
        assert_eq!(engine.consecutive_holds(), 1);

        let engine = DecisionEngine::new(EngineConfig::default(), Box::new(Failing));
        engine.consecutive_holds.store(5, Ordering::SeqCst);
        engine.decide(&ctx(dec!(1.05))).await;
        assert_eq!(engine.consecutive_holds(), 0);
    }
}
