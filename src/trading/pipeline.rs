use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, instrument};

use super::balance::BalanceAnalyzer;
use super::engine::DecisionEngine;
use super::guard::EfficiencyGuard;
use super::pairs::TradingPairValidator;
use crate::common::errors::Result;
use crate::common::traits::{BalanceProvider, BoxedDecisionSource};
use crate::common::types::{
    strategy, Action, BalanceSnapshot, MarketContext, TradeDecision, ValidatedPair,
};
use crate::config::types::AppConfig;

/// Everything produced by one decision cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub decided_at: DateTime<Utc>,
    pub context: MarketContext,
    pub snapshot: BalanceSnapshot,
    /// `None` when the cycle ended in HOLD before pair validation
    pub pair: Option<ValidatedPair>,
    pub decision: TradeDecision,
}

/// Cumulative counters over the pipeline's lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub cycles: u64,
    pub holds: u64,
    pub buys: u64,
    pub sells: u64,
    pub fallbacks: u64,
    pub forced_trades: u64,
    pub guard_downgrades: u64,
}

#[derive(Debug, Default)]
struct StatCounters {
    cycles: AtomicU64,
    holds: AtomicU64,
    buys: AtomicU64,
    sells: AtomicU64,
    fallbacks: AtomicU64,
    forced_trades: AtomicU64,
    guard_downgrades: AtomicU64,
}

impl StatCounters {
    fn record(&self, decision: &TradeDecision) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        let by_action = match decision.action {
            Action::Buy => &self.buys,
            Action::Sell => &self.sells,
            Action::Hold => &self.holds,
        };
        by_action.fetch_add(1, Ordering::Relaxed);

        let by_strategy = match decision.strategy.as_str() {
            strategy::CONSERVATIVE_FALLBACK => Some(&self.fallbacks),
            strategy::ANTI_STAGNATION => Some(&self.forced_trades),
            strategy::EFFICIENCY_GUARD => Some(&self.guard_downgrades),
            _ => None,
        };
        if let Some(counter) = by_strategy {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            cycles: self.cycles.load(Ordering::Relaxed),
            holds: self.holds.load(Ordering::Relaxed),
            buys: self.buys.load(Ordering::Relaxed),
            sells: self.sells.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            forced_trades: self.forced_trades.load(Ordering::Relaxed),
            guard_downgrades: self.guard_downgrades.load(Ordering::Relaxed),
        }
    }
}

/// Balance → decide → validate pair → guard
pub struct TradingPipeline {
    analyzer: BalanceAnalyzer,
    validator: TradingPairValidator,
    engine: DecisionEngine,
    guard: EfficiencyGuard,
    stats: StatCounters,
}

impl TradingPipeline {
    pub fn new(
        analyzer: BalanceAnalyzer,
        validator: TradingPairValidator,
        engine: DecisionEngine,
        guard: EfficiencyGuard,
    ) -> Self {
        Self {
            analyzer,
            validator,
            engine,
            guard,
            stats: StatCounters::default(),
        }
    }

    /// Build every stage from application config
    ///
    /// `source = None` runs the engine on its conservative fallback alone.
    pub fn from_config(config: &AppConfig, source: Option<BoxedDecisionSource>) -> Self {
        let engine = match source {
            Some(source) => DecisionEngine::new(config.engine.clone(), source),
            None => DecisionEngine::without_source(config.engine.clone()),
        };
        Self::new(
            BalanceAnalyzer::new(config.balance.clone()),
            TradingPairValidator::new(config.pairs.clone()),
            engine,
            EfficiencyGuard::new(config.guard.clone()),
        )
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats.snapshot()
    }

    /// Run one cycle and return only the decision
    pub async fn decide(&self, context: &MarketContext) -> TradeDecision {
        self.run_cycle(context).await.decision
    }

    /// Fetch the wallet balance, then run one cycle
    ///
    /// Only the balance lookup can fail; the cycle itself cannot.
    #[instrument(skip(self, provider))]
    pub async fn decide_for_wallet(
        &self,
        provider: &dyn BalanceProvider,
        wallet: &str,
        trend: f64,
        volatility: f64,
        recent_performance: f64,
    ) -> Result<CycleReport> {
        let balance = provider.balance(wallet).await?;
        let context = MarketContext::new(balance, trend, volatility, recent_performance);
        Ok(self.run_cycle(&context).await)
    }

    /// Run one cycle and return every intermediate result
    pub async fn run_cycle(&self, context: &MarketContext) -> CycleReport {
        let context = context.sanitized();
        let snapshot = self.analyzer.analyze(context.balance);

        let (pair, decision) = if snapshot.can_trade {
            let proposed = self.engine.decide(&context).await;
            self.finish(proposed, &snapshot, &context)
        } else {
            let hold = TradeDecision::hold(
                self.engine.config().fallback_token.clone(),
                strategy::INSUFFICIENT_BALANCE,
                format!("insufficient balance: {}", snapshot.reasoning),
            );
            (None, self.guard.validate(hold, &context))
        };

        self.stats.record(&decision);
        info!(
            action = %decision.action,
            token = %decision.token,
            amount = %decision.amount,
            confidence = decision.confidence,
            strategy = %decision.strategy,
            "Decision cycle complete"
        );

        CycleReport {
            decided_at: Utc::now(),
            context,
            snapshot,
            pair,
            decision,
        }
    }

    /// Pair validation, size cap and guard for an engine proposal
    fn finish(
        &self,
        proposed: TradeDecision,
        snapshot: &BalanceSnapshot,
        context: &MarketContext,
    ) -> (Option<ValidatedPair>, TradeDecision) {
        let mut decision = proposed;

        let pair = decision.action.side().map(|side| {
            let pair = self.validator.validate(side, &decision.token);
            decision.token = pair.counter_token(side).to_string();
            if let Some(reason) = &pair.reason {
                decision.reasoning = format!("{} ({})", decision.reasoning, reason);
            }
            pair
        });

        if !decision.is_hold() {
            decision.amount = decision.amount.min(snapshot.max_safe_trade_size).max(Decimal::ZERO);
        }

        (pair, self.guard.validate(decision, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::TraderError;
    use crate::common::traits::DecisionSource;
    use crate::common::types::Proposal;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

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

    struct Broken;

    #[async_trait]
    impl DecisionSource for Broken {
        async fn propose(&self, _context: &MarketContext) -> Result<Proposal> {
            Err(TraderError::SourceUnavailable("down".to_string()))
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn pipeline(proposal: Proposal) -> TradingPipeline {
        TradingPipeline::from_config(&AppConfig::default(), Some(Box::new(Fixed(proposal))))
    }

    #[tokio::test]
    async fn test_corrects_self_pair() {
        let report = pipeline(Proposal::new(Action::Buy, "SOL", 0.8, "moon"))
            .run_cycle(&MarketContext::new(dec!(1), 0.7, 0.2, 0.0))
            .await;
        let pair = report.pair.unwrap();
        assert_eq!(pair.from_token, "SOL");
        assert_eq!(pair.to_token, "USDC");
        assert_eq!(report.decision.token, "USDC");
        assert!(report.decision.reasoning.contains("self-trade"));
    }

    #[tokio::test]
    async fn test_sell_keeps_token_leg() {
        let report = pipeline(Proposal::new(Action::Sell, "bonk", 0.6, "fade"))
            .run_cycle(&MarketContext::new(dec!(1), 0.2, 0.2, 0.0))
            .await;
        assert_eq!(report.decision.action, Action::Sell);
        assert_eq!(report.decision.token, "BONK");
        assert!(report.pair.unwrap().is_valid);
    }

    #[tokio::test]
    async fn test_cannot_trade_skips_engine() {
        let p = pipeline(Proposal::new(Action::Buy, "JUP", 0.9, "go"));
        let report = p.run_cycle(&MarketContext::new(dec!(0.003), 0.9, 0.1, 0.0)).await;
        assert!(!report.snapshot.can_trade);
        assert!(report.pair.is_none());
        assert_eq!(report.decision.action, Action::Hold);
        assert_eq!(report.decision.amount, Decimal::ZERO);
        assert_eq!(p.engine().consecutive_holds(), 0);
    }

    #[tokio::test]
    async fn test_hold_has_no_pair() {
        let report = pipeline(Proposal::new(Action::Hold, "JUP", 0.5, "flat"))
            .run_cycle(&MarketContext::new(dec!(1), 0.5, 0.1, 0.0))
            .await;
        assert!(report.pair.is_none());
        assert!(report.decision.is_hold());
    }

    #[tokio::test]
    async fn test_stats_track_outcomes() {
        let p = TradingPipeline::from_config(&AppConfig::default(), Some(Box::new(Broken)));
        p.decide(&MarketContext::new(dec!(1), 0.5, 0.1, 0.0)).await;
        p.decide(&MarketContext::new(dec!(0), 0.5, 0.1, 0.0)).await;
        // fallback of 5% of (0.06 - 0.05) is raised to the minimum trade
        p.decide(&MarketContext::new(dec!(0.06), 0.5, 0.1, 0.0)).await;

        let stats = p.stats();
        assert_eq!(stats.cycles, 3);
        assert_eq!(stats.buys, 2);
        assert_eq!(stats.holds, 1);
        assert_eq!(stats.fallbacks, 2);
        assert_eq!(stats.guard_downgrades, 0);
    }
}
