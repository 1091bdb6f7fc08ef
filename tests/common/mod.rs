//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use balance_aware_trader::{
    AppConfig, DecisionSource, MarketContext, Proposal, Result, TradingPipeline,
};
use mockall::mock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mock! {
    pub Source {}

    #[async_trait]
    impl DecisionSource for Source {
        async fn propose(&self, context: &MarketContext) -> Result<Proposal>;
        fn name(&self) -> &'static str;
    }
}

/// Mock source that always returns the given proposal
pub fn source_returning(proposal: Proposal) -> MockSource {
    let mut source = MockSource::new();
    source
        .expect_propose()
        .returning(move |_| Ok(proposal.clone()));
    source.expect_name().return_const("mock");
    source
}

/// Pipeline with default config around a mock source
pub fn pipeline_with(source: MockSource) -> TradingPipeline {
    TradingPipeline::from_config(&AppConfig::default(), Some(Box::new(source)))
}

/// Context with the given balance and neutral-bullish market
pub fn context(balance: Decimal) -> MarketContext {
    MarketContext::new(balance, 0.6, 0.3, 0.0)
}

/// The reference wallet balance used across scenarios
pub fn reference_balance() -> Decimal {
    dec!(0.288736)
}

/// Balances from empty to comfortably funded
pub fn balance_grid() -> Vec<Decimal> {
    (0..=60u32).map(|i| Decimal::from(i) * dec!(0.0173)).collect()
}
