//! Trait definitions for pipeline collaborators

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::errors::Result;
use super::types::{MarketContext, Proposal};

/// Pluggable proposer of an action and confidence
///
/// Implementations may be a rules engine, a model call, or a test stub.
/// Any error returned here is absorbed by the decision engine, which
/// substitutes its conservative fallback.
#[async_trait]
pub trait DecisionSource: Send + Sync {
    /// Propose an action for the given market snapshot
    async fn propose(&self, context: &MarketContext) -> Result<Proposal>;

    /// Short identifier used in logs and decision labels
    fn name(&self) -> &'static str;
}

/// Source of wallet balances in the base asset
#[async_trait]
pub trait BalanceProvider: Send + Sync {
    /// Fetch the current balance for a wallet address
    async fn balance(&self, wallet: &str) -> Result<Decimal>;
}

/// Boxed decision source for dynamic dispatch
pub type BoxedDecisionSource = Box<dyn DecisionSource>;
