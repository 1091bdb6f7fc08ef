use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::common::types::BalanceSnapshot;
use crate::config::types::BalancePolicy;

/// Splits a wallet balance into reserved and tradable capital
///
/// Pure computation; the balance itself is fetched elsewhere
/// (see [`crate::common::traits::BalanceProvider`]).
#[derive(Debug, Clone, Default)]
pub struct BalanceAnalyzer {
    policy: BalancePolicy,
}

impl BalanceAnalyzer {
    pub fn new(policy: BalancePolicy) -> Self {
        Self { policy }
    }

    /// Analyze a balance in the base asset
    ///
    /// Never fails. Negative balances are analysed as zero and simply
    /// produce `can_trade = false`.
    pub fn analyze(&self, balance: Decimal) -> BalanceSnapshot {
        let total_balance = balance.max(Decimal::ZERO);
        let reserved_for_gas = self.policy.reserved_for_gas();
        let available_for_trading = (total_balance - reserved_for_gas).max(Decimal::ZERO);

        let recommended_trade_size = available_for_trading * self.policy.recommended_fraction;
        let max_safe_trade_size = available_for_trading * self.policy.max_safe_fraction;
        let can_trade = available_for_trading > self.policy.min_viable_trade;

        let reasoning = Self::describe(total_balance, available_for_trading, reserved_for_gas);

        debug!(
            %total_balance,
            %available_for_trading,
            %max_safe_trade_size,
            can_trade,
            "Balance analyzed"
        );

        BalanceSnapshot {
            total_balance,
            available_for_trading,
            reserved_for_gas,
            recommended_trade_size,
            max_safe_trade_size,
            can_trade,
            reasoning,
        }
    }

    fn describe(total: Decimal, available: Decimal, reserved: Decimal) -> String {
        if available <= dec!(0.001) {
            format!(
                "Insufficient balance: {} SOL total, {} SOL reserved for gas leaves nothing to trade",
                total, reserved
            )
        } else if available < dec!(0.01) {
            format!(
                "Very low balance: only {} SOL available, micro trades only",
                available
            )
        } else if available < dec!(0.05) {
            format!(
                "Limited balance: {} SOL available, keep positions small",
                available
            )
        } else {
            format!(
                "Healthy balance: {} SOL available after {} SOL gas reserve",
                available, reserved
            )
        }
    }
}
