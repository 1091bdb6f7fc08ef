use tracing::warn;

use crate::common::types::{Side, ValidatedPair};
use crate::config::types::PairConfig;

/// Keeps swap pairs away from self-trades and unknown symbols
#[derive(Debug, Clone, Default)]
pub struct TradingPairValidator {
    config: PairConfig,
}

impl TradingPairValidator {
    /// Symbols from config are normalised once so comparisons are exact
    pub fn new(config: PairConfig) -> Self {
        let config = PairConfig {
            base_token: normalize(&config.base_token),
            known_tokens: config.known_tokens.iter().map(|t| normalize(t)).collect(),
            fallback_targets: config.fallback_targets.iter().map(|t| normalize(t)).collect(),
            degenerate_fallback: normalize(&config.degenerate_fallback),
        };
        Self { config }
    }

    /// Validate the pair implied by `side` and `token`
    ///
    /// BUY swaps base into `token`, SELL swaps `token` into base. Always
    /// returns a pair whose two legs differ.
    pub fn validate(&self, side: Side, token: &str) -> ValidatedPair {
        let base = self.config.base_token.as_str();
        let token = normalize(token);

        if token == base {
            let fallback = self.config.degenerate_fallback.as_str();
            let reason = format!(
                "{} {} against {} is a self-trade, using {} instead",
                side_label(side),
                token,
                base,
                fallback
            );
            warn!(%reason, "Corrected degenerate pair");
            return self.pair(side, fallback, false, Some(reason));
        }

        if !self.is_known(&token) {
            let fallback = self.fallback_for(&token);
            let reason = format!("Unknown token '{}', substituted {}", token, fallback);
            warn!(%reason, "Corrected unknown pair");
            return self.pair(side, fallback, false, Some(reason));
        }

        self.pair(side, &token, true, None)
    }

    /// Whether a symbol is on the allow-list
    pub fn is_known(&self, token: &str) -> bool {
        let token = normalize(token);
        self.config.known_tokens.iter().any(|t| *t == token)
    }

    /// Deterministic pick from the fallback list, keyed on the rejected symbol
    fn fallback_for(&self, token: &str) -> &str {
        let targets: Vec<&str> = self
            .config
            .fallback_targets
            .iter()
            .map(String::as_str)
            .filter(|t| *t != self.config.base_token)
            .collect();

        if targets.is_empty() {
            return self.config.degenerate_fallback.as_str();
        }

        let key = token.bytes().fold(0usize, |acc, b| acc.wrapping_add(b as usize));
        targets[key % targets.len()]
    }

    fn pair(&self, side: Side, counter: &str, is_valid: bool, reason: Option<String>) -> ValidatedPair {
        let base = self.config.base_token.clone();
        let counter = counter.to_string();
        let (from_token, to_token) = match side {
            Side::Buy => (base, counter),
            Side::Sell => (counter, base),
        };
        ValidatedPair {
            from_token,
            to_token,
            is_valid,
            reason,
        }
    }
}

fn normalize(token: &str) -> String {
    token.trim().to_uppercase()
}

fn side_label(side: Side) -> &'static str {
    match side {
        Side::Buy => "BUY",
        Side::Sell => "SELL",
    }
}
