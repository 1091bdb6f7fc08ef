//! Parser for `ACTION|TOKEN|CONFIDENCE|REASONING` model replies

use crate::common::errors::{Result, TraderError};
use crate::common::types::{Action, Proposal};

/// Instruction appended to every model prompt
pub const REPLY_FORMAT: &str = "Respond with exactly one line: ACTION|TOKEN|CONFIDENCE|REASONING \
     where ACTION is BUY, SELL or HOLD, TOKEN is a token symbol, CONFIDENCE is a number \
     between 0 and 1, and REASONING is one short sentence.";

/// Parse the first line of `text` that looks like a decision
///
/// Confidence is returned as written (a trailing `%` divides by 100);
/// range clamping happens downstream.
pub fn parse_model_reply(text: &str) -> Result<Proposal> {
    let line = text
        .lines()
        .map(|l| l.trim().trim_matches('`').trim())
        .find(|l| l.matches('|').count() >= 3)
        .ok_or_else(|| TraderError::ModelReply(format!("no decision line in {:?}", truncate(text))))?;

    let mut fields = line.splitn(4, '|').map(str::trim);
    let (action, token, confidence, reasoning) = match (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) {
        (Some(a), Some(t), Some(c), Some(r)) => (a, t, c, r),
        _ => return Err(TraderError::ModelReply(format!("expected 4 fields in {:?}", line))),
    };

    let action = parse_action(action)?;

    let token = token.to_uppercase();
    if token.is_empty() {
        return Err(TraderError::ModelReply("empty token".to_string()));
    }

    let confidence = parse_confidence(confidence)?;

    Ok(Proposal::new(action, token, confidence, reasoning))
}

fn parse_action(raw: &str) -> Result<Action> {
    match raw.to_uppercase().as_str() {
        "BUY" => Ok(Action::Buy),
        "SELL" => Ok(Action::Sell),
        "HOLD" => Ok(Action::Hold),
        other => Err(TraderError::ModelReply(format!("unknown action {:?}", other))),
    }
}

fn parse_confidence(raw: &str) -> Result<f64> {
    let (number, scale) = match raw.strip_suffix('%') {
        Some(stripped) => (stripped.trim(), 100.0),
        None => (raw, 1.0),
    };
    let value: f64 = number
        .parse()
        .map_err(|_| TraderError::ModelReply(format!("invalid confidence {:?}", raw)))?;
    if !value.is_finite() {
        return Err(TraderError::ModelReply(format!("invalid confidence {:?}", raw)));
    }
    Ok(value / scale)
}

fn truncate(text: &str) -> String {
    text.chars().take(80).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_plain_line() {
        let p = parse_model_reply("BUY|jup|0.72|Momentum is building").unwrap();
        assert_eq!(p, Proposal::new(Action::Buy, "JUP", 0.72, "Momentum is building"));
    }

    #[test]
    fn test_skips_chatter_and_fences() {
        let reply = "Sure, here is my call:\n```\nsell | BONK | 65% | Overextended | take profit\n```";
        let p = parse_model_reply(reply).unwrap();
        assert_eq!(p.action, Action::Sell);
        assert_eq!(p.token, "BONK");
        assert!((p.confidence - 0.65).abs() < 1e-12);
        assert_eq!(p.reasoning, "Overextended | take profit");
    }

    #[test]
    fn test_out_of_range_confidence_is_kept() {
        let p = parse_model_reply("HOLD|USDC|1.30|unsure").unwrap();
        assert_eq!(p.confidence, 1.30);
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in [
            "",
            "BUY JUP 0.5",
            "BUY|JUP|0.5",
            "YOLO|JUP|0.5|why not",
            "BUY||0.5|no token",
            "BUY|JUP|high|words",
            "BUY|JUP|NaN|nan",
        ] {
            assert!(
                matches!(parse_model_reply(bad), Err(TraderError::ModelReply(_))),
                "accepted {:?}",
                bad
            );
        }
    }
}
