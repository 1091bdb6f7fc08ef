//! Decision source backed by an OpenAI-compatible chat completions API

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

use super::messages::{ChatMessage, ChatRequest, ChatResponse};
use super::reply::{parse_model_reply, REPLY_FORMAT};
use crate::common::errors::{Result, TraderError};
use crate::common::traits::DecisionSource;
use crate::common::types::{MarketContext, Proposal};
use crate::config::types::ModelConfig;

/// HTTP model client that proposes decisions
#[derive(Debug, Clone)]
pub struct HttpModelSource {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HttpModelSource {
    pub fn new(endpoint: &str, api_key: &str, model: &str) -> Result<Self> {
        Self::with_timeout(endpoint, api_key, model, Duration::from_secs(30))
    }

    pub fn with_timeout(endpoint: &str, api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TraderError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Build from config; fails when no API key is set
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| TraderError::Configuration("model.api_key is not set".to_string()))?;
        Self::with_timeout(
            &config.endpoint,
            api_key,
            &config.model,
            Duration::from_secs(config.timeout_seconds),
        )
    }

    fn prompt(context: &MarketContext) -> String {
        format!(
            "Wallet balance: {} SOL\nTrend (0 bearish - 1 bullish): {:.3}\nVolatility: {:.3}\n\
             Recent performance: {:+.3}\nDecide the next trade for this Solana wallet.",
            context.balance, context.trend, context.volatility, context.recent_performance
        )
    }

    fn request(&self, context: &MarketContext) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(format!(
                    "You are a conservative crypto trading assistant. {}",
                    REPLY_FORMAT
                )),
                ChatMessage::user(Self::prompt(context)),
            ],
            temperature: 0.2,
            max_tokens: 120,
        }
    }
}

#[async_trait]
impl DecisionSource for HttpModelSource {
    #[instrument(skip(self, context), fields(model = %self.model))]
    async fn propose(&self, context: &MarketContext) -> Result<Proposal> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request(context))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TraderError::InvalidResponse(format!(
                "Model endpoint returned status {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| TraderError::InvalidResponse("no choices in model response".to_string()))?;

        debug!(reply = %content, "Model replied");
        parse_model_reply(&content)
    }

    fn name(&self) -> &'static str {
        "http_model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_request_carries_format_and_context() {
        let source = HttpModelSource::new("http://localhost/v1", "key", "test-model").unwrap();
        let req = source.request(&MarketContext::new(dec!(0.5), 0.61, 0.2, -0.05));
        assert_eq!(req.model, "test-model");
        assert_eq!(req.messages.len(), 2);
        assert!(req.messages[0].content.contains("ACTION|TOKEN|CONFIDENCE|REASONING"));
        assert!(req.messages[1].content.contains("0.5 SOL"));
        assert!(req.messages[1].content.contains("0.610"));
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = ModelConfig::default();
        assert!(matches!(
            HttpModelSource::from_config(&config),
            Err(TraderError::Configuration(_))
        ));
    }
}
