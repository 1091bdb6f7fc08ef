//! Solana JSON-RPC balance lookups

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, instrument};

use super::messages::{BalanceResult, RpcRequest, RpcResponse};
use crate::common::errors::{Result, TraderError};
use crate::common::traits::BalanceProvider;
use crate::config::types::RpcConfig;

/// Lamports per SOL, as a decimal scale
const SOL_DECIMALS: u32 = 9;

/// Balance provider that queries `getBalance` on a Solana node
#[derive(Debug)]
pub struct SolanaRpcBalance {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl SolanaRpcBalance {
    pub fn new(url: &str) -> Result<Self> {
        Self::with_timeout(url, Duration::from_secs(30))
    }

    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TraderError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &RpcConfig) -> Result<Self> {
        Self::with_timeout(&config.url, Duration::from_secs(config.timeout_seconds))
    }

    /// Convert lamports to SOL
    pub fn lamports_to_sol(lamports: u64) -> Decimal {
        Decimal::from_i128_with_scale(lamports as i128, SOL_DECIMALS).normalize()
    }
}

#[async_trait]
impl BalanceProvider for SolanaRpcBalance {
    #[instrument(skip(self))]
    async fn balance(&self, wallet: &str) -> Result<Decimal> {
        let wallet = wallet.trim();
        if wallet.is_empty() {
            return Err(TraderError::InvalidResponse("empty wallet address".to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(
            id,
            "getBalance",
            json!([wallet, { "commitment": "confirmed" }]),
        );

        let response = self.client.post(&self.url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TraderError::InvalidResponse(format!(
                "RPC returned status {}: {}",
                status, body
            )));
        }

        let rpc: RpcResponse<BalanceResult> = response.json().await?;
        if let Some(err) = rpc.error {
            return Err(TraderError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        let lamports = rpc
            .result
            .map(|r| r.value)
            .ok_or_else(|| TraderError::InvalidResponse("getBalance returned no result".to_string()))?;

        let sol = Self::lamports_to_sol(lamports);
        debug!(lamports, %sol, "Fetched wallet balance");
        Ok(sol)
    }
}
