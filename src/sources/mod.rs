//! Concrete collaborators for the trading pipeline
//!
//! - [`TrendHeuristicSource`]: deterministic rule-based decision source
//! - [`HttpModelSource`]: model-backed decision source over HTTP
//! - [`SolanaRpcBalance`]: wallet balance via Solana JSON-RPC

pub mod heuristic;
pub mod messages;
pub mod model;
pub mod reply;
pub mod rpc;

pub use heuristic::TrendHeuristicSource;
pub use model::HttpModelSource;
pub use reply::parse_model_reply;
pub use rpc::SolanaRpcBalance;
