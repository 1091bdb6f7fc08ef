//! Common types, traits, and errors shared across the pipeline

pub mod errors;
pub mod traits;
pub mod types;
