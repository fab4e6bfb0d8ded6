//! Shared plumbing for Atrium services: config loading, tracing setup,
//! health endpoints, request-id middleware, and the gateway identity
//! extractor.

pub mod config;
pub mod health;
pub mod identity;
pub mod middleware;
pub mod serde;
pub mod tracing;
