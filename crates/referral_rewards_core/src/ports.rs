//! crates/referral_rewards_core/src/ports.rs
//!
//! Defines the service contracts (traits) the engine depends on.
//! Storage and randomness are injected through these traits so the core
//! never touches ambient global state and tests can run deterministically.

use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The backing store could not be read or written.
    #[error("Persistence failure: {0}")]
    Persistence(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// A string-keyed, string-valued store that outlives a single process run.
///
/// Batched writes and removals must be applied all-or-nothing.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn write_batch(&self, entries: &[(&str, String)]) -> PortResult<()>;

    async fn remove_batch(&self, keys: &[&str]) -> PortResult<()>;
}

/// A source of uniformly distributed integers.
pub trait RandomSource: Send + Sync {
    /// Returns a value in the half-open range `[low, high)`.
    fn next_in_range(&self, low: u32, high: u32) -> u32;
}
