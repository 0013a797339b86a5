//! crates/referral_rewards_core/src/error.rs
//!
//! The error type shared by every engine operation. None of these are fatal;
//! each one leaves stored state untouched.

use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The donation amount was non-numeric, non-finite, zero or negative.
    #[error("Invalid donation amount: {0}")]
    InvalidAmount(String),

    #[error("Passwords don't match")]
    PasswordMismatch,

    /// The display name was empty after trimming.
    #[error("Name must not be empty")]
    InvalidName,

    #[error("Storage error: {0}")]
    Port(#[from] PortError),

    #[error("Failed to encode session: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A convenience type alias for `Result<T, EngineError>`.
pub type EngineResult<T> = Result<T, EngineError>;
