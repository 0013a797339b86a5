//! crates/referral_rewards_core/src/domain.rs
//!
//! Defines the pure, core data structures for the reward engine.
//! Storage layout concerns live in `session.rs`; these types carry no
//! knowledge of how they are persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A donation amount in decimal currency units.
pub type Amount = f64;

/// The person behind the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct UserIdentity {
    pub name: String,
    /// Only used as a display value and as a seed for the default referral code.
    pub email: String,
    pub referral_code: String,
    /// Set once when the identity is created, never rewritten.
    pub join_date: DateTime<Utc>,
}

impl UserIdentity {
    /// First letter of each word of the name, uppercased ("Ada Lovelace" -> "AL").
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }
}

/// An authenticated session: exactly one identity and its running total.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub identity: UserIdentity,
    pub total_donations: Amount,
}

/// A static reward tier definition from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierDef {
    pub id: u32,
    pub title: &'static str,
    pub description: &'static str,
    pub requirement: Amount,
    /// Display accent colour for the badge.
    pub accent: &'static str,
}

/// A tier paired with its unlock state for a given total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierState {
    pub tier: TierDef,
    pub unlocked: bool,
}

/// How a manually recorded donation was paid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    #[default]
    CreditCard,
    Bank,
    Mobile,
}

/// Everything the entry form submits for one donation.
#[derive(Debug, Clone, PartialEq)]
pub struct DonationRequest {
    pub amount: Amount,
    pub donor_name: Option<String>,
    pub payment_method: PaymentMethod,
}

/// The audit record of one accepted donation. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DonationReceipt {
    pub id: Uuid,
    pub amount: Amount,
    pub donor_name: String,
    pub payment_method: PaymentMethod,
    pub recorded_at: DateTime<Utc>,
    pub new_total: Amount,
}
