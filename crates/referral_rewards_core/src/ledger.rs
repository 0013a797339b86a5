//! crates/referral_rewards_core/src/ledger.rs
//!
//! The donation ledger is a pure accumulator: the running total only ever
//! grows, and only by a strictly positive, finite amount. Persistence and
//! reward re-evaluation are the caller's job.

use crate::domain::{Amount, DonationReceipt, DonationRequest};
use crate::error::{EngineError, EngineResult};
use chrono::Utc;
use uuid::Uuid;

/// Preset amounts offered by the donation entry form.
pub const QUICK_AMOUNTS: [Amount; 6] = [25.0, 50.0, 100.0, 250.0, 500.0, 1_000.0];

/// Donor name shown when none was given.
pub const ANONYMOUS_DONOR: &str = "Anonymous";

/// Adds `delta` to `current`, rejecting anything that is not a positive, finite amount.
pub fn record_donation(current: Amount, delta: Amount) -> EngineResult<Amount> {
    if !delta.is_finite() {
        return Err(EngineError::InvalidAmount(format!(
            "{delta} is not a finite number"
        )));
    }
    if delta <= 0.0 {
        return Err(EngineError::InvalidAmount(format!(
            "{delta} must be greater than zero"
        )));
    }
    let total = current + delta;
    if !total.is_finite() {
        return Err(EngineError::InvalidAmount(format!(
            "adding {delta} overflows the running total"
        )));
    }
    Ok(total)
}

/// Parses a user-entered amount such as `"125.50"`.
pub fn parse_amount(raw: &str) -> EngineResult<Amount> {
    let trimmed = raw.trim();
    let amount = trimmed
        .parse::<Amount>()
        .map_err(|_| EngineError::InvalidAmount(format!("'{trimmed}' is not a number")))?;
    // Same checks as `record_donation`, applied before any state is touched.
    record_donation(0.0, amount)?;
    Ok(amount)
}

/// Validates and applies a donation, producing its audit receipt.
pub fn apply(current: Amount, request: &DonationRequest) -> EngineResult<DonationReceipt> {
    let new_total = record_donation(current, request.amount)?;
    let donor_name = request
        .donor_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(ANONYMOUS_DONOR)
        .to_string();

    Ok(DonationReceipt {
        id: Uuid::new_v4(),
        amount: request.amount,
        donor_name,
        payment_method: request.payment_method,
        recorded_at: Utc::now(),
        new_total,
    })
}
