//! crates/referral_rewards_core/src/evaluator.rs
//!
//! Derives reward state from a donation total. Everything here is a pure
//! function of `(total, catalog)` and is recomputed on every read instead
//! of being stored.

use crate::domain::{Amount, TierDef, TierState};

/// Donation amount that counts as one estimated referral on the dashboard.
pub const AMOUNT_PER_REFERRAL: Amount = 500.0;

/// Computes the unlock state of every tier, preserving catalog order.
///
/// A tier whose requirement is zero or below is always unlocked.
pub fn evaluate(total: Amount, catalog: &[TierDef]) -> Vec<TierState> {
    catalog
        .iter()
        .map(|tier| TierState {
            tier: *tier,
            unlocked: tier.requirement <= 0.0 || total >= tier.requirement,
        })
        .collect()
}

/// The first locked tier in order, or `None` once every tier is unlocked.
pub fn next_locked(states: &[TierState]) -> Option<&TierState> {
    states.iter().find(|state| !state.unlocked)
}

/// How far `total` has progressed toward `next`, clamped to `[0, 1]`.
pub fn progress_fraction(total: Amount, next: Option<&TierState>) -> f64 {
    let Some(next) = next else {
        return 1.0;
    };
    let requirement = next.tier.requirement;
    if requirement <= 0.0 {
        return 1.0;
    }
    (total / requirement).clamp(0.0, 1.0)
}

/// Everything the dashboard renders about rewards for one total.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardSummary {
    pub total: Amount,
    pub tiers: Vec<TierState>,
    pub unlocked_count: usize,
    pub next_locked: Option<TierState>,
    pub progress_fraction: f64,
    pub progress_percent: u32,
    pub remaining_to_next: Amount,
    pub active_referrals: u64,
}

/// Evaluates `total` against the catalog and derives every dashboard figure from it.
pub fn summarize(total: Amount, catalog: &[TierDef]) -> RewardSummary {
    let tiers = evaluate(total, catalog);
    let unlocked_count = tiers.iter().filter(|s| s.unlocked).count();
    let next = next_locked(&tiers).copied();
    let fraction = progress_fraction(total, next.as_ref());
    let remaining_to_next = next
        .map(|n| (n.tier.requirement - total).max(0.0))
        .unwrap_or(0.0);

    RewardSummary {
        total,
        unlocked_count,
        next_locked: next,
        progress_fraction: fraction,
        progress_percent: (fraction * 100.0).round() as u32,
        remaining_to_next,
        active_referrals: estimated_referrals(total),
        tiers,
    }
}

/// The dashboard's referral estimate: one per `AMOUNT_PER_REFERRAL` donated.
pub fn estimated_referrals(total: Amount) -> u64 {
    if !total.is_finite() || total <= 0.0 {
        return 0;
    }
    (total / AMOUNT_PER_REFERRAL).floor() as u64
}
