//! crates/referral_rewards_core/src/referral.rs
//!
//! Referral codes and the links that carry them.
//!
//! A code is the user's name folded to lowercase ASCII alphanumerics with a
//! numeric suffix appended, so it is always safe to embed in a URL.

use crate::ports::RandomSource;
use regex::Regex;
use std::sync::OnceLock;

/// Suffix used for the code derived at account creation.
pub const INITIAL_CODE_SUFFIX: &str = "2025";

/// Bounds of the random suffix used on regeneration, as `[low, high)`.
pub const REGENERATE_SUFFIX_RANGE: (u32, u32) = (0, 10_000);

/// Stands in for a name with no usable characters.
const FALLBACK_STEM: &str = "donor";

fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9]+$").expect("static pattern is valid"))
}

/// Lowercases `name` and keeps only ASCII letters and digits.
pub fn normalize_name(name: &str) -> String {
    let stem: String = name
        .to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    }
}

/// The deterministic code given to a new account.
pub fn derive_initial_code(name: &str) -> String {
    format!("{}{}", normalize_name(name), INITIAL_CODE_SUFFIX)
}

/// A fresh code with a random numeric suffix. May repeat a previous code.
pub fn regenerate(name: &str, rng: &dyn RandomSource) -> String {
    let (low, high) = REGENERATE_SUFFIX_RANGE;
    format!("{}{}", normalize_name(name), rng.next_in_range(low, high))
}

/// True when `code` is non-empty lowercase ASCII letters and digits only.
pub fn is_valid_code(code: &str) -> bool {
    code_pattern().is_match(code)
}

/// Builds `<origin>/join?ref=<code>`.
pub fn referral_link(origin: &str, code: &str) -> String {
    format!("{}/join?ref={}", origin.trim_end_matches('/'), code)
}

/// What the join page shows for an incoming `ref` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invite {
    /// Invited with a recognisable referral code.
    Referred(String),
    /// No usable code; show the generic invitation.
    Generic,
}

/// Interprets the `ref` query parameter. Missing or malformed codes degrade
/// to the generic invite rather than failing.
pub fn invite_from_query(reference: Option<&str>) -> Invite {
    match reference.map(str::trim) {
        Some(code) if is_valid_code(code) => Invite::Referred(code.to_string()),
        _ => Invite::Generic,
    }
}
