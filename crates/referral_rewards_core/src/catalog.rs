//! crates/referral_rewards_core/src/catalog.rs
//!
//! The static, ordered list of reward tiers. Shared by every session and
//! never varies per user.

use crate::domain::TierDef;

static REFERENCE_TIERS: [TierDef; 6] = [
    TierDef {
        id: 1,
        title: "Getting Started",
        description: "Welcome to the program!",
        requirement: 0.0,
        accent: "yellow",
    },
    TierDef {
        id: 2,
        title: "First Milestone",
        description: "Reach $1,000 in donations",
        requirement: 1_000.0,
        accent: "blue",
    },
    TierDef {
        id: 3,
        title: "Rising Star",
        description: "Reach $5,000 in donations",
        requirement: 5_000.0,
        accent: "green",
    },
    TierDef {
        id: 4,
        title: "Super Achiever",
        description: "Reach $10,000 in donations",
        requirement: 10_000.0,
        accent: "purple",
    },
    TierDef {
        id: 5,
        title: "Champion",
        description: "Reach $25,000 in donations",
        requirement: 25_000.0,
        accent: "orange",
    },
    TierDef {
        id: 6,
        title: "Legend",
        description: "Reach $50,000 in donations",
        requirement: 50_000.0,
        accent: "red",
    },
];

/// Returns the reference catalog in tier order.
pub fn all() -> &'static [TierDef] {
    &REFERENCE_TIERS
}

/// Reasons a catalog breaks the ordering invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("tier ids must be strictly increasing, found {previous} before {current}")]
    IdOrder { previous: u32, current: u32 },
    #[error("tier {id} requirement {requirement} does not exceed the previous tier's")]
    RequirementOrder { id: u32, requirement: f64 },
    #[error("tier {id} has a negative or non-finite requirement")]
    InvalidRequirement { id: u32 },
}

/// Checks that ids and requirements both increase strictly across the catalog.
pub fn validate(tiers: &[TierDef]) -> Result<(), CatalogError> {
    for tier in tiers {
        if !tier.requirement.is_finite() || tier.requirement < 0.0 {
            return Err(CatalogError::InvalidRequirement { id: tier.id });
        }
    }
    for pair in tiers.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        if cur.id <= prev.id {
            return Err(CatalogError::IdOrder {
                previous: prev.id,
                current: cur.id,
            });
        }
        if cur.requirement <= prev.requirement {
            return Err(CatalogError::RequirementOrder {
                id: cur.id,
                requirement: cur.requirement,
            });
        }
    }
    Ok(())
}
