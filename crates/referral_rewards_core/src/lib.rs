pub mod catalog;
pub mod domain;
pub mod error;
pub mod evaluator;
pub mod ledger;
pub mod memory;
pub mod ports;
pub mod referral;
pub mod session;

pub use domain::{
    Amount, DonationReceipt, DonationRequest, PaymentMethod, Session, TierDef, TierState,
    UserIdentity,
};
pub use error::{EngineError, EngineResult};
pub use evaluator::{evaluate, next_locked, progress_fraction, summarize, RewardSummary};
pub use memory::InMemoryStore;
pub use ports::{KeyValueStore, PortError, PortResult, RandomSource};
pub use session::{SessionState, SessionStore, SignupForm};
