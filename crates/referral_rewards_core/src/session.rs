//! crates/referral_rewards_core/src/session.rs
//!
//! The Session Store: the single authority on whether a user is logged in.
//!
//! State is kept in an injected `KeyValueStore` under two keys, `isLoggedIn`
//! and `user`. Only the identity and the running total are stored; reward
//! state is always re-derived. Every mutation writes the full snapshot in one
//! batch before returning, so a reload never observes a half-applied update.

use crate::domain::{Amount, DonationReceipt, DonationRequest, Session, UserIdentity};
use crate::error::{EngineError, EngineResult};
use crate::ledger;
use crate::ports::{KeyValueStore, PortError, RandomSource};
use crate::referral;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub const LOGGED_IN_KEY: &str = "isLoggedIn";
pub const USER_KEY: &str = "user";

/// Display name used when an email has no local part.
pub const DEFAULT_LOGIN_NAME: &str = "John Doe";

/// Range of the simulated donation history given to a logged-in user, `[low, high)`.
pub const SEEDED_TOTAL_RANGE: (u32, u32) = (10_000, 60_000);

//=========================================================================================
// Session States
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Anonymous,
    Authenticated(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Authenticated(session) => Some(session),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// The fields submitted by the signup form.
#[derive(Debug, Clone)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

//=========================================================================================
// Persisted Record
//=========================================================================================

/// The JSON shape stored under `user`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    name: String,
    email: String,
    referral_code: String,
    total_donations: Amount,
    join_date: DateTime<Utc>,
}

impl UserRecord {
    fn from_domain(session: &Session) -> Self {
        Self {
            name: session.identity.name.clone(),
            email: session.identity.email.clone(),
            referral_code: session.identity.referral_code.clone(),
            total_donations: session.total_donations,
            join_date: session.identity.join_date,
        }
    }

    fn to_domain(self) -> Session {
        Session {
            identity: UserIdentity {
                name: self.name,
                email: self.email,
                referral_code: self.referral_code,
                join_date: self.join_date,
            },
            total_donations: self.total_donations,
        }
    }
}

//=========================================================================================
// The Store
//=========================================================================================

#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
    rng: Arc<dyn RandomSource>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, rng: Arc<dyn RandomSource>) -> Self {
        Self { backend, rng }
    }

    /// Logs in with any email. The donation total is seeded with a random
    /// value to simulate an existing history.
    pub async fn login(&self, email: &str) -> EngineResult<Session> {
        let email = email.trim();
        let local_part = email.split('@').next().unwrap_or_default().trim();
        let name = if local_part.is_empty() {
            DEFAULT_LOGIN_NAME.to_string()
        } else {
            local_part.to_string()
        };

        let (low, high) = SEEDED_TOTAL_RANGE;
        let session = Session {
            identity: UserIdentity {
                referral_code: referral::derive_initial_code(&name),
                name,
                email: email.to_string(),
                join_date: Utc::now(),
            },
            total_donations: Amount::from(self.rng.next_in_range(low, high)),
        };

        self.persist(&session).await?;
        info!(
            "User {} logged in with code {}",
            session.identity.email, session.identity.referral_code
        );
        Ok(session)
    }

    /// Creates a fresh account with a zero total.
    pub async fn signup(&self, form: &SignupForm) -> EngineResult<Session> {
        if form.password != form.confirm_password {
            warn!("Signup rejected for {}: passwords don't match", form.email);
            return Err(EngineError::PasswordMismatch);
        }
        let name = form.name.trim();
        if name.is_empty() {
            warn!("Signup rejected for {}: empty name", form.email);
            return Err(EngineError::InvalidName);
        }

        let session = Session {
            identity: UserIdentity {
                name: name.to_string(),
                email: form.email.trim().to_string(),
                referral_code: referral::derive_initial_code(name),
                join_date: Utc::now(),
            },
            total_donations: 0.0,
        };

        self.persist(&session).await?;
        info!("Account created for {}", session.identity.email);
        Ok(session)
    }

    /// Clears the stored session. Safe to call when already logged out.
    pub async fn logout(&self) -> EngineResult<()> {
        self.backend
            .remove_batch(&[LOGGED_IN_KEY, USER_KEY])
            .await?;
        info!("Session cleared");
        Ok(())
    }

    /// Reads the stored session. A missing flag, or a flag without a
    /// readable user record, both yield `Anonymous`.
    pub async fn load(&self) -> EngineResult<SessionState> {
        let logged_in = self.backend.get(LOGGED_IN_KEY).await?;
        if logged_in.as_deref() != Some("true") {
            return Ok(SessionState::Anonymous);
        }

        let Some(raw) = self.backend.get(USER_KEY).await? else {
            warn!("Login flag set but no user record stored; treating as logged out");
            return Ok(SessionState::Anonymous);
        };

        match serde_json::from_str::<UserRecord>(&raw) {
            Ok(record) if record.total_donations.is_finite() && record.total_donations >= 0.0 => {
                Ok(SessionState::Authenticated(record.to_domain()))
            }
            Ok(record) => {
                warn!(
                    "Stored total {} is not a valid amount; treating as logged out",
                    record.total_donations
                );
                Ok(SessionState::Anonymous)
            }
            Err(e) => {
                warn!("Stored user record is unreadable ({}); treating as logged out", e);
                Ok(SessionState::Anonymous)
            }
        }
    }

    /// Writes the full snapshot and the login flag in one batch.
    pub async fn persist(&self, session: &Session) -> EngineResult<()> {
        let user_json = serde_json::to_string(&UserRecord::from_domain(session))?;
        self.backend
            .write_batch(&[(USER_KEY, user_json), (LOGGED_IN_KEY, "true".to_string())])
            .await?;
        Ok(())
    }

    /// Loads the active session or fails with `NotFound`.
    pub async fn require(&self) -> EngineResult<Session> {
        match self.load().await? {
            SessionState::Authenticated(session) => Ok(session),
            SessionState::Anonymous => Err(PortError::NotFound("active session".to_string()).into()),
        }
    }

    /// Applies a donation to the stored total and persists it.
    pub async fn record_donation(
        &self,
        request: &DonationRequest,
    ) -> EngineResult<(Session, DonationReceipt)> {
        let mut session = self.require().await?;
        let receipt = ledger::apply(session.total_donations, request)?;
        session.total_donations = receipt.new_total;
        self.persist(&session).await?;

        info!(
            "Donation {} of {} via {:?} from {} recorded; total is now {}",
            receipt.id, receipt.amount, receipt.payment_method, receipt.donor_name, receipt.new_total
        );
        Ok((session, receipt))
    }

    /// Replaces the referral code with a freshly generated one and persists it.
    pub async fn regenerate_code(&self) -> EngineResult<Session> {
        let mut session = self.require().await?;
        session.identity.referral_code =
            referral::regenerate(&session.identity.name, self.rng.as_ref());
        self.persist(&session).await?;

        info!("Referral code regenerated: {}", session.identity.referral_code);
        Ok(session)
    }
}
