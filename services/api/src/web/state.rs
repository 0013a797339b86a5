//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::guard::InFlight;
use referral_rewards_core::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Artificial delay applied to login, signup and donation submission.
pub const SIMULATED_LATENCY: Duration = Duration::from_secs(1);

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub sessions: SessionStore,
    pub config: Arc<Config>,
    pub latency: Duration,
    /// Held for the load-mutate-persist cycle of every mutation so events
    /// are applied one at a time.
    pub mutation_lock: Mutex<()>,
    pub login_in_flight: InFlight,
    pub signup_in_flight: InFlight,
    pub donation_in_flight: InFlight,
}

impl AppState {
    pub fn new(sessions: SessionStore, config: Arc<Config>) -> Self {
        Self::with_latency(sessions, config, SIMULATED_LATENCY)
    }

    pub fn with_latency(sessions: SessionStore, config: Arc<Config>, latency: Duration) -> Self {
        Self {
            sessions,
            config,
            latency,
            mutation_lock: Mutex::new(()),
            login_in_flight: InFlight::default(),
            signup_in_flight: InFlight::default(),
            donation_in_flight: InFlight::default(),
        }
    }

    pub async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}
