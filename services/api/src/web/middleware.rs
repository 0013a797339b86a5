//! services/api/src/web/middleware.rs
//!
//! Session gate for the dashboard routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use referral_rewards_core::SessionState;
use std::sync::Arc;

use crate::web::protocol::{engine_failure, session_absent, HandlerError};
use crate::web::state::AppState;

/// Middleware that requires an authenticated session.
///
/// If one is stored, the `Session` is inserted into request extensions for
/// handlers to use. Otherwise the request is answered with 401 and a redirect
/// to the login page; no partial or default dashboard is ever rendered.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HandlerError> {
    match state.sessions.load().await.map_err(engine_failure)? {
        SessionState::Authenticated(session) => {
            req.extensions_mut().insert(session);
            Ok(next.run(req).await)
        }
        SessionState::Anonymous => Err(session_absent()),
    }
}
