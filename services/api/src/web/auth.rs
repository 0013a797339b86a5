//! services/api/src/web/auth.rs
//!
//! Login, signup and logout. Login and signup are stubs: no credential is
//! verified, but each still pays the simulated network delay and is
//! guarded against duplicate submission.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use referral_rewards_core::{catalog, evaluator, EngineError, SignupForm};
use std::sync::Arc;
use tracing::{info, warn};

use crate::web::protocol::{
    busy, engine_failure, DashboardResponse, HandlerError, LoginRequest, SignupRequest,
};
use crate::web::state::AppState;

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/login - Log in with any email
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = DashboardResponse),
        (status = 409, description = "A login is already in progress"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let Some(_in_flight) = state.login_in_flight.try_begin() else {
        warn!("Login already in progress; rejecting duplicate submission");
        return Err(busy());
    };
    state.simulate_latency().await;

    let session = {
        let _serial = state.mutation_lock.lock().await;
        state.sessions.login(&req.email).await.map_err(engine_failure)?
    };

    let summary = evaluator::summarize(session.total_donations, catalog::all());
    Ok((
        StatusCode::OK,
        Json(DashboardResponse::build(
            &session,
            &summary,
            &state.config.public_origin,
        )),
    ))
}

/// POST /auth/signup - Create a new account with a zero total
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = DashboardResponse),
        (status = 400, description = "Passwords don't match or name is empty"),
        (status = 409, description = "A signup is already in progress"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let form = SignupForm {
        name: req.name,
        email: req.email,
        password: req.password,
        confirm_password: req.confirm_password,
    };
    // Validation failures are reported before the delay, as the form does.
    if form.password != form.confirm_password {
        return Err(engine_failure(EngineError::PasswordMismatch));
    }

    let Some(_in_flight) = state.signup_in_flight.try_begin() else {
        warn!("Signup already in progress; rejecting duplicate submission");
        return Err(busy());
    };
    state.simulate_latency().await;

    let session = {
        let _serial = state.mutation_lock.lock().await;
        state.sessions.signup(&form).await.map_err(engine_failure)?
    };

    let summary = evaluator::summarize(session.total_donations, catalog::all());
    Ok((
        StatusCode::CREATED,
        Json(DashboardResponse::build(
            &session,
            &summary,
            &state.config.public_origin,
        )),
    ))
}

/// POST /auth/logout - Clear the stored session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out (also when no session was active)"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let _serial = state.mutation_lock.lock().await;
    state.sessions.logout().await.map_err(engine_failure)?;
    info!("Logged out");
    Ok(StatusCode::OK)
}
