//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the dashboard endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::protocol::{
    busy, engine_failure, AmountInput, DashboardResponse, DonationResponse, DonationSubmission,
    ErrorResponse, HandlerError, InviteResponse, LoginRequest, PaymentMethodDto, ReceiptDto,
    RedirectResponse, ReferralResponse, SignupRequest, TierDto, UserDto,
};
use crate::web::state::AppState;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
    Extension,
};
use referral_rewards_core::{
    catalog, evaluator, ledger,
    referral::{self, Invite},
    Amount, DonationRequest, Session,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{IntoParams, OpenApi};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        index_handler,
        crate::web::auth::login_handler,
        crate::web::auth::signup_handler,
        crate::web::auth::logout_handler,
        dashboard_handler,
        donation_handler,
        referral_handler,
        regenerate_code_handler,
        join_handler,
    ),
    components(
        schemas(
            LoginRequest, SignupRequest, DonationSubmission, AmountInput, PaymentMethodDto,
            DashboardResponse, UserDto, TierDto, DonationResponse, ReceiptDto,
            ReferralResponse, InviteResponse, RedirectResponse, ErrorResponse
        )
    ),
    tags(
        (name = "Referral Rewards API", description = "Donation totals, reward tiers and referral codes for the donor dashboard.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Helpers
//=========================================================================================

fn dashboard_for(state: &AppState, session: &Session) -> DashboardResponse {
    let summary = evaluator::summarize(session.total_donations, catalog::all());
    DashboardResponse::build(session, &summary, &state.config.public_origin)
}

/// Renders an amount the way the confirmation message shows it: whole
/// dollars without decimals, otherwise two decimal places.
fn display_amount(amount: Amount) -> String {
    if amount.fract() == 0.0 {
        format!("${:.0}", amount)
    } else {
        format!("${:.2}", amount)
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Where the landing page should send the user.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Redirect hint for the landing page", body = RedirectResponse)
    )
)]
pub async fn index_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let active = state
        .sessions
        .load()
        .await
        .map_err(engine_failure)?
        .is_authenticated();
    Ok(Json(RedirectResponse {
        redirect: active.then(|| "/dashboard".to_string()),
    }))
}

/// The full dashboard for the active session.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard state", body = DashboardResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    )
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Json<DashboardResponse> {
    Json(dashboard_for(&state, &session))
}

/// Record a donation received through another channel.
#[utoipa::path(
    post,
    path = "/donations",
    request_body = DonationSubmission,
    responses(
        (status = 200, description = "Donation recorded", body = DonationResponse),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 409, description = "A donation is already being recorded", body = ErrorResponse)
    )
)]
pub async fn donation_handler(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<DonationSubmission>,
) -> Result<impl IntoResponse, HandlerError> {
    let amount = match &submission.amount {
        AmountInput::Number(value) => ledger::record_donation(0.0, *value).map(|_| *value),
        AmountInput::Text(raw) => ledger::parse_amount(raw),
    }
    .map_err(|e| {
        warn!("Rejected donation: {}", e);
        engine_failure(e)
    })?;

    let Some(_in_flight) = state.donation_in_flight.try_begin() else {
        warn!("Donation already being recorded; rejecting duplicate submission");
        return Err(busy());
    };
    state.simulate_latency().await;

    let request = DonationRequest {
        amount,
        donor_name: submission.donor_name,
        payment_method: submission.payment_method.into(),
    };
    let (session, receipt) = {
        let _serial = state.mutation_lock.lock().await;
        state
            .sessions
            .record_donation(&request)
            .await
            .map_err(engine_failure)?
    };

    let message = format!(
        "{} donation from {} has been added.",
        display_amount(receipt.amount),
        receipt.donor_name
    );
    Ok(Json(DonationResponse {
        receipt: ReceiptDto::from(&receipt),
        message,
        dashboard: dashboard_for(&state, &session),
    }))
}

/// The raw referral code and its shareable link.
#[utoipa::path(
    get,
    path = "/referral",
    responses(
        (status = 200, description = "Current referral code", body = ReferralResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    )
)]
pub async fn referral_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Json<ReferralResponse> {
    let code = session.identity.referral_code;
    let link = referral::referral_link(&state.config.public_origin, &code);
    Json(ReferralResponse { code, link })
}

/// Replace the referral code with a newly generated one.
#[utoipa::path(
    post,
    path = "/referral/regenerate",
    responses(
        (status = 200, description = "New code generated", body = DashboardResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    )
)]
pub async fn regenerate_code_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let session = {
        let _serial = state.mutation_lock.lock().await;
        state
            .sessions
            .regenerate_code()
            .await
            .map_err(engine_failure)?
    };
    Ok(Json(dashboard_for(&state, &session)))
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct JoinQuery {
    /// Referral code of the inviting donor.
    #[serde(rename = "ref")]
    pub reference: Option<String>,
}

/// Landing content for an invitation link. Never fails on a bad code.
#[utoipa::path(
    get,
    path = "/join",
    params(JoinQuery),
    responses(
        (status = 200, description = "Invitation content", body = InviteResponse)
    )
)]
pub async fn join_handler(Query(query): Query<JoinQuery>) -> Json<InviteResponse> {
    let invite = referral::invite_from_query(query.reference.as_deref());
    let (referral_code, message) = match invite {
        Invite::Referred(code) => {
            info!("Invite opened with referral code {}", code);
            (
                Some(code),
                "Someone special thinks you'd be perfect for our referral program!".to_string(),
            )
        }
        Invite::Generic => (
            None,
            "Join our referral program and start unlocking rewards.".to_string(),
        ),
    };
    Json(InviteResponse {
        referral_code,
        headline: "You've Been Invited!".to_string(),
        message,
    })
}
