//! services/api/src/web/protocol.rs
//!
//! Defines the JSON messages exchanged between the dashboard UI and the API.
//! Field names are camelCase on the wire.

use axum::{http::StatusCode, Json};
use chrono::{DateTime, Utc};
use referral_rewards_core::{
    referral, DonationReceipt, EngineError, PaymentMethod, PortError, RewardSummary, Session,
    TierState,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client TO the Server
//=========================================================================================

/// Any password is accepted; only the email is used.
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// A donation amount as typed into the form, either a JSON number or a string.
#[derive(Deserialize, ToSchema, Debug)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

/// Wire mirror of the core `PaymentMethod`. The core crate stays free of
/// utoipa, so the schema derive lives here.
#[derive(Deserialize, Serialize, ToSchema, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethodDto {
    #[default]
    CreditCard,
    Bank,
    Mobile,
}

impl From<PaymentMethodDto> for PaymentMethod {
    fn from(dto: PaymentMethodDto) -> Self {
        match dto {
            PaymentMethodDto::CreditCard => PaymentMethod::CreditCard,
            PaymentMethodDto::Bank => PaymentMethod::Bank,
            PaymentMethodDto::Mobile => PaymentMethod::Mobile,
        }
    }
}

impl From<PaymentMethod> for PaymentMethodDto {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::CreditCard => PaymentMethodDto::CreditCard,
            PaymentMethod::Bank => PaymentMethodDto::Bank,
            PaymentMethod::Mobile => PaymentMethodDto::Mobile,
        }
    }
}

#[derive(Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DonationSubmission {
    pub amount: AmountInput,
    #[serde(default)]
    pub donor_name: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethodDto,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client
//=========================================================================================

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub name: String,
    pub email: String,
    pub referral_code: String,
    pub join_date: DateTime<Utc>,
    pub initials: String,
}

#[derive(Serialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TierDto {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub requirement: f64,
    pub accent: String,
    pub unlocked: bool,
}

impl From<&TierState> for TierDto {
    fn from(state: &TierState) -> Self {
        Self {
            id: state.tier.id,
            title: state.tier.title.to_string(),
            description: state.tier.description.to_string(),
            requirement: state.tier.requirement,
            accent: state.tier.accent.to_string(),
            unlocked: state.unlocked,
        }
    }
}

/// Everything the dashboard renders, derived fresh from the stored total.
#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub user: UserDto,
    pub total_donations: f64,
    pub referral_link: String,
    pub tiers: Vec<TierDto>,
    pub unlocked_count: usize,
    pub next_tier: Option<TierDto>,
    pub progress_fraction: f64,
    pub progress_percent: u32,
    pub remaining_to_next: f64,
    pub active_referrals: u64,
}

impl DashboardResponse {
    pub fn build(session: &Session, summary: &RewardSummary, origin: &str) -> Self {
        let identity = &session.identity;
        Self {
            user: UserDto {
                name: identity.name.clone(),
                email: identity.email.clone(),
                referral_code: identity.referral_code.clone(),
                join_date: identity.join_date,
                initials: identity.initials(),
            },
            total_donations: session.total_donations,
            referral_link: referral::referral_link(origin, &identity.referral_code),
            tiers: summary.tiers.iter().map(TierDto::from).collect(),
            unlocked_count: summary.unlocked_count,
            next_tier: summary.next_locked.as_ref().map(TierDto::from),
            progress_fraction: summary.progress_fraction,
            progress_percent: summary.progress_percent,
            remaining_to_next: summary.remaining_to_next,
            active_referrals: summary.active_referrals,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDto {
    pub id: Uuid,
    pub amount: f64,
    pub donor_name: String,
    pub payment_method: PaymentMethodDto,
    pub recorded_at: DateTime<Utc>,
    pub new_total: f64,
}

impl From<&DonationReceipt> for ReceiptDto {
    fn from(receipt: &DonationReceipt) -> Self {
        Self {
            id: receipt.id,
            amount: receipt.amount,
            donor_name: receipt.donor_name.clone(),
            payment_method: receipt.payment_method.into(),
            recorded_at: receipt.recorded_at,
            new_total: receipt.new_total,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct DonationResponse {
    pub receipt: ReceiptDto,
    pub message: String,
    pub dashboard: DashboardResponse,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ReferralResponse {
    pub code: String,
    pub link: String,
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    /// Present only when the `ref` parameter held a usable code.
    pub referral_code: Option<String>,
    pub headline: String,
    pub message: String,
}

/// Where the UI should navigate next, if anywhere.
#[derive(Serialize, ToSchema, Debug)]
pub struct RedirectResponse {
    pub redirect: Option<String>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

//=========================================================================================
// Error Mapping
//=========================================================================================

pub type HandlerError = (StatusCode, Json<ErrorResponse>);

pub fn reject(status: StatusCode, error: &str, message: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message: message.into(),
            redirect: None,
        }),
    )
}

/// The response for any request that needs a session while logged out.
pub fn session_absent() -> HandlerError {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "session_absent".to_string(),
            message: "Please log in to continue.".to_string(),
            redirect: Some("/login".to_string()),
        }),
    )
}

pub fn busy() -> HandlerError {
    reject(
        StatusCode::CONFLICT,
        "in_progress",
        "This action is already in progress.",
    )
}

/// Maps an engine failure onto the status code and message shown to the user.
pub fn engine_failure(e: EngineError) -> HandlerError {
    match e {
        EngineError::InvalidAmount(_) => reject(
            StatusCode::BAD_REQUEST,
            "invalid_amount",
            "Please enter a valid donation amount.",
        ),
        EngineError::PasswordMismatch => reject(
            StatusCode::BAD_REQUEST,
            "password_mismatch",
            "Passwords don't match",
        ),
        EngineError::InvalidName => {
            reject(StatusCode::BAD_REQUEST, "invalid_name", "Name is required.")
        }
        EngineError::Port(PortError::NotFound(_)) => session_absent(),
        other => {
            error!("Request failed: {:?}", other);
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "Something went wrong. Please try again.",
            )
        }
    }
}
