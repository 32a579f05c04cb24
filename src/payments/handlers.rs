use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{CreateIntentRequest, IntentResponse, PaymentsQuery, RecordPaymentRequest, RecordedPayment},
    repo::{self, Payment, PaymentFilter, RecordOutcome},
};
use crate::{
    auth::VerifiedUser,
    error::AppError,
    lifecycle::Role,
    state::AppState,
    users,
};

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/create-payment-intent", post(create_intent))
        .route("/payments", get(list_payments).post(record_payment))
}

#[instrument(skip(state))]
pub async fn create_intent(
    State(state): State<AppState>,
    Json(payload): Json<CreateIntentRequest>,
) -> Result<Json<IntentResponse>, AppError> {
    let (amount_cents, currency) = payload.validate()?;
    let intent = state
        .payments
        .create_intent(amount_cents, &currency)
        .await
        .map_err(|e| AppError::Upstream(e.into()))?;
    Ok(Json(IntentResponse {
        client_secret: intent.client_secret,
    }))
}

#[instrument(skip(state, user, payload))]
pub async fn record_payment(
    State(state): State<AppState>,
    user: VerifiedUser,
    Json(payload): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<RecordedPayment>), AppError> {
    let new = payload.into_new_payment(&user.email)?;
    match repo::record(&state.db, &new).await? {
        RecordOutcome::Recorded(payment) => {
            info!(payment_id = %payment.id, parcel_id = %payment.parcel_id, "payment recorded");
            Ok((
                StatusCode::CREATED,
                Json(RecordedPayment {
                    message: "payment recorded",
                    payment,
                }),
            ))
        }
        RecordOutcome::ParcelMissing => Err(AppError::NotFound("parcel")),
        RecordOutcome::AlreadyPaid => {
            warn!(parcel_id = %new.parcel_id, "parcel already paid");
            Err(AppError::Conflict("parcel already paid".into()))
        }
        RecordOutcome::DuplicateIntent => Err(AppError::Conflict(format!(
            "payment intent {} already recorded",
            new.payment_intent_id
        ))),
    }
}

/// Payment history. Non-admins only see their own payments.
#[instrument(skip(state, user))]
pub async fn list_payments(
    State(state): State<AppState>,
    user: VerifiedUser,
    Query(q): Query<PaymentsQuery>,
) -> Result<Json<Vec<Payment>>, AppError> {
    let requested = q
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    let role = users::repo::role_of(&state.db, &user.email)
        .await?
        .unwrap_or_default();

    let filter = match (role, requested) {
        (Role::Admin, requested) => PaymentFilter {
            payer_email: requested,
        },
        (_, Some(email)) if email != user.email => return Err(AppError::Forbidden),
        (_, _) => PaymentFilter {
            payer_email: Some(user.email.clone()),
        },
    };
    Ok(Json(repo::list(&state.db, &filter).await?))
}
