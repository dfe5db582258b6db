use crate::domain::payment::{
    parse_timestamp, CreatePaymentRequest, ErrorEnvelope, ErrorPayload, PaymentAccepted,
};
use crate::error::{AcceptError, ValidationError};
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub async fn create_payment(
    State(state): State<AppState>,
    Json(req): Json<CreatePaymentRequest>,
) -> impl IntoResponse {
    match state.payment_service.accept_payment(req).await {
        Ok(request) => (
            StatusCode::ACCEPTED,
            Json(PaymentAccepted {
                correlation_id: request.correlation_id,
                status: "queued",
            }),
        )
            .into_response(),
        Err(AcceptError::Validation(e)) => {
            (StatusCode::BAD_REQUEST, Json(err("INVALID_PAYMENT", &e.to_string()))).into_response()
        }
        Err(AcceptError::Queue(e)) => {
            tracing::error!("failed to enqueue payment: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(err("QUEUE_UNAVAILABLE", "payment could not be queued")),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl SummaryQuery {
    /// Missing bounds are open-ended.
    pub fn range(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), ValidationError> {
        let bound = |raw: &Option<String>, open: DateTime<Utc>| match raw.as_deref() {
            Some(s) if !s.trim().is_empty() => parse_timestamp(s),
            _ => Ok(open),
        };
        Ok((
            bound(&self.from, DateTime::<Utc>::MIN_UTC)?,
            bound(&self.to, DateTime::<Utc>::MAX_UTC)?,
        ))
    }
}

pub async fn payments_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> impl IntoResponse {
    let (from, to) = match query.range() {
        Ok(range) => range,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(err("INVALID_RANGE", &e.to_string())))
                .into_response()
        }
    };

    match state.payment_service.payments_summary(from, to).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            tracing::error!("payments summary failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(err("SUMMARY_UNAVAILABLE", "payments summary is temporarily unavailable")),
            )
                .into_response()
        }
    }
}

fn err(code: &str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope {
        error: ErrorPayload {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        },
    }
}
