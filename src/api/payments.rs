//! Payment endpoints
//!
//! `POST /api/payments/initialize` creates a hosted-checkout transaction;
//! `POST /api/acceptance/payment` reconciles a returned reference and
//! confirms the acceptance fee.

use crate::database::application_repository::Application;
use crate::middleware::error::{app_error_response, get_request_id_from_headers, ErrorResponse};
use crate::services::acceptance_fee::{
    AcceptanceFeeService, InitializePaymentInput, VerifyPaymentInput,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct PaymentsState {
    pub service: Arc<AcceptanceFeeService>,
}

#[derive(Debug, Deserialize)]
pub struct InitializePaymentRequest {
    pub email: String,
    /// Amount in kobo; defaults to the configured acceptance fee
    pub amount: Option<i64>,
    pub metadata: Option<JsonValue>,
    pub callback_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InitializePaymentResponse {
    pub success: bool,
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub reference: String,
    #[serde(rename = "applicationNumber")]
    pub application_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: String,
    pub application: ApplicationSummary,
}

/// Fee-confirmation view of an application record
#[derive(Debug, Serialize)]
pub struct ApplicationSummary {
    pub id: Uuid,
    pub firstname: String,
    pub surname: String,
    pub email: String,
    #[serde(rename = "applicationNumber")]
    pub application_number: String,
    #[serde(rename = "acceptanceFeePaid")]
    pub acceptance_fee_paid: bool,
    #[serde(rename = "acceptancePaymentReference")]
    pub acceptance_payment_reference: Option<String>,
    #[serde(rename = "acceptancePaidAt")]
    pub acceptance_paid_at: Option<DateTime<Utc>>,
}

impl From<Application> for ApplicationSummary {
    fn from(application: Application) -> Self {
        Self {
            id: application.id,
            firstname: application.firstname,
            surname: application.surname,
            email: application.email,
            application_number: application.application_number,
            acceptance_fee_paid: application.acceptance_fee_paid,
            acceptance_payment_reference: application.acceptance_payment_reference,
            acceptance_paid_at: application.acceptance_paid_at,
        }
    }
}

pub async fn initialize_payment(
    State(state): State<PaymentsState>,
    headers: HeaderMap,
    Json(payload): Json<InitializePaymentRequest>,
) -> Result<Json<InitializePaymentResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request_id = get_request_id_from_headers(&headers);

    let initialized = state
        .service
        .initialize_payment(InitializePaymentInput {
            email: payload.email,
            amount_kobo: payload.amount,
            metadata: payload.metadata,
            callback_path: payload.callback_path,
        })
        .await
        .map_err(|e| app_error_response(e, request_id))?;

    Ok(Json(InitializePaymentResponse {
        success: true,
        authorization_url: initialized.authorization_url,
        access_code: initialized.access_code,
        reference: initialized.reference,
    }))
}

pub async fn verify_acceptance_payment(
    State(state): State<PaymentsState>,
    headers: HeaderMap,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request_id = get_request_id_from_headers(&headers);

    let verified = state
        .service
        .verify_payment(VerifyPaymentInput {
            reference: payload.reference,
            application_number: payload.application_number,
        })
        .await
        .map_err(|e| app_error_response(e, request_id))?;

    let message = if verified.already_confirmed {
        "Acceptance fee already confirmed for this payment reference".to_string()
    } else {
        "Acceptance fee payment confirmed".to_string()
    };

    Ok(Json(VerifyPaymentResponse {
        success: true,
        message,
        application: verified.application.into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_summary_serializes_with_camel_case_fields() {
        let summary = ApplicationSummary {
            id: Uuid::new_v4(),
            firstname: "Ada".to_string(),
            surname: "Obi".to_string(),
            email: "ada.obi@example.com".to_string(),
            application_number: "APP123".to_string(),
            acceptance_fee_paid: true,
            acceptance_payment_reference: Some("ace_txn_001".to_string()),
            acceptance_paid_at: Some(Utc::now()),
        };

        let json = serde_json::to_value(&summary).expect("serialization should succeed");
        assert_eq!(json["applicationNumber"], "APP123");
        assert_eq!(json["acceptanceFeePaid"], true);
        assert_eq!(json["acceptancePaymentReference"], "ace_txn_001");
        assert!(json.get("application_number").is_none());
    }

    #[test]
    fn verify_request_accepts_camel_case_application_number() {
        let payload = serde_json::json!({
            "reference": "ace_txn_001",
            "applicationNumber": "app123"
        });
        let parsed: VerifyPaymentRequest =
            serde_json::from_value(payload).expect("deserialization should succeed");
        assert_eq!(parsed.application_number.as_deref(), Some("app123"));
    }
}
