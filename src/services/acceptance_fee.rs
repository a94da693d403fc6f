//! Acceptance-fee payment flow
//!
//! Two collaborating operations: initializing a hosted-checkout transaction
//! for an applicant, and verifying/reconciling a completed transaction
//! against the internal application record. Verification is a strict
//! ordered pipeline: every step either proceeds or returns a terminal
//! rejection, and nothing is written on any rejection path.

use crate::database::application_repository::{Application, ApplicationStore, FeeConfirmation};
use crate::error::{AppError, AppResult, DomainError, ValidationError};
use crate::payments::gateway::PaymentGateway;
use crate::payments::types::{
    FeeFlow, InitializeTransaction, InitializedTransaction, TransactionStatus, CURRENCY,
    DEFAULT_ACCEPTANCE_FEE_KOBO, PAYMENT_CALLBACK_MARKER,
};
use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

/// Settings the fee flow needs beyond the gateway client itself
#[derive(Debug, Clone)]
pub struct AcceptanceFeeSettings {
    /// Portal origin used to build absolute callback URLs
    pub public_base_url: String,
    /// Required acceptance fee in kobo; a strict minimum at verification
    pub acceptance_fee_kobo: i64,
}

impl AcceptanceFeeSettings {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into(),
            acceptance_fee_kobo: DEFAULT_ACCEPTANCE_FEE_KOBO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InitializePaymentInput {
    pub email: String,
    /// Amount in kobo; defaults to the configured acceptance fee
    pub amount_kobo: Option<i64>,
    pub metadata: Option<JsonValue>,
    pub callback_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VerifyPaymentInput {
    pub reference: String,
    /// Caller-side cross-check only; never trusted over gateway metadata
    pub application_number: Option<String>,
}

/// Result of a successful verification
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub application: Application,
    /// True when this reference had already confirmed the fee (idempotent replay)
    pub already_confirmed: bool,
}

pub struct AcceptanceFeeService {
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<dyn ApplicationStore>,
    settings: AcceptanceFeeSettings,
}

impl AcceptanceFeeService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        store: Arc<dyn ApplicationStore>,
        settings: AcceptanceFeeSettings,
    ) -> Self {
        Self {
            gateway,
            store,
            settings,
        }
    }

    /// Create a gateway transaction and return the hosted-checkout URL.
    /// No local state is touched; everything lives in the gateway until
    /// verification.
    pub async fn initialize_payment(
        &self,
        input: InitializePaymentInput,
    ) -> AppResult<InitializedTransaction> {
        let email = input.email.trim().to_string();
        if !is_valid_email(&email) {
            return Err(AppError::validation(ValidationError::InvalidEmail {
                email,
            }));
        }

        let flow = FeeFlow::from_callback_path(input.callback_path.as_deref());
        let callback_url = self.build_callback_url(&flow, input.callback_path.as_deref());

        let metadata = input
            .metadata
            .unwrap_or_else(|| default_metadata(&flow));

        let amount = input
            .amount_kobo
            .unwrap_or(self.settings.acceptance_fee_kobo);

        info!(
            email = %email,
            amount_kobo = amount,
            flow = ?flow,
            "initializing fee payment"
        );

        let initialized = self
            .gateway
            .initialize_transaction(InitializeTransaction {
                email,
                amount,
                currency: CURRENCY.to_string(),
                callback_url,
                metadata,
            })
            .await?;

        Ok(initialized)
    }

    /// Reconcile a checkout reference against the application record and
    /// durably confirm the fee, exactly once per distinct successful
    /// transaction.
    pub async fn verify_payment(&self, input: VerifyPaymentInput) -> AppResult<VerifiedPayment> {
        let reference = input.reference.trim().to_string();
        if reference.is_empty() {
            return Err(AppError::validation(ValidationError::MissingField {
                field: "reference".to_string(),
            }));
        }

        let supplied_number = input
            .application_number
            .as_deref()
            .map(|n| n.trim().to_uppercase())
            .filter(|n| !n.is_empty());

        // Gateway truth first: status, amount, and embedded metadata all come
        // from the transaction record, never from the caller.
        let transaction = self.gateway.verify_transaction(&reference).await?;

        if transaction.status != TransactionStatus::Success {
            warn!(
                reference = %reference,
                status = transaction.status.as_str(),
                "rejecting non-successful transaction"
            );
            return Err(AppError::domain(DomainError::TransactionNotSuccessful {
                reference,
                status: transaction.status.as_str().to_string(),
            }));
        }

        if transaction.amount < self.settings.acceptance_fee_kobo {
            return Err(AppError::domain(DomainError::AmountBelowFee {
                paid_kobo: transaction.amount,
                required_kobo: self.settings.acceptance_fee_kobo,
            }));
        }

        // A transaction paid for some other fee type must not settle this one
        let expected_purpose = FeeFlow::Acceptance.purpose_label();
        if let Some(found) = transaction.metadata.purpose() {
            if found != expected_purpose {
                return Err(AppError::domain(DomainError::PurposeMismatch {
                    expected: expected_purpose.to_string(),
                    found,
                }));
            }
        }

        let embedded_number = transaction.metadata.application_number();

        if let (Some(supplied), Some(embedded)) = (&supplied_number, &embedded_number) {
            if supplied != embedded {
                warn!(
                    reference = %reference,
                    supplied = %supplied,
                    embedded = %embedded,
                    "application number mismatch between caller and transaction metadata"
                );
                return Err(AppError::domain(DomainError::ApplicationNumberMismatch {
                    supplied: supplied.clone(),
                    embedded: embedded.clone(),
                }));
            }
        }

        let application_number = supplied_number
            .or(embedded_number)
            .ok_or_else(|| AppError::domain(DomainError::MissingApplicationNumber))?;

        let paid_at = transaction.effective_paid_at();

        match self
            .store
            .confirm_acceptance_fee(&application_number, &reference, paid_at)
            .await
            .map_err(AppError::from)?
        {
            FeeConfirmation::Confirmed(application) => {
                info!(
                    application_number = %application_number,
                    reference = %reference,
                    "acceptance fee confirmed"
                );
                Ok(VerifiedPayment {
                    application,
                    already_confirmed: false,
                })
            }
            FeeConfirmation::AlreadyConfirmed(application) => {
                info!(
                    application_number = %application_number,
                    reference = %reference,
                    "acceptance fee replay; already confirmed with this reference"
                );
                Ok(VerifiedPayment {
                    application,
                    already_confirmed: true,
                })
            }
            FeeConfirmation::Conflict(application) => {
                warn!(
                    application_number = %application_number,
                    incoming_reference = %reference,
                    stored_reference = application.acceptance_payment_reference.as_deref().unwrap_or(""),
                    "refusing to override already-settled fee"
                );
                Err(AppError::domain(DomainError::FeeAlreadyConfirmed {
                    application_number,
                    stored_reference: application
                        .acceptance_payment_reference
                        .unwrap_or_default(),
                }))
            }
            FeeConfirmation::NotFound => Err(AppError::domain(DomainError::ApplicationNotFound {
                application_number,
            })),
        }
    }

    fn build_callback_url(&self, flow: &FeeFlow, callback_path: Option<&str>) -> String {
        build_callback_url(&self.settings.public_base_url, flow, callback_path)
    }
}

/// Absolute checkout callback URL: portal origin, flow path, and the
/// return marker appended with whichever separator the path still needs.
fn build_callback_url(base: &str, flow: &FeeFlow, callback_path: Option<&str>) -> String {
    let base = base.trim_end_matches('/');
    let path = callback_path.unwrap_or_else(|| flow.default_callback_path());
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{}{}{}{}", base, path, separator, PAYMENT_CALLBACK_MARKER)
}

/// Default metadata written when the caller supplies none: the purpose label
/// as a direct field plus a checkout-visible custom field.
fn default_metadata(flow: &FeeFlow) -> JsonValue {
    serde_json::json!({
        "purpose": flow.purpose_label(),
        "custom_fields": [
            {
                "display_name": "Payment Purpose",
                "variable_name": "payment_purpose",
                "value": flow.purpose_label(),
            }
        ]
    })
}

fn is_valid_email(email: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
    });
    re.is_match(email)
}
