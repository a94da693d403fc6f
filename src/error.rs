//! Unified error handling for the admissions backend
//!
//! This module provides a single error system with HTTP status mapping,
//! user-facing messages, and structured error codes for client handling.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine-readable error codes for programmatic client handling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    // Domain errors (4xx)
    #[serde(rename = "APPLICATION_NOT_FOUND")]
    ApplicationNotFound,
    #[serde(rename = "TRANSACTION_NOT_FOUND")]
    TransactionNotFound,
    #[serde(rename = "TRANSACTION_NOT_SUCCESSFUL")]
    TransactionNotSuccessful,
    #[serde(rename = "AMOUNT_BELOW_FEE")]
    AmountBelowFee,
    #[serde(rename = "PURPOSE_MISMATCH")]
    PurposeMismatch,
    #[serde(rename = "APPLICATION_NUMBER_MISMATCH")]
    ApplicationNumberMismatch,
    #[serde(rename = "MISSING_APPLICATION_NUMBER")]
    MissingApplicationNumber,
    #[serde(rename = "FEE_ALREADY_CONFIRMED")]
    FeeAlreadyConfirmed,

    // Infrastructure errors (5xx)
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,
    #[serde(rename = "CONFIGURATION_ERROR")]
    ConfigurationError,

    // External errors (502, 503)
    #[serde(rename = "PAYMENT_GATEWAY_ERROR")]
    PaymentGatewayError,

    // Generic
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError,
}

/// Domain-specific business logic errors for the fee reconciliation flow
#[derive(Debug, Clone)]
pub enum DomainError {
    /// No application exists for the resolved application number
    ApplicationNotFound { application_number: String },
    /// The gateway has no record of the submitted reference
    TransactionNotFound { reference: String },
    /// Transaction exists but its status is not "success"
    TransactionNotSuccessful { reference: String, status: String },
    /// Transaction succeeded but paid less than the required fee
    AmountBelowFee { paid_kobo: i64, required_kobo: i64 },
    /// Transaction metadata names a different payment purpose
    PurposeMismatch { expected: String, found: String },
    /// Caller-asserted application number disagrees with the one embedded in metadata
    ApplicationNumberMismatch { supplied: String, embedded: String },
    /// Neither the caller nor the transaction metadata named an application
    MissingApplicationNumber,
    /// Fee already confirmed under a different payment reference
    FeeAlreadyConfirmed {
        application_number: String,
        stored_reference: String,
    },
}

/// Infrastructure-level errors (database, configuration)
#[derive(Debug, Clone)]
pub enum InfrastructureError {
    /// Database connection or query failure
    Database { message: String, is_retryable: bool },
    /// Missing or invalid configuration
    Configuration { message: String },
}

/// External service errors (payment gateway)
#[derive(Debug, Clone)]
pub enum ExternalError {
    /// Paystack unreachable, errored, or returned an unexpected response shape
    PaymentGateway {
        message: String,
        status_code: Option<u16>,
        is_retryable: bool,
    },
}

/// Input validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// Email does not match a basic email shape
    InvalidEmail { email: String },
    /// Required field missing or empty
    MissingField { field: String },
    /// Field value is malformed
    InvalidValue { field: String, reason: String },
}

/// Unified application error type
#[derive(Debug, Clone)]
pub struct AppError {
    pub kind: AppErrorKind,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AppErrorKind {
    Domain(DomainError),
    Infrastructure(InfrastructureError),
    External(ExternalError),
    Validation(ValidationError),
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        Self {
            kind,
            request_id: None,
        }
    }

    pub fn domain(err: DomainError) -> Self {
        Self::new(AppErrorKind::Domain(err))
    }

    pub fn validation(err: ValidationError) -> Self {
        Self::new(AppErrorKind::Validation(err))
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> u16 {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::ApplicationNotFound { .. } => 404,
                DomainError::TransactionNotFound { .. } => 404,
                DomainError::TransactionNotSuccessful { .. } => 400,
                DomainError::AmountBelowFee { .. } => 400,
                DomainError::PurposeMismatch { .. } => 400,
                DomainError::ApplicationNumberMismatch { .. } => 400,
                DomainError::MissingApplicationNumber => 400,
                DomainError::FeeAlreadyConfirmed { .. } => 409, // Conflict
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { .. } => 500,
                InfrastructureError::Configuration { .. } => 500,
            },
            AppErrorKind::External(err) => match err {
                // A gateway 4xx (e.g. rejected credential) is propagated as-is;
                // anything else surfaces as Bad Gateway.
                ExternalError::PaymentGateway { status_code, .. } => match status_code {
                    Some(code) if (400..500).contains(code) => *code,
                    _ => 502,
                },
            },
            AppErrorKind::Validation(_) => 400,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> ErrorCode {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::ApplicationNotFound { .. } => ErrorCode::ApplicationNotFound,
                DomainError::TransactionNotFound { .. } => ErrorCode::TransactionNotFound,
                DomainError::TransactionNotSuccessful { .. } => ErrorCode::TransactionNotSuccessful,
                DomainError::AmountBelowFee { .. } => ErrorCode::AmountBelowFee,
                DomainError::PurposeMismatch { .. } => ErrorCode::PurposeMismatch,
                DomainError::ApplicationNumberMismatch { .. } => {
                    ErrorCode::ApplicationNumberMismatch
                }
                DomainError::MissingApplicationNumber => ErrorCode::MissingApplicationNumber,
                DomainError::FeeAlreadyConfirmed { .. } => ErrorCode::FeeAlreadyConfirmed,
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { .. } => ErrorCode::DatabaseError,
                InfrastructureError::Configuration { .. } => ErrorCode::ConfigurationError,
            },
            AppErrorKind::External(_) => ErrorCode::PaymentGatewayError,
            AppErrorKind::Validation(_) => ErrorCode::ValidationError,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::ApplicationNotFound { application_number } => {
                    format!("No application found for '{}'", application_number)
                }
                DomainError::TransactionNotFound { reference } => {
                    format!("Transaction reference '{}' not found or invalid", reference)
                }
                DomainError::TransactionNotSuccessful { reference, status } => {
                    format!(
                        "Payment '{}' was not successful (gateway status: {})",
                        reference, status
                    )
                }
                DomainError::AmountBelowFee {
                    paid_kobo,
                    required_kobo,
                } => {
                    format!(
                        "Amount paid ({} kobo) is below the required acceptance fee ({} kobo)",
                        paid_kobo, required_kobo
                    )
                }
                DomainError::PurposeMismatch { expected, found } => {
                    format!(
                        "Transaction was paid for '{}', not '{}'",
                        found, expected
                    )
                }
                DomainError::ApplicationNumberMismatch { supplied, embedded } => {
                    format!(
                        "Supplied application number '{}' does not match the one on the transaction ('{}')",
                        supplied, embedded
                    )
                }
                DomainError::MissingApplicationNumber => {
                    "No application number was supplied or found on the transaction".to_string()
                }
                DomainError::FeeAlreadyConfirmed {
                    application_number, ..
                } => {
                    format!(
                        "Acceptance fee for application '{}' was already confirmed with a different payment reference. Please contact support",
                        application_number
                    )
                }
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { .. } => {
                    "Service temporarily unavailable. Please try again later".to_string()
                }
                InfrastructureError::Configuration { .. } => {
                    "Payment service is not configured. Please contact support".to_string()
                }
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentGateway {
                    message,
                    status_code,
                    is_retryable,
                } => match status_code {
                    Some(401) => "Payment gateway rejected the configured credential".to_string(),
                    Some(code) if (400..500).contains(code) => message.clone(),
                    _ if *is_retryable => {
                        "Payment gateway is temporarily unavailable. Please try again".to_string()
                    }
                    _ => "Payment verification failed. Please try again later".to_string(),
                },
            },
            AppErrorKind::Validation(err) => match err {
                ValidationError::InvalidEmail { email } => {
                    format!("'{}' is not a valid email address", email)
                }
                ValidationError::MissingField { field } => {
                    format!("Required field '{}' is missing", field)
                }
                ValidationError::InvalidValue { field, reason } => {
                    format!("Invalid value for '{}': {}", field, reason)
                }
            },
        }
    }

    /// Check if error is retryable by resubmitting the same request
    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            AppErrorKind::Domain(_) => false,
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { is_retryable, .. } => *is_retryable,
                InfrastructureError::Configuration { .. } => false,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentGateway { is_retryable, .. } => *is_retryable,
            },
            AppErrorKind::Validation(_) => false,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for AppError {}

/// Result type for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_error_mapping() {
        let error = AppError::domain(DomainError::FeeAlreadyConfirmed {
            application_number: "APP123".to_string(),
            stored_reference: "ref_1".to_string(),
        });

        assert_eq!(error.status_code(), 409);
        assert_eq!(error.error_code(), ErrorCode::FeeAlreadyConfirmed);
        assert!(error.user_message().contains("contact support"));
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_not_found_errors_map_to_404() {
        let app = AppError::domain(DomainError::ApplicationNotFound {
            application_number: "APP999".to_string(),
        });
        assert_eq!(app.status_code(), 404);

        let txn = AppError::domain(DomainError::TransactionNotFound {
            reference: "ref_x".to_string(),
        });
        assert_eq!(txn.status_code(), 404);
        assert_eq!(txn.error_code(), ErrorCode::TransactionNotFound);
    }

    #[test]
    fn test_underpayment_error() {
        let error = AppError::domain(DomainError::AmountBelowFee {
            paid_kobo: 7_000_000,
            required_kobo: 7_500_000,
        });

        assert_eq!(error.status_code(), 400);
        assert_eq!(error.error_code(), ErrorCode::AmountBelowFee);
        assert!(error.user_message().contains("7000000"));
    }

    #[test]
    fn test_gateway_status_propagation() {
        let unauthorized = AppError::new(AppErrorKind::External(ExternalError::PaymentGateway {
            message: "Invalid key".to_string(),
            status_code: Some(401),
            is_retryable: false,
        }));
        assert_eq!(unauthorized.status_code(), 401);
        assert!(unauthorized.user_message().contains("credential"));

        let unreachable = AppError::new(AppErrorKind::External(ExternalError::PaymentGateway {
            message: "connect timeout".to_string(),
            status_code: None,
            is_retryable: true,
        }));
        assert_eq!(unreachable.status_code(), 502);
        assert!(unreachable.is_retryable());
    }

    #[test]
    fn test_validation_error() {
        let error = AppError::validation(ValidationError::InvalidEmail {
            email: "not-an-email".to_string(),
        });

        assert_eq!(error.status_code(), 400);
        assert_eq!(error.error_code(), ErrorCode::ValidationError);
        assert!(!error.is_retryable());
    }
}
