use thiserror::Error;

pub type PaymentResult<T> = Result<T, PaymentError>;

#[derive(Debug, Clone, Error)]
pub enum PaymentError {
    #[error("Validation error: {message}")]
    ValidationError {
        message: String,
        field: Option<String>,
    },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Transaction reference not found: {reference}")]
    ReferenceNotFound { reference: String },

    #[error("Gateway error: {message}")]
    GatewayError {
        message: String,
        status_code: Option<u16>,
        retryable: bool,
    },

    #[error("Unexpected gateway response: {message}")]
    UnexpectedResponse { message: String },
}

impl PaymentError {
    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentError::ValidationError { .. } => false,
            PaymentError::ConfigurationError { .. } => false,
            PaymentError::NetworkError { .. } => true,
            PaymentError::ReferenceNotFound { .. } => false,
            PaymentError::GatewayError { retryable, .. } => *retryable,
            // The HTTP call succeeded but the body was not what Paystack
            // documents; resubmitting the same reference is safe.
            PaymentError::UnexpectedResponse { .. } => true,
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            PaymentError::ValidationError { .. } => 400,
            PaymentError::ConfigurationError { .. } => 500,
            PaymentError::NetworkError { .. } => 503,
            PaymentError::ReferenceNotFound { .. } => 404,
            // Gateway 4xx codes are propagated to the caller as-is
            PaymentError::GatewayError { status_code, .. } => match status_code {
                Some(code) if (400..500).contains(code) => *code,
                _ => 502,
            },
            PaymentError::UnexpectedResponse { .. } => 502,
        }
    }
}

impl From<PaymentError> for crate::error::AppError {
    fn from(err: PaymentError) -> Self {
        use crate::error::{
            AppError, AppErrorKind, DomainError, ExternalError, InfrastructureError,
            ValidationError,
        };

        let kind = match err {
            PaymentError::ValidationError { message, field } => {
                AppErrorKind::Validation(ValidationError::InvalidValue {
                    field: field.unwrap_or_else(|| "request".to_string()),
                    reason: message,
                })
            }
            PaymentError::ConfigurationError { message } => {
                AppErrorKind::Infrastructure(InfrastructureError::Configuration { message })
            }
            PaymentError::NetworkError { message } => {
                AppErrorKind::External(ExternalError::PaymentGateway {
                    message,
                    status_code: None,
                    is_retryable: true,
                })
            }
            PaymentError::ReferenceNotFound { reference } => {
                AppErrorKind::Domain(DomainError::TransactionNotFound { reference })
            }
            PaymentError::GatewayError {
                message,
                status_code,
                retryable,
            } => AppErrorKind::External(ExternalError::PaymentGateway {
                message,
                status_code,
                is_retryable: retryable,
            }),
            PaymentError::UnexpectedResponse { message } => {
                AppErrorKind::External(ExternalError::PaymentGateway {
                    message,
                    status_code: None,
                    is_retryable: true,
                })
            }
        };

        AppError::new(kind)
    }
}
