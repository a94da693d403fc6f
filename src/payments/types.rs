use crate::payments::error::PaymentError;
use crate::payments::metadata::TransactionMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Default acceptance fee in kobo (minor NGN unit): ₦75,000.
pub const DEFAULT_ACCEPTANCE_FEE_KOBO: i64 = 7_500_000;

/// All checkout transactions are denominated in naira.
pub const CURRENCY: &str = "NGN";

/// Query marker appended to callback URLs so the portal can recognize a
/// returning checkout redirect.
pub const PAYMENT_CALLBACK_MARKER: &str = "payment=callback";

/// Which application flow a fee payment belongs to.
///
/// The flow is selected by the callback path the client asked for and
/// determines both the purpose label embedded in transaction metadata and
/// the default redirect target after checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeFlow {
    Acceptance,
    SkillsTraining,
}

impl FeeFlow {
    pub fn from_callback_path(callback_path: Option<&str>) -> Self {
        match callback_path {
            Some(path) if path.contains("skills") => FeeFlow::SkillsTraining,
            _ => FeeFlow::Acceptance,
        }
    }

    /// Human-readable purpose label written into transaction metadata at
    /// initialization and checked back at verification.
    pub fn purpose_label(&self) -> &'static str {
        match self {
            FeeFlow::Acceptance => "Acceptance Fee",
            FeeFlow::SkillsTraining => "Skills Training Fee",
        }
    }

    pub fn default_callback_path(&self) -> &'static str {
        match self {
            FeeFlow::Acceptance => "/application/payment/callback",
            FeeFlow::SkillsTraining => "/skills/payment/callback",
        }
    }
}

/// Terminal and in-flight states Paystack reports for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Success,
    Pending,
    Failed,
    Abandoned,
    Reversed,
    Unknown,
}

impl TransactionStatus {
    pub fn from_gateway(status: &str) -> Self {
        match status {
            "success" => TransactionStatus::Success,
            "pending" => TransactionStatus::Pending,
            "failed" => TransactionStatus::Failed,
            "abandoned" => TransactionStatus::Abandoned,
            "reversed" => TransactionStatus::Reversed,
            _ => TransactionStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "success",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Abandoned => "abandoned",
            TransactionStatus::Reversed => "reversed",
            TransactionStatus::Unknown => "unknown",
        }
    }
}

/// Request body sent to the gateway's transaction-initialization endpoint
#[derive(Debug, Clone, Serialize)]
pub struct InitializeTransaction {
    pub email: String,
    /// Amount in kobo
    pub amount: i64,
    pub currency: String,
    pub callback_url: String,
    pub metadata: JsonValue,
}

impl InitializeTransaction {
    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.email.trim().is_empty() {
            return Err(PaymentError::ValidationError {
                message: "email is required".to_string(),
                field: Some("email".to_string()),
            });
        }
        if self.amount <= 0 {
            return Err(PaymentError::ValidationError {
                message: "amount must be greater than zero".to_string(),
                field: Some("amount".to_string()),
            });
        }
        Ok(())
    }
}

/// Hosted-checkout handle returned by a successful initialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// The gateway's authoritative record of one transaction, fetched read-only
/// at verification time.
#[derive(Debug, Clone)]
pub struct GatewayTransaction {
    pub reference: String,
    /// Amount in kobo
    pub amount: i64,
    pub currency: String,
    pub status: TransactionStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub metadata: TransactionMetadata,
}

impl GatewayTransaction {
    /// Best-available payment timestamp: gateway-reported settlement time,
    /// then transaction creation time, then "now".
    pub fn effective_paid_at(&self) -> DateTime<Utc> {
        self.paid_at
            .or(self.created_at)
            .unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_flow_selection_from_callback_path() {
        assert_eq!(
            FeeFlow::from_callback_path(Some("/skills/payment/callback")),
            FeeFlow::SkillsTraining
        );
        assert_eq!(
            FeeFlow::from_callback_path(Some("/application/payment/callback")),
            FeeFlow::Acceptance
        );
        assert_eq!(FeeFlow::from_callback_path(None), FeeFlow::Acceptance);
    }

    #[test]
    fn transaction_status_from_gateway_strings() {
        assert_eq!(
            TransactionStatus::from_gateway("success"),
            TransactionStatus::Success
        );
        assert_eq!(
            TransactionStatus::from_gateway("abandoned"),
            TransactionStatus::Abandoned
        );
        assert_eq!(
            TransactionStatus::from_gateway("ongoing"),
            TransactionStatus::Unknown
        );
    }

    #[test]
    fn initialize_transaction_validation() {
        let mut request = InitializeTransaction {
            email: "applicant@example.com".to_string(),
            amount: DEFAULT_ACCEPTANCE_FEE_KOBO,
            currency: CURRENCY.to_string(),
            callback_url: "https://portal.example.edu/application/payment/callback".to_string(),
            metadata: serde_json::json!({}),
        };
        assert!(request.validate().is_ok());

        request.amount = 0;
        assert!(request.validate().is_err());
    }

    #[test]
    fn effective_paid_at_falls_back_in_order() {
        let paid = Utc::now() - chrono::Duration::hours(2);
        let created = Utc::now() - chrono::Duration::hours(3);

        let mut txn = GatewayTransaction {
            reference: "ref_1".to_string(),
            amount: DEFAULT_ACCEPTANCE_FEE_KOBO,
            currency: CURRENCY.to_string(),
            status: TransactionStatus::Success,
            paid_at: Some(paid),
            created_at: Some(created),
            metadata: TransactionMetadata::empty(),
        };
        assert_eq!(txn.effective_paid_at(), paid);

        txn.paid_at = None;
        assert_eq!(txn.effective_paid_at(), created);

        txn.created_at = None;
        // Falls back to now; just check it is recent
        assert!(Utc::now() - txn.effective_paid_at() < chrono::Duration::seconds(5));
    }
}
