use crate::config::PaystackConfig;
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::gateway::PaymentGateway;
use crate::payments::http::GatewayHttpClient;
use crate::payments::metadata::TransactionMetadata;
use crate::payments::types::{
    GatewayTransaction, InitializeTransaction, InitializedTransaction, TransactionStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{info, warn};

pub struct PaystackGateway {
    config: PaystackConfig,
    http: GatewayHttpClient,
}

impl PaystackGateway {
    pub fn new(config: PaystackConfig) -> PaymentResult<Self> {
        let http = GatewayHttpClient::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self { config, http })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// The credential is validated at startup, but a deployment can still
    /// reach here with an empty or malformed key (e.g. overridden at
    /// runtime). Treat that as fatal before any outbound call.
    fn ensure_credential(&self) -> PaymentResult<&str> {
        let key = self.config.secret_key.trim();
        if key.is_empty() {
            return Err(PaymentError::ConfigurationError {
                message: "Paystack secret key is not configured".to_string(),
            });
        }
        if !key.starts_with("sk_test_") && !key.starts_with("sk_live_") {
            return Err(PaymentError::ConfigurationError {
                message: "Paystack secret key is malformed".to_string(),
            });
        }
        Ok(key)
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn initialize_transaction(
        &self,
        request: InitializeTransaction,
    ) -> PaymentResult<InitializedTransaction> {
        request.validate()?;
        let secret_key = self.ensure_credential()?;

        let payload = serde_json::json!({
            "email": request.email,
            "amount": request.amount,
            "currency": request.currency,
            "callback_url": request.callback_url,
            "redirect_url": request.callback_url,
            "metadata": request.metadata,
        });

        let raw: PaystackEnvelope<PaystackInitializeData> = self
            .http
            .request_json(
                reqwest::Method::POST,
                &self.endpoint("/transaction/initialize"),
                secret_key,
                Some(&payload),
            )
            .await?;

        if !raw.status {
            return Err(PaymentError::GatewayError {
                message: raw.message,
                status_code: None,
                retryable: false,
            });
        }

        let data = raw.data.ok_or_else(|| PaymentError::UnexpectedResponse {
            message: "initialization succeeded but response carried no data".to_string(),
        })?;

        // The call can succeed at the HTTP level yet omit the checkout URL;
        // without it the client has nowhere to go.
        let authorization_url =
            data.authorization_url
                .ok_or_else(|| PaymentError::UnexpectedResponse {
                    message: "initialization response missing authorization_url".to_string(),
                })?;

        let reference = data.reference.unwrap_or_default();
        info!(reference = %reference, "paystack transaction initialized");

        Ok(InitializedTransaction {
            authorization_url,
            access_code: data.access_code.unwrap_or_default(),
            reference,
        })
    }

    async fn verify_transaction(&self, reference: &str) -> PaymentResult<GatewayTransaction> {
        let secret_key = self.ensure_credential()?;

        let result: PaymentResult<PaystackEnvelope<PaystackVerifyData>> = self
            .http
            .request_json(
                reqwest::Method::GET,
                &self.endpoint(&format!("/transaction/verify/{}", reference)),
                secret_key,
                None,
            )
            .await;

        let raw = match result {
            Ok(raw) => raw,
            // Paystack answers 404 for a reference it has never seen
            Err(PaymentError::GatewayError {
                status_code: Some(404),
                ..
            }) => {
                return Err(PaymentError::ReferenceNotFound {
                    reference: reference.to_string(),
                })
            }
            Err(e) => return Err(e),
        };

        if !raw.status {
            warn!(reference = %reference, message = %raw.message, "paystack reported reference as invalid");
            return Err(PaymentError::ReferenceNotFound {
                reference: reference.to_string(),
            });
        }

        let data = raw.data.ok_or_else(|| PaymentError::UnexpectedResponse {
            message: "verification succeeded but response carried no data".to_string(),
        })?;

        Ok(GatewayTransaction {
            reference: data.reference.unwrap_or_else(|| reference.to_string()),
            amount: data.amount,
            currency: data.currency,
            status: TransactionStatus::from_gateway(&data.status),
            paid_at: data.paid_at.as_deref().and_then(parse_gateway_timestamp),
            created_at: data.created_at.as_deref().and_then(parse_gateway_timestamp),
            metadata: TransactionMetadata::new(data.metadata.unwrap_or(JsonValue::Null)),
        })
    }
}

fn parse_gateway_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Deserialize)]
struct PaystackEnvelope<T> {
    status: bool,
    message: String,
    #[serde(default)]
    data: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
struct PaystackInitializeData {
    #[serde(default)]
    authorization_url: Option<String>,
    #[serde(default)]
    access_code: Option<String>,
    #[serde(default)]
    reference: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PaystackVerifyData {
    #[serde(default)]
    reference: Option<String>,
    amount: i64,
    currency: String,
    status: String,
    #[serde(default)]
    paid_at: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    metadata: Option<JsonValue>,
}
