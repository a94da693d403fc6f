use crate::payments::error::{PaymentError, PaymentResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Thin JSON client for gateway calls.
///
/// Both flows here are single synchronous request/response exchanges; any
/// retry is the caller's resubmission (safe because verification is
/// idempotent), so no retry or backoff is performed here.
#[derive(Clone)]
pub struct GatewayHttpClient {
    client: Client,
    timeout: Duration,
}

impl GatewayHttpClient {
    pub fn new(timeout: Duration) -> PaymentResult<Self> {
        let client =
            Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| PaymentError::NetworkError {
                    message: format!("failed to initialize HTTP client: {}", e),
                })?;

        Ok(Self { client, timeout })
    }

    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: &str,
        bearer_token: &str,
        body: Option<&JsonValue>,
    ) -> PaymentResult<T> {
        let mut request = self
            .client
            .request(method, url)
            .timeout(self.timeout)
            .bearer_auth(bearer_token);

        if let Some(payload) = body {
            request = request.json(payload);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError {
                message: format!("gateway request failed: {}", e),
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if status.is_success() {
            return serde_json::from_str::<T>(&text).map_err(|e| {
                PaymentError::UnexpectedResponse {
                    message: format!("invalid gateway JSON response: {}", e),
                }
            });
        }

        Err(PaymentError::GatewayError {
            message: extract_gateway_message(&text)
                .unwrap_or_else(|| format!("HTTP {}: {}", status, text)),
            status_code: Some(status.as_u16()),
            retryable: status.is_server_error(),
        })
    }
}

/// Pull the human-readable `message` out of a Paystack error body, if the
/// body is the usual JSON envelope.
fn extract_gateway_message(body: &str) -> Option<String> {
    serde_json::from_str::<JsonValue>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_message_extracted_from_envelope() {
        let body = r#"{"status":false,"message":"Invalid key"}"#;
        assert_eq!(
            extract_gateway_message(body).as_deref(),
            Some("Invalid key")
        );
    }

    #[test]
    fn gateway_message_none_for_non_json_body() {
        assert_eq!(extract_gateway_message("<html>Bad Gateway</html>"), None);
        assert_eq!(extract_gateway_message(r#"{"status":false}"#), None);
    }
}
