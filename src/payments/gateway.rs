use crate::payments::error::PaymentResult;
use crate::payments::types::{GatewayTransaction, InitializeTransaction, InitializedTransaction};
use async_trait::async_trait;

/// Seam between the reconciliation logic and the payment gateway.
///
/// The service layer only ever creates transactions and fetches their
/// authoritative records; everything else (checkout, settlement) happens on
/// the gateway side between these two calls.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize_transaction(
        &self,
        request: InitializeTransaction,
    ) -> PaymentResult<InitializedTransaction>;

    async fn verify_transaction(&self, reference: &str) -> PaymentResult<GatewayTransaction>;
}
