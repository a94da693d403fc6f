use crate::database::error::DatabaseError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Application entity (fee-relevant subset of the admissions record)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub firstname: String,
    pub surname: String,
    pub email: String,
    pub application_number: String,
    pub acceptance_fee_paid: bool,
    pub acceptance_payment_reference: Option<String>,
    pub acceptance_paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of a conditional fee confirmation attempt
#[derive(Debug, Clone)]
pub enum FeeConfirmation {
    /// The fee transitioned from unpaid to paid in this call
    Confirmed(Application),
    /// The fee was already confirmed with this same reference; nothing was written
    AlreadyConfirmed(Application),
    /// The fee is already confirmed under a different reference; nothing was written
    Conflict(Application),
    /// No application exists for this application number
    NotFound,
}

/// Store seam for application records.
///
/// Implemented by [`ApplicationRepository`] over Postgres and by in-memory
/// fakes in tests.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn find_by_application_number(
        &self,
        application_number: &str,
    ) -> Result<Option<Application>, DatabaseError>;

    /// Confirm the acceptance fee for one application, exactly once per
    /// distinct reference.
    ///
    /// The write must be atomic-conditional: it may only land while the fee
    /// is still unpaid, so two racing verifications can never each attach a
    /// different reference.
    async fn confirm_acceptance_fee(
        &self,
        application_number: &str,
        reference: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<FeeConfirmation, DatabaseError>;
}

const APPLICATION_COLUMNS: &str = "id, firstname, surname, email, application_number, \
     acceptance_fee_paid, acceptance_payment_reference, acceptance_paid_at, \
     created_at, updated_at";

/// Postgres-backed application store
pub struct ApplicationRepository {
    pool: PgPool,
}

impl ApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationStore for ApplicationRepository {
    async fn find_by_application_number(
        &self,
        application_number: &str,
    ) -> Result<Option<Application>, DatabaseError> {
        sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE application_number = $1",
            APPLICATION_COLUMNS
        ))
        .bind(application_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn confirm_acceptance_fee(
        &self,
        application_number: &str,
        reference: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<FeeConfirmation, DatabaseError> {
        // Single conditional UPDATE: the row transitions only while the fee
        // is still unpaid. A replay or conflicting reference matches zero
        // rows and is classified by the follow-up read, which never writes.
        let updated = sqlx::query_as::<_, Application>(&format!(
            "UPDATE applications \
             SET acceptance_fee_paid = TRUE, \
                 acceptance_payment_reference = $2, \
                 acceptance_paid_at = $3, \
                 updated_at = NOW() \
             WHERE application_number = $1 AND acceptance_fee_paid = FALSE \
             RETURNING {}",
            APPLICATION_COLUMNS
        ))
        .bind(application_number)
        .bind(reference)
        .bind(paid_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        if let Some(application) = updated {
            return Ok(FeeConfirmation::Confirmed(application));
        }

        match self.find_by_application_number(application_number).await? {
            None => Ok(FeeConfirmation::NotFound),
            Some(application)
                if application.acceptance_payment_reference.as_deref() == Some(reference) =>
            {
                Ok(FeeConfirmation::AlreadyConfirmed(application))
            }
            Some(application) => Ok(FeeConfirmation::Conflict(application)),
        }
    }
}
