use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database connection error: {message}")]
    Connection { message: String },

    #[error("query failed: {message}")]
    Query { message: String },

    #[error("row not found")]
    NotFound,
}

impl DatabaseError {
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::Connection {
                    message: err.to_string(),
                }
            }
            other => DatabaseError::Query {
                message: other.to_string(),
            },
        }
    }

    /// Connection-level failures may resolve on their own; query failures
    /// will not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DatabaseError::Connection { .. })
    }
}

impl From<DatabaseError> for crate::error::AppError {
    fn from(err: DatabaseError) -> Self {
        use crate::error::{AppError, AppErrorKind, InfrastructureError};

        let is_retryable = err.is_retryable();
        AppError::new(AppErrorKind::Infrastructure(InfrastructureError::Database {
            message: err.to_string(),
            is_retryable,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_errors_are_retryable() {
        assert!(DatabaseError::Connection {
            message: "pool timed out".to_string()
        }
        .is_retryable());
        assert!(!DatabaseError::Query {
            message: "syntax error".to_string()
        }
        .is_retryable());
        assert!(!DatabaseError::NotFound.is_retryable());
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            DatabaseError::from_sqlx(sqlx::Error::RowNotFound),
            DatabaseError::NotFound
        ));
    }
}
