//! Database error types
//!
//! This module classifies SQLx failures by PostgreSQL error code so the
//! adapter can hand the domain a structural `PortError` instead of raw
//! driver text.

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// The statement names a table, column or key that does not exist
    #[error("Undefined relation: {0}")]
    UndefinedRelation(String),

    /// Row-level security or grants rejected the statement
    #[error("Insufficient privilege: {0}")]
    InsufficientPrivilege(String),

    /// Integrity constraint violation (SQLSTATE class 23)
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// The statement was cancelled by `statement_timeout`
    #[error("Statement timed out: {0}")]
    StatementTimeout(String),

    /// A column could not be decoded into its Rust type
    #[error("Decode error: {0}")]
    DecodeFailed(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    /// Creates a not found error for a specific entity type and identifier
    ///
    /// # Example
    ///
    /// ```rust
    /// use infra_db::DatabaseError;
    ///
    /// let error = DatabaseError::not_found("CaseFile", "CASE-202");
    /// assert!(error.to_string().contains("CaseFile"));
    /// ```
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} with id '{}' not found", entity, id))
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, DatabaseError::ConstraintViolation(_))
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }

    /// Converts into the port taxonomy, naming the table or relation read
    pub fn into_port_error(self, resource: &str) -> PortError {
        match self {
            DatabaseError::NotFound(message) => PortError::NotFound {
                entity_type: resource.to_string(),
                id: message,
            },
            DatabaseError::UndefinedRelation(message) => {
                PortError::relationship_unavailable(resource, message)
            }
            DatabaseError::InsufficientPrivilege(message) => {
                PortError::permission_denied(resource, message)
            }
            DatabaseError::StatementTimeout(_) => PortError::Timeout {
                operation: resource.to_string(),
                duration_ms: 0,
            },
            DatabaseError::ConnectionFailed(message) => PortError::connection(message),
            DatabaseError::PoolExhausted => PortError::connection("connection pool exhausted"),
            DatabaseError::DecodeFailed(message) => PortError::Transformation { message },
            DatabaseError::ConstraintViolation(message) | DatabaseError::QueryFailed(message) => {
                PortError::query(message)
            }
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        DatabaseError::from(&error)
    }
}

/// Maps SQLx errors onto DatabaseError variants by PostgreSQL error code
///
/// See <https://www.postgresql.org/docs/current/errcodes-appendix.html>
impl From<&sqlx::Error> for DatabaseError {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                DatabaseError::ConnectionFailed(error.to_string())
            }
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::Decode(_) => DatabaseError::DecodeFailed(error.to_string()),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.code().as_deref() {
                    // undefined_table, undefined_column, invalid_foreign_key
                    Some("42P01") | Some("42703") | Some("42830") => {
                        DatabaseError::UndefinedRelation(message)
                    }
                    Some("42501") => DatabaseError::InsufficientPrivilege(message),
                    Some("57014") => DatabaseError::StatementTimeout(message),
                    Some(code) if code.starts_with("23") => {
                        DatabaseError::ConstraintViolation(message)
                    }
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}
