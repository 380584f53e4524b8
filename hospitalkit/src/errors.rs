use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum HospitalError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Failed to {operation} {entity}: {reason}")]
    Write {
        entity: &'static str,
        operation: &'static str,
        reason: String,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Row mapping error: {0}")]
    RowMapping(String),
}

impl HospitalError {
    pub fn write(entity: &'static str, operation: &'static str, err: impl std::fmt::Display) -> Self {
        HospitalError::Write {
            entity,
            operation,
            reason: err.to_string(),
        }
    }

    /// True for outcomes a caller should report as "no such record"
    /// rather than as a failed operation.
    pub fn is_not_found(&self) -> bool {
        matches!(self, HospitalError::NotFound { .. })
    }
}

impl From<scylla::transport::errors::QueryError> for HospitalError {
    fn from(err: scylla::transport::errors::QueryError) -> Self {
        HospitalError::Database(err.to_string())
    }
}

impl From<scylla::transport::errors::NewSessionError> for HospitalError {
    fn from(err: scylla::transport::errors::NewSessionError) -> Self {
        HospitalError::Connection(err.to_string())
    }
}

impl From<config::ConfigError> for HospitalError {
    fn from(err: config::ConfigError) -> Self {
        HospitalError::Config(err.to_string())
    }
}
