//! # API Error Type
//!
//! The structured failure every command prints.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Error Flow in Obrador                              │
//! │                                                                         │
//! │  Command handler                                                        │
//! │  Result<T, ApiError>                                                    │
//! │         │                                                               │
//! │         ├── ServiceError::Domain(CoreError) ──► specific code + reason │
//! │         │       InsufficientStock ────────────► reasons: [one per row] │
//! │         │                                                               │
//! │         ├── ServiceError::Db(DbError) ────────► DATABASE_ERROR         │
//! │         │       detail logged, generic reason returned                 │
//! │         │                                                               │
//! │         └── config / io / json ───────────────► INVALID_INPUT, ...     │
//! │                                                                         │
//! │  stdout:  {"code":"INSUFFICIENT_STOCK","reasons":["Insufficient ..."]} │
//! │  exit status 1                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::error;

use crate::config::ConfigError;
use obrador_core::CoreError;
use obrador_db::{DbError, ServiceError};

/// Failure returned by a command.
///
/// ## Serialization
/// ```json
/// { "code": "RULE_VIOLATION", "reason": "SITE_SHIPMENT requires a destination crew" }
/// { "code": "INSUFFICIENT_STOCK", "reasons": ["Insufficient stock for CABLE-10: ..."] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed request or arguments
    ValidationError,

    /// Movement shape not allowed for its type
    RuleViolation,

    /// One or more bulk shortfalls
    InsufficientStock,

    /// Serial unit inconsistency
    SerialError,

    /// Referenced entity does not exist
    NotFound,

    /// Customer outside the actor's scope
    Forbidden,

    /// Request conflicts with current state
    Conflict,

    /// Unexpected database failure
    DatabaseError,

    /// Configuration could not be loaded
    ConfigError,

    /// Anything else
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, reason: impl Into<String>) -> Self {
        ApiError {
            code,
            reason: Some(reason.into()),
            reasons: Vec::new(),
        }
    }

    /// One entry per reason, with no single `reason`.
    pub fn with_reasons(code: ErrorCode, reasons: Vec<String>) -> Self {
        ApiError {
            code,
            reason: None,
            reasons,
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, reason)
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, reason)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "[{:?}] {}", self.code, reason),
            None => write!(f, "[{:?}] {}", self.code, self.reasons.join("; ")),
        }
    }
}

impl std::error::Error for ApiError {}

/// Domain errors keep their message; it is the user-facing reason.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::Validation(_) => ErrorCode::ValidationError,
            CoreError::RuleViolation(_) => ErrorCode::RuleViolation,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::Serial(_) => ErrorCode::SerialError,
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::CustomerNotPermitted { .. } => ErrorCode::Forbidden,
            CoreError::CrewCustomerMismatch { .. } => ErrorCode::ValidationError,
            CoreError::MaterialHasStock { .. } => ErrorCode::Conflict,
        };

        if code == ErrorCode::InsufficientStock {
            return ApiError::with_reasons(code, err.reasons());
        }
        ApiError::new(code, err.to_string())
    }
}

/// System errors are logged in full; the caller gets a generic reason.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => {
                ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", entity, id))
            }
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::CheckViolation { message } => {
                error!("Check constraint violation: {}", message);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::ConnectionFailed(e) => {
                error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => e.into(),
            ServiceError::Db(e) => e.into(),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::validation(format!("Cannot read input: {}", err))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::validation(format!("Invalid JSON payload: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obrador_core::{Quantity, SerialError, Shortfall};

    #[test]
    fn test_shortfalls_become_reasons() {
        let err: ApiError = CoreError::InsufficientStock {
            shortfalls: vec![Shortfall {
                material_id: 1,
                material_code: "CABLE-10".to_string(),
                available: Quantity::from_units(30),
                requested: Quantity::from_units(50),
            }],
        }
        .into();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.reason, None);
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            r#"{"code":"INSUFFICIENT_STOCK","reasons":["Insufficient stock for CABLE-10: available 30.00, requested 50.00"]}"#
        );
    }

    #[test]
    fn test_serial_error_keeps_message() {
        let err: ApiError = ServiceError::Domain(CoreError::Serial(SerialError::NotFound {
            serial_code: "S-9".to_string(),
        }))
        .into();
        assert_eq!(err.code, ErrorCode::SerialError);
        assert!(err.reason.unwrap().contains("S-9"));
    }

    #[test]
    fn test_database_detail_is_hidden() {
        let err: ApiError =
            ServiceError::Db(DbError::QueryFailed("no such table: stock_entries".into())).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.reason.as_deref(), Some("Database operation failed"));
    }

    #[test]
    fn test_permission_maps_to_forbidden() {
        let err: ApiError = CoreError::CustomerNotPermitted { customer_id: 4 }.into();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert!(serde_json::to_string(&err).unwrap().contains(r#""code":"FORBIDDEN""#));
    }
}
