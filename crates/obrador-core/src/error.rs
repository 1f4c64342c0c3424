//! # Error Types
//!
//! Domain-specific error types for obrador-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  obrador-core errors (this file)                                       │
//! │  ├── CoreError        - Domain failures (rules, stock, serials, refs)  │
//! │  ├── SerialError      - Serialized-unit inconsistencies (fail-fast)    │
//! │  └── ValidationError  - Malformed input, rejected before any tx        │
//! │                                                                         │
//! │  obrador-db errors (separate crate)                                    │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── ServiceError     - CoreError | DbError from the orchestrator      │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── ApiError         - {code, reason} / {code, reasons: [...]}        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (material code, serial, ids)
//! 3. Bulk-stock shortfalls are collected; everything else is first-wins

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

use crate::quantity::Quantity;
use crate::rules::RuleViolation;
use crate::types::SerialState;

// =============================================================================
// Shortfall
// =============================================================================

/// One bulk-stock shortfall found during the availability pass.
///
/// ## Display
/// `Insufficient stock for CABLE-10: available 30.00, requested 50.00`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct Shortfall {
    pub material_id: i64,
    pub material_code: String,
    #[ts(type = "string")]
    pub available: Quantity,
    #[ts(type = "string")]
    pub requested: Quantity,
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Insufficient stock for {}: available {}, requested {}",
            self.material_code, self.available, self.requested
        )
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant is detected before commit; the orchestrator rolls the
/// whole movement back and surfaces the message as the user-facing reason.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Origin/destination/crew combination is illegal for the movement type.
    #[error("{0}")]
    RuleViolation(#[from] RuleViolation),

    /// One or more materials lack stock at the origin cell.
    ///
    /// ## User Workflow
    /// ```text
    /// Ship 50 m of CABLE-10 from Warehouse A
    ///      │
    ///      ▼
    /// Check stock: available=30.00
    ///      │
    ///      ▼
    /// InsufficientStock { shortfalls: [CABLE-10 30.00 < 50.00, ...] }
    ///      │
    ///      ▼
    /// UI lists every shortfall at once, user fixes the whole request
    /// ```
    #[error("{}", join_shortfalls(.shortfalls))]
    InsufficientStock { shortfalls: Vec<Shortfall> },

    /// A serialized line is inconsistent with the serial registry.
    #[error(transparent)]
    Serial(#[from] SerialError),

    /// A referenced row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The acting user may not operate on this customer's stock.
    #[error("Customer {customer_id} is not permitted for this user")]
    CustomerNotPermitted { customer_id: i64 },

    /// A crew was referenced under a customer it does not belong to.
    #[error("Crew {crew_id} does not belong to customer {customer_id}")]
    CrewCustomerMismatch { crew_id: i64, customer_id: i64 },

    /// Material cannot become serialized while bulk stock exists.
    #[error("Material {code} still has stock on hand; cannot mark it as serialized")]
    MaterialHasStock { code: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// User-facing reasons: one per shortfall, or the single message.
    pub fn reasons(&self) -> Vec<String> {
        match self {
            CoreError::InsufficientStock { shortfalls } => {
                shortfalls.iter().map(ToString::to_string).collect()
            }
            other => vec![other.to_string()],
        }
    }
}

fn join_shortfalls(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Serial Error
// =============================================================================

/// Serialized-unit inconsistencies.
///
/// Unlike bulk shortfalls these are fail-fast: the first one found aborts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SerialError {
    /// Serial is unknown and the movement is not a provider intake.
    #[error("serial does not exist: {serial_code}")]
    NotFound { serial_code: String },

    /// Serial is somewhere other than the movement origin.
    #[error("serial {serial_code} is not available at origin location")]
    NotAtOrigin { serial_code: String },

    /// Serial is held by a different crew than the movement origin crew.
    #[error("serial {serial_code} is not held by the origin crew")]
    WrongCrew { serial_code: String },

    /// Serial is installed/discarded and this movement type cannot revive it.
    #[error("serial {serial_code} is {state} and cannot be moved")]
    Inactive {
        serial_code: String,
        state: SerialState,
    },

    /// The same serial appears on two lines of one movement.
    #[error("duplicate serial in movement: {serial_code}")]
    Duplicate { serial_code: String },

    /// A serialized material line came without a serial code.
    #[error("material {material_code} is serialized; a serial code is required")]
    Missing { material_code: String },

    /// A serialized line must move exactly one unit.
    #[error("serial {serial_code} must be moved with quantity 1")]
    WrongQuantity { serial_code: String },

    /// A serial code was given for a bulk material.
    #[error("material {material_code} is not serialized; remove serial {serial_code}")]
    NotSerialized {
        material_code: String,
        serial_code: String,
    },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any transaction starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    /// Invalid format (e.g., bad decimal, bad code characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Collection exceeds its allowed size.
    #[error("{field} must have at most {max} entries")]
    TooMany { field: String, max: usize },

    /// Duplicate value.
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
