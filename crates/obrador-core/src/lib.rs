//! # obrador-core: Pure Domain Logic for Obrador
//!
//! This crate holds the movement rules, serial lifecycle and ledger math of
//! the Obrador materials inventory as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Obrador Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    obrador-cli (apps/cli)                       │   │
//! │  │    movement create ─ stock ─ history ─ material set-serialized  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              obrador-db (repositories + orchestrator)           │   │
//! │  │         SQLite, migrations, MovementService transaction         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ obrador-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  rules   │ │  serial  │ │  ledger  │ │validation│          │   │
//! │  │   │  table   │ │lifecycle │ │   math   │ │ payloads │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Location, Material, SerialUnit, Movement...)
//! - [`quantity`] - Fixed-point quantity, two decimals, no floating point
//! - [`rules`] - Movement type rule table and validator
//! - [`serial`] - Serial unit state machine and origin checks
//! - [`ledger`] - Crew keys, per-material aggregation, shortfalls
//! - [`movement`] - Request payloads, actor, read filters
//! - [`validation`] - Pre-transaction input checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use obrador_core::rules::{validate, MovementShape, MovementTypeCode};
//! use obrador_core::LocationKind;
//!
//! let shape = MovementShape {
//!     origin_location_id: 1,
//!     origin_kind: LocationKind::Supplier,
//!     destination: Some((2, LocationKind::Warehouse)),
//!     origin_crew_id: None,
//!     destination_crew_id: None,
//! };
//! assert_eq!(validate("PROVIDER_INTAKE", &shape), Ok(MovementTypeCode::ProviderIntake));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod movement;
pub mod quantity;
pub mod rules;
pub mod serial;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, SerialError, Shortfall, ValidationError};
pub use movement::{Actor, HistoryFilter, MovementCreated, NewMovement, NewMovementLine, StockFilter};
pub use quantity::Quantity;
pub use rules::{MovementTypeCode, RuleViolation};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines in a single movement.
pub const MAX_MOVEMENT_LINES: usize = 500;

/// Maximum length of a serial code.
pub const MAX_SERIAL_CODE_LEN: usize = 100;

/// Maximum length of a movement description.
pub const MAX_DESCRIPTION_LEN: usize = 500;
