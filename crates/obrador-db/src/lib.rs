//! # obrador-db: Database Layer for Obrador
//!
//! SQLite storage for the materials inventory, plus the transaction
//! boundary every movement runs inside.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Obrador Data Flow                               │
//! │                                                                         │
//! │  CLI command (obrador movement create --file m.json)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    obrador-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌───────────────┐  │   │
//! │  │   │   Services    │──►│  Repositories  │──►│   Database    │  │   │
//! │  │   │               │   │                │   │   (pool.rs)   │  │   │
//! │  │   │ Movement      │   │ StockLedger    │   │               │  │   │
//! │  │   │ Material      │   │ SerialRegistry │   │ SqlitePool    │  │   │
//! │  │   │               │   │ HistoryRecorder│   │ UnitOfWork    │  │   │
//! │  │   └───────┬───────┘   └────────────────┘   └───────────────┘  │   │
//! │  │           │ rules, lifecycle, ledger math                       │   │
//! │  │           ▼                                                     │   │
//! │  │      obrador-core                                               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SQLite (WAL)   migrations/sqlite/*.sql embedded at build time  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool and unit of work
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and service error types
//! - [`repository`] - Repository implementations
//! - [`service`] - Movement orchestrator and material service
//!
//! ## Usage
//!
//! ```rust,ignore
//! use obrador_db::{Database, DbConfig, MovementService};
//!
//! let db = Database::new(DbConfig::new("obrador.db")).await?;
//! let movements = MovementService::new(db.clone());
//!
//! let created = movements.create_movement(&actor, &request).await?;
//! let stock = movements.get_stock_snapshot(&actor, &StockFilter::default()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, ServiceError, ServiceResult};
pub use pool::{Database, DbConfig, UnitOfWork};

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::crew::CrewRepository;
pub use repository::history::{HistoryEntry, HistoryRecorder};
pub use repository::location::LocationRepository;
pub use repository::material::MaterialRepository;
pub use repository::movement::MovementRepository;
pub use repository::serial::SerialRegistry;
pub use repository::stock::StockLedger;

pub use service::material::MaterialService;
pub use service::movement::MovementService;
