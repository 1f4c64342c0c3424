//! # Repository Module
//!
//! Database repository implementations for Obrador.
//!
//! ## Two Call Styles
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pool-bound (methods on &self)         Unit-of-work-bound (assoc. fns)  │
//! │  ─────────────────────────────         ──────────────────────────────── │
//! │  db.stock().snapshot(&actor, &f)       StockLedger::decrement(conn, ..) │
//! │  db.materials().create(..)             SerialRegistry::lookup(conn, ..) │
//! │  db.history().query(&actor, &f)        HistoryRecorder::append(conn, ..)│
//! │                                                                         │
//! │  Each call is its own statement        Every step runs on the one       │
//! │  (or its own short transaction).       connection the orchestrator's    │
//! │                                        UnitOfWork holds.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`LocationRepository`](location::LocationRepository) - Suppliers, warehouses, sites and their locations
//! - [`CatalogRepository`](catalog::CatalogRepository) - Customers, units, personnel, movement types
//! - [`MaterialRepository`](material::MaterialRepository) - Materials
//! - [`CrewRepository`](crew::CrewRepository) - Crews and rosters
//! - [`StockLedger`](stock::StockLedger) - Bulk stock cells and the merged stock view
//! - [`SerialRegistry`](serial::SerialRegistry) - Serial units
//! - [`HistoryRecorder`](history::HistoryRecorder) - Serial history
//! - [`MovementRepository`](movement::MovementRepository) - Movements and lines

pub mod catalog;
pub mod crew;
pub mod history;
pub mod location;
pub mod material;
pub mod movement;
pub mod serial;
pub mod stock;
