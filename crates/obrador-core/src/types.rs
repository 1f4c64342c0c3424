//! # Domain Types
//!
//! Core domain types used throughout Obrador.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Supplier ─┐                                                            │
//! │  Warehouse ├──1:1──► Location { kind }   Crew ──► Customer              │
//! │  Site ─────┘                               │                            │
//! │                                            └── roster: CrewMember       │
//! │                                                                         │
//! │  Material { serialized } ──► StockEntry (material, location,            │
//! │                  │                       crew?, customer) = quantity    │
//! │                  └────────► SerialUnit (material, serial, customer)     │
//! │                                          state / active / location      │
//! │                                                                         │
//! │  Movement ──owns──► MovementLine ──0..1──► SerialUnit (join record)     │
//! │                                                                         │
//! │  SerialHistoryRecord: append-only, one per serial state change          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Rows use integer ids assigned by the database. Materials additionally
//! carry a unique business `code`; serial units are unique per
//! (material, serial code, customer).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::quantity::Quantity;

// =============================================================================
// Location Kind
// =============================================================================

/// The kind of place a Location represents.
///
/// Determines which movement types may use it as origin or destination,
/// and whether stock held there is keyed by crew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationKind {
    Supplier,
    Warehouse,
    Site,
}

impl LocationKind {
    /// Stock at sites is held per crew; warehouses and suppliers are crew-less.
    #[inline]
    pub const fn holds_crew_stock(&self) -> bool {
        matches!(self, LocationKind::Site)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            LocationKind::Supplier => "SUPPLIER",
            LocationKind::Warehouse => "WAREHOUSE",
            LocationKind::Site => "SITE",
        }
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Location
// =============================================================================

/// A place materials can reside.
///
/// Exactly one of the owner references is set, and it matches `kind`.
/// Every supplier, warehouse and site owns exactly one Location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Location {
    pub id: i64,
    pub kind: LocationKind,
    pub supplier_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub site_id: Option<i64>,
}

impl Location {
    /// Returns the id of the owning supplier/warehouse/site.
    pub fn owner_id(&self) -> Option<i64> {
        match self.kind {
            LocationKind::Supplier => self.supplier_id,
            LocationKind::Warehouse => self.warehouse_id,
            LocationKind::Site => self.site_id,
        }
    }

    /// Checks the one-owner-matching-kind invariant.
    pub fn is_consistent(&self) -> bool {
        let set = [self.supplier_id, self.warehouse_id, self.site_id]
            .iter()
            .filter(|r| r.is_some())
            .count();
        set == 1 && self.owner_id().is_some()
    }
}

// =============================================================================
// Location Owners
// =============================================================================

/// A customer (utility operator client). Scopes all stock and serial rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Warehouse {
    pub id: i64,
    pub name: String,
}

/// A construction site ("obra").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Site {
    pub id: i64,
    pub name: String,
    pub customer_id: i64,
}

// =============================================================================
// Crews
// =============================================================================

/// Role of a person inside a crew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrewRole {
    CrewLead,
    Helper,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Personnel {
    pub id: i64,
    pub name: String,
}

/// A field crew ("cuadrilla"). Belongs to exactly one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Crew {
    pub id: i64,
    pub name: String,
    pub customer_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CrewMember {
    pub crew_id: i64,
    pub personnel_id: i64,
    pub role: CrewRole,
}

// =============================================================================
// Materials
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct UnitOfMeasure {
    pub id: i64,
    pub code: String,
    pub name: String,
}

/// A material that can be stocked and moved.
///
/// `serialized` materials are tracked per unit by serial code; toggling the
/// flag has side effects (see `MaterialRepository::set_serialized`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Material {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub unit_id: i64,
    pub serialized: bool,
}

/// A movement type row. `code` is the rules-engine key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MovementType {
    pub id: i64,
    pub code: String,
    pub description: String,
}

// =============================================================================
// Stock
// =============================================================================

/// Bulk on-hand quantity for one stock cell.
///
/// A cell is (material, location, crew-or-null, customer). Quantity is never
/// negative; a zero row is equivalent to no row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockEntry {
    pub id: i64,
    pub material_id: i64,
    pub location_id: i64,
    pub crew_id: Option<i64>,
    pub customer_id: i64,
    #[ts(type = "string")]
    pub quantity: Quantity,
}

// =============================================================================
// Serial Units
// =============================================================================

/// Lifecycle state of a serialized unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SerialState {
    /// In a warehouse, free to ship.
    Available,
    /// Handed to a crew at a site.
    Assigned,
    /// Consumed at a site (inactive).
    Installed,
    /// Returned to the supplier (inactive).
    Discarded,
}

impl fmt::Display for SerialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SerialState::Available => "AVAILABLE",
            SerialState::Assigned => "ASSIGNED",
            SerialState::Installed => "INSTALLED",
            SerialState::Discarded => "DISCARDED",
        };
        f.write_str(s)
    }
}

/// One individually tracked unit of a serialized material.
///
/// Never deleted by movements, only transitioned. Deleted in cascade when
/// its material is deleted or stops being serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SerialUnit {
    pub id: i64,
    pub material_id: i64,
    pub serial_code: String,
    pub customer_id: i64,
    pub state: SerialState,
    pub active: bool,
    pub location_id: i64,
    pub crew_id: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Movements
// =============================================================================

/// A committed transfer. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Movement {
    pub id: i64,
    pub movement_type_id: i64,
    pub origin_location_id: i64,
    pub destination_location_id: Option<i64>,
    pub origin_crew_id: Option<i64>,
    pub destination_crew_id: Option<i64>,
    pub customer_id: i64,
    /// Acting user (audit).
    pub user_id: i64,
    pub description: Option<String>,
    pub reservation: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A line of a movement.
///
/// Uses snapshot pattern: the serial code is frozen on the line so the
/// movement stays readable even after its serial unit is cascaded away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MovementLine {
    pub id: i64,
    pub movement_id: i64,
    pub material_id: i64,
    #[ts(type = "string")]
    pub quantity: Quantity,
    /// Serial code at time of movement (frozen).
    pub serial_code: Option<String>,
    /// Linked unit, while it still exists.
    pub serial_unit_id: Option<i64>,
}

/// A movement together with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MovementDetail {
    pub movement: Movement,
    pub movement_type_code: String,
    pub lines: Vec<MovementLine>,
}

// =============================================================================
// History
// =============================================================================

/// Append-only audit record of one serial state change.
///
/// Material and serial code are snapshotted so the record outlives the unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SerialHistoryRecord {
    pub id: i64,
    pub serial_unit_id: i64,
    pub material_id: i64,
    pub serial_code: String,
    /// State after the transition.
    pub state: SerialState,
    pub location_id: i64,
    pub crew_id: Option<i64>,
    pub movement_type_id: i64,
    pub movement_id: i64,
    pub user_id: i64,
    pub customer_id: i64,
    #[ts(as = "String")]
    pub recorded_at: DateTime<Utc>,
}

// =============================================================================
// Read Models
// =============================================================================

/// One row of the merged stock view.
///
/// Bulk rows carry their cell quantity; serialized units appear one row each
/// with quantity 1 and `is_serial = true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockSnapshotRow {
    pub material_id: i64,
    pub material_code: String,
    #[ts(type = "string")]
    pub quantity: Quantity,
    pub location_id: i64,
    pub crew_id: Option<i64>,
    pub customer_id: i64,
    pub is_serial: bool,
    pub serial_code: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn location(kind: LocationKind, s: Option<i64>, w: Option<i64>, o: Option<i64>) -> Location {
        Location {
            id: 1,
            kind,
            supplier_id: s,
            warehouse_id: w,
            site_id: o,
        }
    }

    #[test]
    fn test_location_consistency() {
        assert!(location(LocationKind::Warehouse, None, Some(3), None).is_consistent());
        assert!(!location(LocationKind::Warehouse, Some(3), None, None).is_consistent());
        assert!(!location(LocationKind::Site, None, Some(1), Some(2)).is_consistent());
        assert!(!location(LocationKind::Supplier, None, None, None).is_consistent());
    }

    #[test]
    fn test_only_sites_hold_crew_stock() {
        assert!(LocationKind::Site.holds_crew_stock());
        assert!(!LocationKind::Warehouse.holds_crew_stock());
        assert!(!LocationKind::Supplier.holds_crew_stock());
    }

    #[test]
    fn test_enum_wire_format() {
        assert_eq!(
            serde_json::to_string(&LocationKind::Warehouse).unwrap(),
            "\"WAREHOUSE\""
        );
        assert_eq!(
            serde_json::to_string(&CrewRole::CrewLead).unwrap(),
            "\"CREW_LEAD\""
        );
        assert_eq!(SerialState::Installed.to_string(), "INSTALLED");
    }
}
