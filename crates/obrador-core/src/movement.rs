//! # Movement Requests
//!
//! Inbound shapes for the orchestrator and read queries: the movement
//! payload, the acting user, and the filters for stock and history views.
//!
//! ## Payload
//! ```text
//! {
//!   "customer_id": 1,
//!   "description": "Shipment to Obra Norte",
//!   "origin_location_id": 2,
//!   "destination_location_id": 4,
//!   "destination_crew_id": 7,
//!   "movement_type_id": 3,
//!   "lines": [
//!     { "material_id": 10, "quantity": "30" },
//!     { "material_id": 11, "quantity": 1, "serial_code": "S001" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::quantity::Quantity;

/// A requested movement, as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewMovement {
    pub customer_id: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reservation: Option<String>,
    #[serde(default)]
    pub origin_crew_id: Option<i64>,
    #[serde(default)]
    pub destination_crew_id: Option<i64>,
    pub origin_location_id: i64,
    #[serde(default)]
    pub destination_location_id: Option<i64>,
    pub movement_type_id: i64,
    pub lines: Vec<NewMovementLine>,
}

/// One requested line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewMovementLine {
    pub material_id: i64,
    #[ts(type = "string")]
    pub quantity: Quantity,
    #[serde(default)]
    pub serial_code: Option<String>,
}

impl NewMovementLine {
    /// Serial code with surrounding whitespace removed; blank counts as none.
    pub fn serial(&self) -> Option<&str> {
        self.serial_code
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Successful outcome of `create_movement`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MovementCreated {
    pub movement_id: i64,
}

/// The authenticated caller.
///
/// `customer_ids` is the set of customers the user may act on; every read
/// and write is restricted to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: i64,
    pub customer_ids: Vec<i64>,
}

impl Actor {
    pub fn new(user_id: i64, customer_ids: impl Into<Vec<i64>>) -> Self {
        Self {
            user_id,
            customer_ids: customer_ids.into(),
        }
    }

    #[inline]
    pub fn may_access(&self, customer_id: i64) -> bool {
        self.customer_ids.contains(&customer_id)
    }
}

/// Filters for the merged stock view. All fields are optional and ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockFilter {
    pub material_id: Option<i64>,
    pub location_id: Option<i64>,
    pub crew_id: Option<i64>,
    pub customer_id: Option<i64>,
}

/// Filters for serial history. All fields are optional and ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HistoryFilter {
    pub material_id: Option<i64>,
    pub serial_code: Option<String>,
    pub serial_unit_id: Option<i64>,
    pub movement_id: Option<i64>,
}
