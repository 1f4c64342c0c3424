//! # Serial Lifecycle
//!
//! Pure rules for how a movement transitions a serialized unit.
//!
//! ## State Machine
//! ```text
//!              PROVIDER_INTAKE / SITE_RETURN / WAREHOUSE_TO_WAREHOUSE
//!                         ┌──────────────────────────────┐
//!                         ▼                              │
//!   (new) ──INTAKE──► AVAILABLE ──SITE_SHIPMENT──► ASSIGNED ◄─┐
//!                         │                         │   │     │ SITE_TO_SITE
//!                         │                         │   └─────┘ CREW_TO_CREW
//!                  PROVIDER_RETURN          SITE_CONSUMPTION
//!                         ▼                         ▼
//!                    DISCARDED                 INSTALLED
//!                    (inactive)                (inactive)
//!                         │                         │
//!                         └─INTAKE          SITE_RETURN─┘  (re-activates)
//! ```
//!
//! ## Origin Check
//! A unit must sit at the movement origin (location and crew). The one
//! exception: a SITE_RETURN may pull back an INSTALLED unit held by any
//! crew at that site. Such a line is "exempt": it does not debit bulk stock
//! at the origin, because installed units are no longer counted there.

use crate::error::SerialError;
use crate::rules::MovementTypeCode;
use crate::types::{SerialState, SerialUnit};

// =============================================================================
// State Transitions
// =============================================================================

impl SerialState {
    /// State a unit ends in after a movement of `code`.
    pub const fn after(code: MovementTypeCode) -> Self {
        match code {
            MovementTypeCode::ProviderIntake
            | MovementTypeCode::SiteReturn
            | MovementTypeCode::WarehouseToWarehouse => SerialState::Available,
            MovementTypeCode::SiteShipment
            | MovementTypeCode::SiteToSite
            | MovementTypeCode::CrewToCrew => SerialState::Assigned,
            MovementTypeCode::SiteConsumption => SerialState::Installed,
            MovementTypeCode::ProviderReturn => SerialState::Discarded,
        }
    }

    /// Installed and discarded units are inactive.
    #[inline]
    pub const fn is_active(&self) -> bool {
        !matches!(self, SerialState::Installed | SerialState::Discarded)
    }
}

/// Where and in what state a unit lands after a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialPlacement {
    pub state: SerialState,
    pub active: bool,
    pub location_id: i64,
    pub crew_id: Option<i64>,
}

/// Computes the placement of a unit after a movement.
///
/// - location: destination if the movement has one, else unchanged
/// - crew: cleared on SITE_RETURN; otherwise destination crew if given,
///   else unchanged
pub fn place(
    code: MovementTypeCode,
    current_location_id: i64,
    current_crew_id: Option<i64>,
    destination_location_id: Option<i64>,
    destination_crew_id: Option<i64>,
) -> SerialPlacement {
    let state = SerialState::after(code);
    let crew_id = match code {
        MovementTypeCode::SiteReturn => None,
        _ => destination_crew_id.or(current_crew_id),
    };
    SerialPlacement {
        state,
        active: state.is_active(),
        location_id: destination_location_id.unwrap_or(current_location_id),
        crew_id,
    }
}

// =============================================================================
// Origin Check
// =============================================================================

/// Outcome of checking an existing unit against a movement origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginCheck {
    /// Line does not debit bulk stock at the origin.
    pub exempt: bool,
}

/// Verifies an existing unit may leave the movement origin.
pub fn check_at_origin(
    unit: &SerialUnit,
    code: MovementTypeCode,
    origin_location_id: i64,
    origin_crew_id: Option<i64>,
) -> Result<OriginCheck, SerialError> {
    if unit.location_id != origin_location_id {
        return Err(SerialError::NotAtOrigin {
            serial_code: unit.serial_code.clone(),
        });
    }

    let installed_return = code == MovementTypeCode::SiteReturn && unit.state == SerialState::Installed;
    if installed_return {
        return Ok(OriginCheck { exempt: true });
    }

    let reintake = code == MovementTypeCode::ProviderIntake && unit.state == SerialState::Discarded;
    if !unit.active && !reintake {
        return Err(SerialError::Inactive {
            serial_code: unit.serial_code.clone(),
            state: unit.state,
        });
    }

    if unit.crew_id != origin_crew_id {
        return Err(SerialError::WrongCrew {
            serial_code: unit.serial_code.clone(),
        });
    }

    Ok(OriginCheck { exempt: false })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn unit(state: SerialState, location_id: i64, crew_id: Option<i64>) -> SerialUnit {
        SerialUnit {
            id: 1,
            material_id: 10,
            serial_code: "S001".to_string(),
            customer_id: 1,
            state,
            active: state.is_active(),
            location_id,
            crew_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_state_after_each_type() {
        use MovementTypeCode::*;
        assert_eq!(SerialState::after(ProviderIntake), SerialState::Available);
        assert_eq!(SerialState::after(SiteReturn), SerialState::Available);
        assert_eq!(SerialState::after(WarehouseToWarehouse), SerialState::Available);
        assert_eq!(SerialState::after(SiteShipment), SerialState::Assigned);
        assert_eq!(SerialState::after(SiteToSite), SerialState::Assigned);
        assert_eq!(SerialState::after(CrewToCrew), SerialState::Assigned);
        assert_eq!(SerialState::after(SiteConsumption), SerialState::Installed);
        assert_eq!(SerialState::after(ProviderReturn), SerialState::Discarded);
    }

    #[test]
    fn test_active_flag_follows_state() {
        assert!(SerialState::Available.is_active());
        assert!(SerialState::Assigned.is_active());
        assert!(!SerialState::Installed.is_active());
        assert!(!SerialState::Discarded.is_active());
    }

    #[test]
    fn test_consumption_keeps_location_and_crew() {
        let p = place(MovementTypeCode::SiteConsumption, 4, Some(7), None, None);
        assert_eq!(p.location_id, 4);
        assert_eq!(p.crew_id, Some(7));
        assert_eq!(p.state, SerialState::Installed);
        assert!(!p.active);
    }

    #[test]
    fn test_site_return_clears_crew() {
        let p = place(MovementTypeCode::SiteReturn, 4, Some(7), Some(2), None);
        assert_eq!(p.location_id, 2);
        assert_eq!(p.crew_id, None);
        assert!(p.active);
    }

    #[test]
    fn test_shipment_takes_destination_crew() {
        let p = place(MovementTypeCode::SiteShipment, 2, None, Some(4), Some(7));
        assert_eq!((p.location_id, p.crew_id), (4, Some(7)));
        assert_eq!(p.state, SerialState::Assigned);
    }

    #[test]
    fn test_unit_elsewhere_is_rejected() {
        let err = check_at_origin(
            &unit(SerialState::Available, 3, None),
            MovementTypeCode::SiteShipment,
            2,
            None,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "serial S001 is not available at origin location"
        );
    }

    #[test]
    fn test_crew_mismatch_is_rejected() {
        let err = check_at_origin(
            &unit(SerialState::Assigned, 4, Some(8)),
            MovementTypeCode::SiteConsumption,
            4,
            Some(7),
        )
        .unwrap_err();
        assert!(matches!(err, SerialError::WrongCrew { .. }));
    }

    #[test]
    fn test_installed_return_is_exempt_regardless_of_crew() {
        let check = check_at_origin(
            &unit(SerialState::Installed, 4, Some(8)),
            MovementTypeCode::SiteReturn,
            4,
            Some(7),
        )
        .unwrap();
        assert!(check.exempt);
    }

    #[test]
    fn test_assigned_return_is_not_exempt() {
        let check = check_at_origin(
            &unit(SerialState::Assigned, 4, Some(7)),
            MovementTypeCode::SiteReturn,
            4,
            Some(7),
        )
        .unwrap();
        assert!(!check.exempt);
    }

    #[test]
    fn test_installed_unit_cannot_be_reshipped() {
        let err = check_at_origin(
            &unit(SerialState::Installed, 4, Some(7)),
            MovementTypeCode::SiteToSite,
            4,
            Some(7),
        )
        .unwrap_err();
        assert!(matches!(err, SerialError::Inactive { .. }));
    }

    #[test]
    fn test_discarded_unit_can_be_taken_in_again() {
        let check = check_at_origin(
            &unit(SerialState::Discarded, 1, None),
            MovementTypeCode::ProviderIntake,
            1,
            None,
        )
        .unwrap();
        assert!(!check.exempt);
    }
}
