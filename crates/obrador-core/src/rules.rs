//! # Movement Rules
//!
//! Declarative table of legal movement shapes, one row per movement type.
//!
//! ## Rule Table
//! ```text
//! ┌────────────────────────┬───────────┬─────────────┬────────┬────────┬──────────┐
//! │ Type                   │ Origin    │ Destination │ O.crew │ D.crew │ Distinct │
//! ├────────────────────────┼───────────┼─────────────┼────────┼────────┼──────────┤
//! │ PROVIDER_INTAKE        │ SUPPLIER  │ WAREHOUSE   │ no     │ no     │          │
//! │ SITE_RETURN            │ SITE      │ WAREHOUSE   │ yes    │ no     │          │
//! │ SITE_SHIPMENT          │ WAREHOUSE │ SITE        │ no     │ yes    │          │
//! │ SITE_CONSUMPTION       │ SITE      │ (none)      │ yes    │ no     │          │
//! │ SITE_TO_SITE           │ SITE      │ SITE        │ yes    │ yes    │ location │
//! │ WAREHOUSE_TO_WAREHOUSE │ WAREHOUSE │ WAREHOUSE   │ no     │ no     │ location │
//! │ CREW_TO_CREW           │ SITE      │ SITE        │ yes    │ yes    │ crew     │
//! │ PROVIDER_RETURN        │ WAREHOUSE │ SUPPLIER    │ no     │ no     │          │
//! └────────────────────────┴───────────┴─────────────┴────────┴────────┴──────────┘
//! ```
//!
//! "no" in a crew column means the crew must be absent, not optional.
//! Adding a movement type is one new row in [`MOVEMENT_RULES`] plus one
//! variant in [`MovementTypeCode`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::types::LocationKind;

// =============================================================================
// Movement Type Code
// =============================================================================

/// Recognized movement type codes (rules-engine keys).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementTypeCode {
    ProviderIntake,
    SiteReturn,
    SiteShipment,
    SiteConsumption,
    SiteToSite,
    WarehouseToWarehouse,
    CrewToCrew,
    ProviderReturn,
}

impl MovementTypeCode {
    pub const ALL: [MovementTypeCode; 8] = [
        MovementTypeCode::ProviderIntake,
        MovementTypeCode::SiteReturn,
        MovementTypeCode::SiteShipment,
        MovementTypeCode::SiteConsumption,
        MovementTypeCode::SiteToSite,
        MovementTypeCode::WarehouseToWarehouse,
        MovementTypeCode::CrewToCrew,
        MovementTypeCode::ProviderReturn,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementTypeCode::ProviderIntake => "PROVIDER_INTAKE",
            MovementTypeCode::SiteReturn => "SITE_RETURN",
            MovementTypeCode::SiteShipment => "SITE_SHIPMENT",
            MovementTypeCode::SiteConsumption => "SITE_CONSUMPTION",
            MovementTypeCode::SiteToSite => "SITE_TO_SITE",
            MovementTypeCode::WarehouseToWarehouse => "WAREHOUSE_TO_WAREHOUSE",
            MovementTypeCode::CrewToCrew => "CREW_TO_CREW",
            MovementTypeCode::ProviderReturn => "PROVIDER_RETURN",
        }
    }

    /// Whether destination stock is credited.
    ///
    /// Consumption and provider returns take material out of the system.
    pub const fn credits_destination(&self) -> bool {
        !matches!(
            self,
            MovementTypeCode::SiteConsumption | MovementTypeCode::ProviderReturn
        )
    }

    /// Only provider intakes may register serial codes not seen before.
    pub const fn registers_new_serials(&self) -> bool {
        matches!(self, MovementTypeCode::ProviderIntake)
    }

    /// Returns the table row for this type.
    pub fn rule(&self) -> &'static MovementRule {
        // ALL and MOVEMENT_RULES share ordering; the test below pins it.
        &MOVEMENT_RULES[*self as usize]
    }
}

impl fmt::Display for MovementTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementTypeCode {
    type Err = RuleViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MovementTypeCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| RuleViolation::UnrecognizedType {
                code: s.to_string(),
            })
    }
}

// =============================================================================
// Rule Rows
// =============================================================================

/// Whether a crew reference must be present or absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrewRule {
    Required,
    Forbidden,
}

/// What the destination location must be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationRule {
    Required(LocationKind),
    Forbidden,
}

/// Extra inequality constraint between origin and destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distinct {
    Nothing,
    Locations,
    Crews,
}

/// One row of the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementRule {
    pub code: MovementTypeCode,
    pub origin: LocationKind,
    pub destination: DestinationRule,
    pub origin_crew: CrewRule,
    pub destination_crew: CrewRule,
    pub distinct: Distinct,
}

use CrewRule::{Forbidden as NoCrew, Required as Crew};
use LocationKind::{Site, Supplier, Warehouse};

/// The rule table, indexed in [`MovementTypeCode::ALL`] order.
pub const MOVEMENT_RULES: [MovementRule; 8] = [
    MovementRule {
        code: MovementTypeCode::ProviderIntake,
        origin: Supplier,
        destination: DestinationRule::Required(Warehouse),
        origin_crew: NoCrew,
        destination_crew: NoCrew,
        distinct: Distinct::Nothing,
    },
    MovementRule {
        code: MovementTypeCode::SiteReturn,
        origin: Site,
        destination: DestinationRule::Required(Warehouse),
        origin_crew: Crew,
        destination_crew: NoCrew,
        distinct: Distinct::Nothing,
    },
    MovementRule {
        code: MovementTypeCode::SiteShipment,
        origin: Warehouse,
        destination: DestinationRule::Required(Site),
        origin_crew: NoCrew,
        destination_crew: Crew,
        distinct: Distinct::Nothing,
    },
    MovementRule {
        code: MovementTypeCode::SiteConsumption,
        origin: Site,
        destination: DestinationRule::Forbidden,
        origin_crew: Crew,
        destination_crew: NoCrew,
        distinct: Distinct::Nothing,
    },
    MovementRule {
        code: MovementTypeCode::SiteToSite,
        origin: Site,
        destination: DestinationRule::Required(Site),
        origin_crew: Crew,
        destination_crew: Crew,
        distinct: Distinct::Locations,
    },
    MovementRule {
        code: MovementTypeCode::WarehouseToWarehouse,
        origin: Warehouse,
        destination: DestinationRule::Required(Warehouse),
        origin_crew: NoCrew,
        destination_crew: NoCrew,
        distinct: Distinct::Locations,
    },
    MovementRule {
        code: MovementTypeCode::CrewToCrew,
        origin: Site,
        destination: DestinationRule::Required(Site),
        origin_crew: Crew,
        destination_crew: Crew,
        distinct: Distinct::Crews,
    },
    MovementRule {
        code: MovementTypeCode::ProviderReturn,
        origin: Warehouse,
        destination: DestinationRule::Required(Supplier),
        origin_crew: NoCrew,
        destination_crew: NoCrew,
        distinct: Distinct::Nothing,
    },
];

// =============================================================================
// Movement Shape
// =============================================================================

/// The resolved endpoints of a requested movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementShape {
    pub origin_location_id: i64,
    pub origin_kind: LocationKind,
    /// Destination location id and kind, if one was given.
    pub destination: Option<(i64, LocationKind)>,
    pub origin_crew_id: Option<i64>,
    pub destination_crew_id: Option<i64>,
}

// =============================================================================
// Rule Violation
// =============================================================================

/// A movement shape that its type does not allow.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("unrecognized movement type: {code}")]
    UnrecognizedType { code: String },

    #[error("{code} requires origin of kind {expected}, got {actual}")]
    OriginKind {
        code: MovementTypeCode,
        expected: LocationKind,
        actual: LocationKind,
    },

    #[error("{code} requires a destination of kind {expected}")]
    DestinationMissing {
        code: MovementTypeCode,
        expected: LocationKind,
    },

    #[error("{code} requires destination of kind {expected}, got {actual}")]
    DestinationKind {
        code: MovementTypeCode,
        expected: LocationKind,
        actual: LocationKind,
    },

    #[error("{code} does not allow a destination location")]
    DestinationForbidden { code: MovementTypeCode },

    #[error("{code} requires an origin crew")]
    OriginCrewMissing { code: MovementTypeCode },

    #[error("{code} does not allow an origin crew")]
    OriginCrewForbidden { code: MovementTypeCode },

    #[error("{code} requires a destination crew")]
    DestinationCrewMissing { code: MovementTypeCode },

    #[error("{code} does not allow a destination crew")]
    DestinationCrewForbidden { code: MovementTypeCode },

    #[error("{code} requires distinct origin and destination locations")]
    SameLocation { code: MovementTypeCode },

    #[error("{code} requires distinct origin and destination crews")]
    SameCrew { code: MovementTypeCode },
}

// =============================================================================
// Checking
// =============================================================================

impl MovementRule {
    /// Checks a shape against this row. First violation wins.
    pub fn check(&self, shape: &MovementShape) -> Result<(), RuleViolation> {
        let code = self.code;

        if shape.origin_kind != self.origin {
            return Err(RuleViolation::OriginKind {
                code,
                expected: self.origin,
                actual: shape.origin_kind,
            });
        }

        match (self.destination, shape.destination) {
            (DestinationRule::Required(expected), None) => {
                return Err(RuleViolation::DestinationMissing { code, expected });
            }
            (DestinationRule::Required(expected), Some((_, actual))) if actual != expected => {
                return Err(RuleViolation::DestinationKind {
                    code,
                    expected,
                    actual,
                });
            }
            (DestinationRule::Forbidden, Some(_)) => {
                return Err(RuleViolation::DestinationForbidden { code });
            }
            _ => {}
        }

        match (self.origin_crew, shape.origin_crew_id) {
            (CrewRule::Required, None) => return Err(RuleViolation::OriginCrewMissing { code }),
            (CrewRule::Forbidden, Some(_)) => {
                return Err(RuleViolation::OriginCrewForbidden { code })
            }
            _ => {}
        }

        match (self.destination_crew, shape.destination_crew_id) {
            (CrewRule::Required, None) => {
                return Err(RuleViolation::DestinationCrewMissing { code })
            }
            (CrewRule::Forbidden, Some(_)) => {
                return Err(RuleViolation::DestinationCrewForbidden { code })
            }
            _ => {}
        }

        match self.distinct {
            Distinct::Locations
                if shape.destination.map(|(id, _)| id) == Some(shape.origin_location_id) =>
            {
                Err(RuleViolation::SameLocation { code })
            }
            Distinct::Crews if shape.origin_crew_id == shape.destination_crew_id => {
                Err(RuleViolation::SameCrew { code })
            }
            _ => Ok(()),
        }
    }
}

/// Validates a movement shape against the type named by `type_code`.
///
/// Pure: no I/O, same input always yields the same verdict.
pub fn validate(type_code: &str, shape: &MovementShape) -> Result<MovementTypeCode, RuleViolation> {
    let code: MovementTypeCode = type_code.parse()?;
    code.rule().check(shape)?;
    Ok(code)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SUPPLIER: (i64, LocationKind) = (1, Supplier);
    const WAREHOUSE_A: (i64, LocationKind) = (2, Warehouse);
    const WAREHOUSE_B: (i64, LocationKind) = (3, Warehouse);
    const SITE_X: (i64, LocationKind) = (4, Site);
    const SITE_Y: (i64, LocationKind) = (5, Site);

    fn shape(
        origin: (i64, LocationKind),
        destination: Option<(i64, LocationKind)>,
        origin_crew_id: Option<i64>,
        destination_crew_id: Option<i64>,
    ) -> MovementShape {
        MovementShape {
            origin_location_id: origin.0,
            origin_kind: origin.1,
            destination,
            origin_crew_id,
            destination_crew_id,
        }
    }

    #[test]
    fn test_table_order_matches_codes() {
        for code in MovementTypeCode::ALL {
            assert_eq!(code.rule().code, code);
        }
    }

    #[test]
    fn test_codes_roundtrip_through_strings() {
        for code in MovementTypeCode::ALL {
            assert_eq!(code.as_str().parse::<MovementTypeCode>(), Ok(code));
        }
    }

    #[test]
    fn test_every_legal_shape_passes() {
        let legal = [
            ("PROVIDER_INTAKE", shape(SUPPLIER, Some(WAREHOUSE_A), None, None)),
            ("SITE_RETURN", shape(SITE_X, Some(WAREHOUSE_A), Some(7), None)),
            ("SITE_SHIPMENT", shape(WAREHOUSE_A, Some(SITE_X), None, Some(7))),
            ("SITE_CONSUMPTION", shape(SITE_X, None, Some(7), None)),
            ("SITE_TO_SITE", shape(SITE_X, Some(SITE_Y), Some(7), Some(7))),
            ("WAREHOUSE_TO_WAREHOUSE", shape(WAREHOUSE_A, Some(WAREHOUSE_B), None, None)),
            ("CREW_TO_CREW", shape(SITE_X, Some(SITE_X), Some(7), Some(8))),
            ("PROVIDER_RETURN", shape(WAREHOUSE_A, Some(SUPPLIER), None, None)),
        ];
        for (code, s) in legal {
            assert!(validate(code, &s).is_ok(), "{code} should accept {s:?}");
        }
    }

    #[test]
    fn test_unrecognized_type() {
        let err = validate("TELEPORT", &shape(SITE_X, None, Some(1), None)).unwrap_err();
        assert_eq!(err.to_string(), "unrecognized movement type: TELEPORT");
    }

    #[test]
    fn test_consumption_rejects_destination() {
        let err = validate("SITE_CONSUMPTION", &shape(SITE_X, Some(SITE_Y), Some(7), None))
            .unwrap_err();
        assert_eq!(
            err,
            RuleViolation::DestinationForbidden {
                code: MovementTypeCode::SiteConsumption
            }
        );
    }

    #[test]
    fn test_shipment_requires_destination_crew() {
        let err = validate("SITE_SHIPMENT", &shape(WAREHOUSE_A, Some(SITE_X), None, None))
            .unwrap_err();
        assert!(matches!(err, RuleViolation::DestinationCrewMissing { .. }));
    }

    #[test]
    fn test_crew_forbidden_means_absent() {
        let err = validate("PROVIDER_INTAKE", &shape(SUPPLIER, Some(WAREHOUSE_A), Some(7), None))
            .unwrap_err();
        assert!(matches!(err, RuleViolation::OriginCrewForbidden { .. }));
    }

    #[test]
    fn test_wrong_origin_kind() {
        let err = validate("SITE_RETURN", &shape(WAREHOUSE_A, Some(WAREHOUSE_B), Some(7), None))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "SITE_RETURN requires origin of kind SITE, got WAREHOUSE"
        );
    }

    #[test]
    fn test_wrong_destination_kind() {
        let err = validate("PROVIDER_RETURN", &shape(WAREHOUSE_A, Some(WAREHOUSE_B), None, None))
            .unwrap_err();
        assert!(matches!(err, RuleViolation::DestinationKind { .. }));
    }

    #[test]
    fn test_distinct_locations() {
        let err = validate(
            "WAREHOUSE_TO_WAREHOUSE",
            &shape(WAREHOUSE_A, Some(WAREHOUSE_A), None, None),
        )
        .unwrap_err();
        assert!(matches!(err, RuleViolation::SameLocation { .. }));

        let err = validate("SITE_TO_SITE", &shape(SITE_X, Some(SITE_X), Some(7), Some(8)))
            .unwrap_err();
        assert!(matches!(err, RuleViolation::SameLocation { .. }));
    }

    #[test]
    fn test_distinct_crews() {
        let err = validate("CREW_TO_CREW", &shape(SITE_X, Some(SITE_Y), Some(7), Some(7)))
            .unwrap_err();
        assert!(matches!(err, RuleViolation::SameCrew { .. }));
    }

    #[test]
    fn test_stock_crediting_types() {
        assert!(!MovementTypeCode::SiteConsumption.credits_destination());
        assert!(!MovementTypeCode::ProviderReturn.credits_destination());
        assert!(MovementTypeCode::SiteReturn.credits_destination());
        assert!(MovementTypeCode::ProviderIntake.registers_new_serials());
        assert!(!MovementTypeCode::SiteShipment.registers_new_serials());
    }
}
