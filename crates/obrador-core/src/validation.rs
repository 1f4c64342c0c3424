//! # Validation Module
//!
//! Input validation for Obrador, run before any transaction starts.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                      │
//! │  ├── Types, required fields                                            │
//! │  └── Quantity parsing (max 2 decimals)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (pure, pre-transaction)                          │
//! │  ├── Lines present, quantities > 0, text lengths                       │
//! │  └── Duplicate serials within the movement                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Orchestrator (inside the transaction)                        │
//! │  ├── Rules table, crews, materials, serial registry                    │
//! │  └── Stock availability                                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite)                                            │
//! │  └── CHECK (quantity >= 0), UNIQUE, FOREIGN KEY                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use obrador_core::validation::{validate_material_code, validate_quantity};
//! use obrador_core::Quantity;
//!
//! validate_material_code("CABLE-10").unwrap();
//! validate_quantity(Quantity::from_units(5)).unwrap();
//! ```

use std::collections::HashSet;

use crate::error::{CoreResult, SerialError, ValidationError};
use crate::movement::{NewMovement, NewMovementLine};
use crate::quantity::Quantity;
use crate::types::Material;
use crate::{MAX_DESCRIPTION_LEN, MAX_MOVEMENT_LINES, MAX_SERIAL_CODE_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a material code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores and dots
///
/// ```rust
/// use obrador_core::validation::validate_material_code;
///
/// assert!(validate_material_code("CABLE-10").is_ok());
/// assert!(validate_material_code("").is_err());
/// assert!(validate_material_code("CABLE 10").is_err());
/// ```
pub fn validate_material_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "only letters, digits, '-', '_' and '.' are allowed".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (customer, site, crew, material...).
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a serial code. Callers pass the trimmed value.
pub fn validate_serial_code(serial: &str) -> ValidationResult<()> {
    if serial.is_empty() {
        return Err(ValidationError::Required {
            field: "serial_code".to_string(),
        });
    }

    if serial.len() > MAX_SERIAL_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "serial_code".to_string(),
            max: MAX_SERIAL_CODE_LEN,
        });
    }

    if serial.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat {
            field: "serial_code".to_string(),
            reason: "control characters are not allowed".to_string(),
        });
    }

    Ok(())
}

fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) if v.len() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity: strictly positive.
pub fn validate_quantity(quantity: Quantity) -> ValidationResult<()> {
    if !quantity.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Movement Validators
// =============================================================================

/// Validates a movement payload before any transaction starts.
///
/// ## Checks
/// - At least one line, at most `MAX_MOVEMENT_LINES`
/// - Every quantity strictly positive
/// - Serial codes well formed
/// - No (material, serial) pair repeated across lines
/// - Description/reservation within length limits
pub fn validate_new_movement(movement: &NewMovement) -> CoreResult<()> {
    if movement.lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        }
        .into());
    }

    if movement.lines.len() > MAX_MOVEMENT_LINES {
        return Err(ValidationError::TooMany {
            field: "lines".to_string(),
            max: MAX_MOVEMENT_LINES,
        }
        .into());
    }

    validate_optional_text("description", movement.description.as_deref(), MAX_DESCRIPTION_LEN)?;
    validate_optional_text("reservation", movement.reservation.as_deref(), 100)?;

    let mut seen: HashSet<(i64, &str)> = HashSet::new();
    for line in &movement.lines {
        validate_quantity(line.quantity)?;
        if let Some(serial) = line.serial() {
            validate_serial_code(serial)?;
            if !seen.insert((line.material_id, serial)) {
                return Err(SerialError::Duplicate {
                    serial_code: serial.to_string(),
                }
                .into());
            }
        }
    }

    Ok(())
}

/// Checks a line against its material's `serialized` flag.
pub fn validate_line_for_material(
    line: &NewMovementLine,
    material: &Material,
) -> Result<(), SerialError> {
    match (material.serialized, line.serial()) {
        (true, None) => Err(SerialError::Missing {
            material_code: material.code.clone(),
        }),
        (true, Some(serial)) if line.quantity != Quantity::ONE => Err(SerialError::WrongQuantity {
            serial_code: serial.to_string(),
        }),
        (false, Some(serial)) => Err(SerialError::NotSerialized {
            material_code: material.code.clone(),
            serial_code: serial.to_string(),
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn line(material_id: i64, hundredths: i64, serial: Option<&str>) -> NewMovementLine {
        NewMovementLine {
            material_id,
            quantity: Quantity::from_hundredths(hundredths),
            serial_code: serial.map(str::to_string),
        }
    }

    fn movement(lines: Vec<NewMovementLine>) -> NewMovement {
        NewMovement {
            customer_id: 1,
            description: None,
            reservation: None,
            origin_crew_id: None,
            destination_crew_id: None,
            origin_location_id: 1,
            destination_location_id: Some(2),
            movement_type_id: 1,
            lines,
        }
    }

    fn material(serialized: bool) -> Material {
        Material {
            id: 11,
            code: "METER-1".to_string(),
            name: "Meter".to_string(),
            unit_id: 1,
            serialized,
        }
    }

    #[test]
    fn test_material_code() {
        assert!(validate_material_code("CABLE-10").is_ok());
        assert!(validate_material_code("a.b_c").is_ok());
        assert!(validate_material_code("   ").is_err());
        assert!(validate_material_code(&"X".repeat(51)).is_err());
        assert!(validate_material_code("CABLE/10").is_err());
    }

    #[test]
    fn test_quantity_must_be_positive() {
        assert!(validate_quantity(Quantity::from_hundredths(1)).is_ok());
        assert_eq!(
            validate_quantity(Quantity::zero()),
            Err(ValidationError::MustBePositive {
                field: "quantity".to_string()
            })
        );
        assert!(validate_quantity(Quantity::from_units(-3)).is_err());
    }

    #[test]
    fn test_empty_movement_rejected() {
        let err = validate_new_movement(&movement(vec![])).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Required { .. })));
    }

    #[test]
    fn test_zero_quantity_line_rejected() {
        let err = validate_new_movement(&movement(vec![line(10, 3000, None), line(10, 0, None)]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: quantity must be greater than zero"
        );
    }

    #[test]
    fn test_duplicate_serial_rejected() {
        let err = validate_new_movement(&movement(vec![
            line(11, 100, Some("S001")),
            line(11, 100, Some("S001 ")),
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "duplicate serial in movement: S001");
    }

    #[test]
    fn test_same_serial_on_different_materials_allowed() {
        assert!(validate_new_movement(&movement(vec![
            line(11, 100, Some("S001")),
            line(12, 100, Some("S001")),
        ]))
        .is_ok());
    }

    #[test]
    fn test_too_many_lines() {
        let lines = (0..=MAX_MOVEMENT_LINES as i64)
            .map(|i| line(i, 100, None))
            .collect();
        assert!(matches!(
            validate_new_movement(&movement(lines)),
            Err(CoreError::Validation(ValidationError::TooMany { .. }))
        ));
    }

    #[test]
    fn test_line_against_material() {
        assert!(validate_line_for_material(&line(11, 100, Some("S1")), &material(true)).is_ok());
        assert!(validate_line_for_material(&line(11, 500, None), &material(false)).is_ok());
        assert!(matches!(
            validate_line_for_material(&line(11, 100, None), &material(true)),
            Err(SerialError::Missing { .. })
        ));
        assert!(matches!(
            validate_line_for_material(&line(11, 200, Some("S1")), &material(true)),
            Err(SerialError::WrongQuantity { .. })
        ));
        assert!(matches!(
            validate_line_for_material(&line(11, 100, Some("S1")), &material(false)),
            Err(SerialError::NotSerialized { .. })
        ));
    }
}
