//! # Ledger Math
//!
//! Pure helpers the stock ledger and the orchestrator share: crew-key
//! resolution, per-material aggregation and shortfall detection.
//!
//! ## Debit/Credit per Movement
//! ```text
//!   lines ──► aggregate per material ──► MaterialTotals { total, exempt }
//!                                              │
//!              origin debit  = total - exempt  │  (skipped if origin is SUPPLIER)
//!              dest credit   = total           │  (skipped for consumption / provider return)
//! ```

use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult, Shortfall, ValidationError};
use crate::quantity::Quantity;
use crate::types::LocationKind;

/// Crew component of a stock cell key.
///
/// Warehouses and suppliers never key stock by crew, whatever the caller sent.
#[inline]
pub fn crew_key(kind: LocationKind, crew_id: Option<i64>) -> Option<i64> {
    if kind.holds_crew_stock() {
        crew_id
    } else {
        None
    }
}

/// A (material, location, crew, customer) stock cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StockCell {
    pub material_id: i64,
    pub location_id: i64,
    pub crew_id: Option<i64>,
    pub customer_id: i64,
}

/// Line quantities summed for one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialTotals {
    pub material_id: i64,
    pub total: Quantity,
    /// Portion carried by installed-return lines.
    pub exempt: Quantity,
}

impl MaterialTotals {
    /// Amount the origin cell is debited by. `exempt` never exceeds `total`.
    #[inline]
    pub fn debit(&self) -> Quantity {
        self.total - self.exempt
    }
}

/// One line as seen by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerLine {
    pub material_id: i64,
    pub quantity: Quantity,
    pub exempt: bool,
}

fn out_of_range() -> CoreError {
    ValidationError::InvalidFormat {
        field: "quantity".to_string(),
        reason: "is out of range".to_string(),
    }
    .into()
}

/// Sums lines per material, ordered by material id.
///
/// Fails when a per-material sum does not fit a `Quantity`.
pub fn aggregate<I>(lines: I) -> CoreResult<Vec<MaterialTotals>>
where
    I: IntoIterator<Item = LedgerLine>,
{
    let mut by_material: BTreeMap<i64, MaterialTotals> = BTreeMap::new();
    for line in lines {
        let entry = by_material
            .entry(line.material_id)
            .or_insert(MaterialTotals {
                material_id: line.material_id,
                total: Quantity::zero(),
                exempt: Quantity::zero(),
            });
        entry.total = entry
            .total
            .checked_add(line.quantity)
            .ok_or_else(out_of_range)?;
        if line.exempt {
            entry.exempt = entry
                .exempt
                .checked_add(line.quantity)
                .ok_or_else(out_of_range)?;
        }
    }
    Ok(by_material.into_values().collect())
}

/// Quantity a cell holds after receiving `amount`.
pub fn credit(held: Quantity, amount: Quantity) -> CoreResult<Quantity> {
    held.checked_add(amount).ok_or_else(out_of_range)
}

/// Returns a shortfall if `requested` exceeds `available`.
pub fn shortfall(
    material_id: i64,
    material_code: &str,
    available: Quantity,
    requested: Quantity,
) -> Option<Shortfall> {
    (requested > available).then(|| Shortfall {
        material_id,
        material_code: material_code.to_string(),
        available,
        requested,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(material_id: i64, units: i64, exempt: bool) -> LedgerLine {
        LedgerLine {
            material_id,
            quantity: Quantity::from_units(units),
            exempt,
        }
    }

    #[test]
    fn test_crew_key_is_forced_null_off_site() {
        assert_eq!(crew_key(LocationKind::Warehouse, Some(7)), None);
        assert_eq!(crew_key(LocationKind::Supplier, Some(7)), None);
        assert_eq!(crew_key(LocationKind::Site, Some(7)), Some(7));
        assert_eq!(crew_key(LocationKind::Site, None), None);
    }

    #[test]
    fn test_aggregate_sums_per_material() {
        let totals =
            aggregate([line(11, 1, true), line(10, 5, false), line(11, 1, false), line(10, 2, false)])
                .unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].material_id, 10);
        assert_eq!(totals[0].total, Quantity::from_units(7));
        assert_eq!(totals[0].debit(), Quantity::from_units(7));
        assert_eq!(totals[1].total, Quantity::from_units(2));
        assert_eq!(totals[1].exempt, Quantity::ONE);
        assert_eq!(totals[1].debit(), Quantity::ONE);
    }

    #[test]
    fn test_aggregate_rejects_overflowing_sum() {
        let huge = Quantity::from_hundredths(i64::MAX - 1);
        let lines = [
            LedgerLine { material_id: 10, quantity: huge, exempt: false },
            LedgerLine { material_id: 10, quantity: Quantity::from_units(1), exempt: false },
        ];
        match aggregate(lines).unwrap_err() {
            CoreError::Validation(ValidationError::InvalidFormat { field, reason }) => {
                assert_eq!(field, "quantity");
                assert_eq!(reason, "is out of range");
            }
            other => panic!("expected an out-of-range quantity, got {other:?}"),
        }

        // the same amount split across materials is fine
        let lines = [
            LedgerLine { material_id: 10, quantity: huge, exempt: false },
            LedgerLine { material_id: 11, quantity: huge, exempt: true },
        ];
        let totals = aggregate(lines).unwrap();
        assert_eq!(totals[1].debit(), Quantity::zero());
    }

    #[test]
    fn test_credit_rejects_overflow() {
        let held = Quantity::from_units(30);
        assert_eq!(credit(held, Quantity::from_units(5)).unwrap(), Quantity::from_units(35));
        assert!(credit(Quantity::from_hundredths(i64::MAX), Quantity::ONE).is_err());
    }

    #[test]
    fn test_shortfall_only_when_exceeding() {
        let thirty = Quantity::from_units(30);
        assert!(shortfall(10, "CABLE-10", thirty, thirty).is_none());
        let s = shortfall(10, "CABLE-10", thirty, Quantity::from_units(50)).unwrap();
        assert_eq!(s.available, thirty);
        assert_eq!(s.requested, Quantity::from_units(50));
    }
}
