//! Serialized flag toggling against live stock and serial units.

mod common;

use common::{bulk, serial, Fixture};
use obrador_core::{CoreError, HistoryFilter, Quantity, StockFilter};
use obrador_db::ServiceError;

#[tokio::test]
async fn test_cannot_serialize_material_with_stock() {
    let fx = Fixture::new().await;
    fx.intake(vec![bulk(&fx.cable, 5)]).await;

    let err = fx.materials.set_serialized(fx.cable.id, true).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::MaterialHasStock { ref code }) if code == "CABLE-10"
    ));
    assert!(!fx.db.materials().get(fx.cable.id).await.unwrap().unwrap().serialized);
}

#[tokio::test]
async fn test_serialize_material_without_stock() {
    let fx = Fixture::new().await;

    let updated = fx.materials.set_serialized(fx.conduit.id, true).await.unwrap();
    assert!(updated.serialized);
    assert!(fx.db.materials().get(fx.conduit.id).await.unwrap().unwrap().serialized);

    // Lines for it now need a serial.
    fx.intake(vec![serial(&fx.conduit, "CND-1")]).await;
    assert_eq!(fx.count("serial_units").await, 1);
}

#[tokio::test]
async fn test_deserialize_deletes_units_and_keeps_history() {
    let fx = Fixture::new().await;
    let movement_id = fx
        .intake(vec![serial(&fx.meter, "S001"), serial(&fx.meter, "S002")])
        .await;
    assert_eq!(fx.count("movement_line_serials").await, 2);

    let updated = fx.materials.set_serialized(fx.meter.id, false).await.unwrap();
    assert!(!updated.serialized);

    assert!(fx.db.serials().list_for_material(fx.meter.id).await.unwrap().is_empty());
    assert_eq!(fx.count("movement_line_serials").await, 0);

    let history = fx
        .movements
        .get_serial_history(
            &fx.actor,
            &HistoryFilter {
                material_id: Some(fx.meter.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(history.len(), 2);

    let detail = fx.movements.get_movement(&fx.actor, movement_id).await.unwrap();
    assert_eq!(detail.lines[0].serial_code.as_deref(), Some("S001"));
    assert_eq!(detail.lines[0].serial_unit_id, None);

    // The bulk cell that backed the units is now visible.
    let rows = fx
        .movements
        .get_stock_snapshot(
            &fx.actor,
            &StockFilter {
                material_id: Some(fx.meter.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].is_serial);
    assert_eq!(rows[0].quantity, Quantity::from_units(2));
}
