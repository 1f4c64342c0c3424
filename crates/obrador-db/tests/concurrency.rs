//! Concurrent movements against one stock cell on a file-backed database.

mod common;

use std::time::Duration;

use common::{bulk, remove_db_files, temp_db_path, Fixture};
use obrador_core::{CoreError, MovementTypeCode, Quantity};
use obrador_db::{DbConfig, ServiceError};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_shipments_never_oversell() {
    let path = temp_db_path("oversell");
    let config = DbConfig::new(&path)
        .max_connections(6)
        .busy_timeout(Duration::from_secs(30));
    let fx = Fixture::with_config(config).await;
    fx.intake(vec![bulk(&fx.cable, 10)]).await;

    let mut request = fx.movement(MovementTypeCode::SiteShipment, &fx.warehouse, Some(&fx.site));
    request.destination_crew_id = Some(fx.crew.id);
    request.lines = vec![bulk(&fx.cable, 3)];

    let mut handles = Vec::new();
    for _ in 0..5 {
        let service = fx.movements.clone();
        let actor = fx.actor.clone();
        let request = request.clone();
        handles.push(tokio::spawn(async move {
            service.create_movement(&actor, &request).await
        }));
    }

    let mut committed = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => committed += 1,
            Err(ServiceError::Domain(CoreError::InsufficientStock { .. })) => refused += 1,
            Err(other) => panic!("unexpected failure: {other}"),
        }
    }

    assert_eq!(committed, 3);
    assert_eq!(refused, 2);
    assert_eq!(fx.quantity(&fx.cable, &fx.warehouse, None).await, Quantity::from_units(1));
    assert_eq!(fx.quantity(&fx.cable, &fx.site, Some(&fx.crew)).await, Quantity::from_units(9));
    assert_eq!(fx.count("movements").await, 1 + 3);

    fx.db.close().await;
    remove_db_files(&path);
}
