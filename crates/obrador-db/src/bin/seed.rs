//! # Seed Data Generator
//!
//! Populates a database with a small demo inventory for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p obrador-db --bin seed
//!
//! # Specify database path
//! cargo run -p obrador-db --bin seed -- --db ./data/obrador.db
//! ```
//!
//! ## Generated Data
//! - One customer, a supplier, a central warehouse and two sites
//! - One crew with a lead and a helper
//! - Bulk materials (cable, conduit) and one serialized meter
//! - Intakes from the supplier, then a shipment of cable and two meters
//!   to the first site

use std::env;

use obrador_core::{Actor, CrewRole, MovementTypeCode, NewMovement, NewMovementLine, Quantity};
use obrador_db::{Database, DbConfig, MaterialService, MovementService};

const SEED_USER_ID: i64 = 1;

const BULK_MATERIALS: &[(&str, &str, i64)] = &[
    ("CABLE-10", "Copper cable 10mm", 500),
    ("CONDUIT-25", "PVC conduit 25mm", 120),
    ("TAPE-19", "Insulating tape 19mm", 40),
];

const METER_SERIALS: &[&str] = &["MTR-0001", "MTR-0002", "MTR-0003", "MTR-0004", "MTR-0005"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./obrador_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Obrador Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./obrador_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Obrador Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let Some(actor) = seed(&db).await? else {
        println!("⚠ Database already has demo materials");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        db.close().await;
        return Ok(());
    };

    println!();
    let stock = MovementService::new(db.clone())
        .get_stock_snapshot(&actor, &Default::default())
        .await?;
    println!("Stock snapshot ({} rows):", stock.len());
    for row in &stock {
        println!(
            "  {:<12} {:>10}  location {:<3} crew {:<4} {}",
            row.material_code,
            row.quantity,
            row.location_id,
            row.crew_id.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
            row.serial_code.as_deref().unwrap_or("")
        );
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Writes the demo dataset. Returns `None` when it is already present,
/// otherwise the actor that owns it.
async fn seed(db: &Database) -> Result<Option<Actor>, Box<dyn std::error::Error>> {
    if db.materials().get_by_code(BULK_MATERIALS[0].0).await?.is_some() {
        return Ok(None);
    }

    // Reference data
    let types = db.catalog().ensure_movement_types().await?;
    let type_id = |code: MovementTypeCode| {
        types
            .iter()
            .find(|t| t.code == code.as_str())
            .map(|t| t.id)
            .ok_or_else(|| format!("movement type {code} missing"))
    };

    let customer = db.catalog().create_customer("Municipal Utility").await?;
    let unit_m = db.catalog().create_unit("M", "Meter").await?;
    let unit_u = db.catalog().create_unit("U", "Unit").await?;

    let (_, supplier) = db.locations().create_supplier("Electro Supplies").await?;
    let (_, warehouse) = db.locations().create_warehouse("Central Warehouse").await?;
    let (_, site_north) = db.locations().create_site("North Substation", customer.id).await?;
    let (_, _site_south) = db.locations().create_site("South Feeder", customer.id).await?;

    let crew = db.crews().create("Crew A", customer.id).await?;
    let lead = db.catalog().create_personnel("Ana Lead").await?;
    let helper = db.catalog().create_personnel("Bruno Helper").await?;
    db.crews().add_member(crew.id, lead.id, CrewRole::CrewLead).await?;
    db.crews().add_member(crew.id, helper.id, CrewRole::Helper).await?;
    println!("✓ Reference data created");

    // Materials
    let materials = MaterialService::new(db.clone());
    let mut bulk = Vec::new();
    for (code, name, intake) in BULK_MATERIALS {
        let unit_id = if code.starts_with("CABLE") { unit_m.id } else { unit_u.id };
        let material = materials.create_material(code, name, unit_id, false).await?;
        bulk.push((material, *intake));
    }
    let meter = materials
        .create_material("METER-1", "Single-phase meter", unit_u.id, true)
        .await?;
    println!("✓ {} materials created", bulk.len() + 1);

    // Movements
    let actor = Actor::new(SEED_USER_ID, vec![customer.id]);
    let movements = MovementService::new(db.clone());

    let intake = NewMovement {
        customer_id: customer.id,
        description: Some("Initial bulk intake".to_string()),
        reservation: None,
        origin_crew_id: None,
        destination_crew_id: None,
        origin_location_id: supplier.id,
        destination_location_id: Some(warehouse.id),
        movement_type_id: type_id(MovementTypeCode::ProviderIntake)?,
        lines: bulk
            .iter()
            .map(|(material, units)| NewMovementLine {
                material_id: material.id,
                quantity: Quantity::from_units(*units),
                serial_code: None,
            })
            .chain(METER_SERIALS.iter().map(|serial| NewMovementLine {
                material_id: meter.id,
                quantity: Quantity::ONE,
                serial_code: Some(serial.to_string()),
            }))
            .collect(),
    };
    let created = movements.create_movement(&actor, &intake).await?;
    println!("✓ Intake movement #{}", created.movement_id);

    let shipment = NewMovement {
        customer_id: customer.id,
        description: Some("Kit for North Substation".to_string()),
        reservation: Some("RES-0001".to_string()),
        origin_crew_id: None,
        destination_crew_id: Some(crew.id),
        origin_location_id: warehouse.id,
        destination_location_id: Some(site_north.id),
        movement_type_id: type_id(MovementTypeCode::SiteShipment)?,
        lines: vec![
            NewMovementLine {
                material_id: bulk[0].0.id,
                quantity: Quantity::from_hundredths(15_050),
                serial_code: None,
            },
            NewMovementLine {
                material_id: meter.id,
                quantity: Quantity::ONE,
                serial_code: Some(METER_SERIALS[0].to_string()),
            },
            NewMovementLine {
                material_id: meter.id,
                quantity: Quantity::ONE,
                serial_code: Some(METER_SERIALS[1].to_string()),
            },
        ],
    };
    let created = movements.create_movement(&actor, &shipment).await?;
    println!("✓ Shipment movement #{}", created.movement_id);

    Ok(Some(actor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use obrador_core::{SerialState, StockFilter};

    #[tokio::test]
    async fn test_seed_writes_demo_inventory_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let actor = seed(&db).await.unwrap().expect("fresh database is seeded");
        assert!(seed(&db).await.unwrap().is_none());

        let cable = db.materials().get_by_code("CABLE-10").await.unwrap().unwrap();
        let rows = MovementService::new(db.clone())
            .get_stock_snapshot(
                &actor,
                &StockFilter {
                    material_id: Some(cable.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let quantities: Vec<Quantity> = rows.iter().map(|r| r.quantity).collect();
        assert_eq!(
            quantities,
            vec![Quantity::from_hundredths(34_950), Quantity::from_hundredths(15_050)]
        );

        let meter = db.materials().get_by_code("METER-1").await.unwrap().unwrap();
        let units = db.serials().list_for_material(meter.id).await.unwrap();
        assert_eq!(units.len(), METER_SERIALS.len());
        let assigned = units.iter().filter(|u| u.state == SerialState::Assigned).count();
        assert_eq!(assigned, 2);
    }
}
