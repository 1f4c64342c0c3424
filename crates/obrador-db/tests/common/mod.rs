//! Shared fixture for the movement integration tests.
#![allow(dead_code)]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use obrador_core::ledger::StockCell;
use obrador_core::{
    Actor, Crew, Customer, Location, Material, MovementType, MovementTypeCode, NewMovement,
    NewMovementLine, Quantity,
};
use obrador_db::{Database, DbConfig, MaterialService, MovementService, ServiceError};

pub const USER_ID: i64 = 7;

/// Two customers, one of each location kind (two warehouses and two sites
/// for the main customer), three crews, a bulk and a serialized material.
pub struct Fixture {
    pub db: Database,
    pub movements: MovementService,
    pub materials: MaterialService,
    pub types: Vec<MovementType>,
    pub customer: Customer,
    pub other_customer: Customer,
    pub supplier: Location,
    pub warehouse: Location,
    pub warehouse_b: Location,
    pub site: Location,
    pub site_b: Location,
    pub crew: Crew,
    pub crew_b: Crew,
    pub other_crew: Crew,
    pub cable: Material,
    pub conduit: Material,
    pub meter: Material,
    pub actor: Actor,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_config(DbConfig::in_memory()).await
    }

    pub async fn with_config(config: DbConfig) -> Self {
        let db = Database::new(config).await.unwrap();
        let types = db.catalog().ensure_movement_types().await.unwrap();

        let customer = db.catalog().create_customer("Municipal Utility").await.unwrap();
        let other_customer = db.catalog().create_customer("Private Grid").await.unwrap();
        let meters = db.catalog().create_unit("M", "Meter").await.unwrap();
        let units = db.catalog().create_unit("U", "Unit").await.unwrap();

        let (_, supplier) = db.locations().create_supplier("Electro Supplies").await.unwrap();
        let (_, warehouse) = db.locations().create_warehouse("Central").await.unwrap();
        let (_, warehouse_b) = db.locations().create_warehouse("East").await.unwrap();
        let (_, site) = db.locations().create_site("North Substation", customer.id).await.unwrap();
        let (_, site_b) = db.locations().create_site("South Feeder", customer.id).await.unwrap();

        let crew = db.crews().create("Crew A", customer.id).await.unwrap();
        let crew_b = db.crews().create("Crew B", customer.id).await.unwrap();
        let other_crew = db.crews().create("Crew X", other_customer.id).await.unwrap();

        let cable = db.materials().create("CABLE-10", "Cable 10mm", meters.id, false).await.unwrap();
        let conduit = db.materials().create("CONDUIT-25", "Conduit 25mm", units.id, false).await.unwrap();
        let meter = db.materials().create("METER-1", "Meter", units.id, true).await.unwrap();

        Fixture {
            movements: MovementService::new(db.clone()),
            materials: MaterialService::new(db.clone()),
            db,
            types,
            actor: Actor::new(USER_ID, vec![customer.id]),
            customer,
            other_customer,
            supplier,
            warehouse,
            warehouse_b,
            site,
            site_b,
            crew,
            crew_b,
            other_crew,
            cable,
            conduit,
            meter,
        }
    }

    pub fn type_id(&self, code: MovementTypeCode) -> i64 {
        self.types
            .iter()
            .find(|t| t.code == code.as_str())
            .map(|t| t.id)
            .unwrap()
    }

    /// A movement of the main customer with no lines.
    pub fn movement(&self, code: MovementTypeCode, origin: &Location, destination: Option<&Location>) -> NewMovement {
        NewMovement {
            customer_id: self.customer.id,
            description: None,
            reservation: None,
            origin_crew_id: None,
            destination_crew_id: None,
            origin_location_id: origin.id,
            destination_location_id: destination.map(|d| d.id),
            movement_type_id: self.type_id(code),
            lines: Vec::new(),
        }
    }

    /// Supplier to central warehouse intake.
    pub async fn intake(&self, lines: Vec<NewMovementLine>) -> i64 {
        let mut request = self.movement(MovementTypeCode::ProviderIntake, &self.supplier, Some(&self.warehouse));
        request.lines = lines;
        self.create(&request).await.unwrap()
    }

    /// Central warehouse to `site` under `crew`.
    pub async fn ship(&self, lines: Vec<NewMovementLine>) -> Result<i64, ServiceError> {
        let mut request = self.movement(MovementTypeCode::SiteShipment, &self.warehouse, Some(&self.site));
        request.destination_crew_id = Some(self.crew.id);
        request.lines = lines;
        self.create(&request).await
    }

    pub async fn create(&self, request: &NewMovement) -> Result<i64, ServiceError> {
        self.movements
            .create_movement(&self.actor, request)
            .await
            .map(|created| created.movement_id)
    }

    pub fn cell(&self, material: &Material, location: &Location, crew: Option<&Crew>) -> StockCell {
        StockCell {
            material_id: material.id,
            location_id: location.id,
            crew_id: crew.map(|c| c.id),
            customer_id: self.customer.id,
        }
    }

    pub async fn quantity(&self, material: &Material, location: &Location, crew: Option<&Crew>) -> Quantity {
        self.db.stock().quantity(&self.cell(material, location, crew)).await.unwrap()
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }
}

pub fn bulk(material: &Material, units: i64) -> NewMovementLine {
    NewMovementLine {
        material_id: material.id,
        quantity: Quantity::from_units(units),
        serial_code: None,
    }
}

pub fn serial(material: &Material, serial_code: &str) -> NewMovementLine {
    NewMovementLine {
        material_id: material.id,
        quantity: Quantity::ONE,
        serial_code: Some(serial_code.to_string()),
    }
}

/// A database file path unique to this process and call.
pub fn temp_db_path(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!("obrador-{label}-{}-{nanos}.db", std::process::id()))
}

pub fn remove_db_files(path: &PathBuf) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.clone().into_os_string();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}
