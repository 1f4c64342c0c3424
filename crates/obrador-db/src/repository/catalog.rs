//! # Catalog Repository
//!
//! Reference tables the movement engine looks things up in: customers,
//! units of measure, personnel and movement types.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use obrador_core::{Customer, MovementType, MovementTypeCode, Personnel, UnitOfMeasure};

/// Repository for reference data.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Customers
    // =========================================================================

    pub async fn create_customer(&self, name: &str) -> DbResult<Customer> {
        let id = sqlx::query("INSERT INTO customers (name) VALUES (?1)")
            .bind(name)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        debug!(customer_id = id, "Created customer");
        Ok(Customer {
            id,
            name: name.to_string(),
        })
    }

    pub async fn get_customer(&self, id: i64) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>("SELECT id, name FROM customers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }

    /// Loads a customer inside an open unit of work.
    pub async fn fetch_customer(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>("SELECT id, name FROM customers WHERE id = ?1")
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(customer)
    }

    // =========================================================================
    // Units of Measure
    // =========================================================================

    pub async fn create_unit(&self, code: &str, name: &str) -> DbResult<UnitOfMeasure> {
        let id = sqlx::query("INSERT INTO units_of_measure (code, name) VALUES (?1, ?2)")
            .bind(code)
            .bind(name)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        Ok(UnitOfMeasure {
            id,
            code: code.to_string(),
            name: name.to_string(),
        })
    }

    pub async fn get_unit(&self, id: i64) -> DbResult<Option<UnitOfMeasure>> {
        let unit = sqlx::query_as::<_, UnitOfMeasure>(
            "SELECT id, code, name FROM units_of_measure WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(unit)
    }

    // =========================================================================
    // Personnel
    // =========================================================================

    pub async fn create_personnel(&self, name: &str) -> DbResult<Personnel> {
        let id = sqlx::query("INSERT INTO personnel (name) VALUES (?1)")
            .bind(name)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        Ok(Personnel {
            id,
            name: name.to_string(),
        })
    }

    // =========================================================================
    // Movement Types
    // =========================================================================

    /// Creates a movement type row.
    ///
    /// Any code is accepted here; codes the rule table does not know are
    /// rejected when a movement uses them.
    pub async fn create_movement_type(&self, code: &str, description: &str) -> DbResult<MovementType> {
        let id = sqlx::query("INSERT INTO movement_types (code, description) VALUES (?1, ?2)")
            .bind(code)
            .bind(description)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        debug!(movement_type_id = id, code, "Created movement type");
        Ok(MovementType {
            id,
            code: code.to_string(),
            description: description.to_string(),
        })
    }

    /// Inserts a row for every recognized movement type that is missing,
    /// then returns all movement types.
    pub async fn ensure_movement_types(&self) -> DbResult<Vec<MovementType>> {
        for code in MovementTypeCode::ALL {
            sqlx::query("INSERT OR IGNORE INTO movement_types (code, description) VALUES (?1, ?2)")
                .bind(code.as_str())
                .bind(describe(code))
                .execute(&self.pool)
                .await?;
        }
        self.list_movement_types().await
    }

    pub async fn list_movement_types(&self) -> DbResult<Vec<MovementType>> {
        let types = sqlx::query_as::<_, MovementType>(
            "SELECT id, code, description FROM movement_types ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(types)
    }

    pub async fn get_movement_type_by_code(&self, code: &str) -> DbResult<Option<MovementType>> {
        let row = sqlx::query_as::<_, MovementType>(
            "SELECT id, code, description FROM movement_types WHERE code = ?1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Loads a movement type inside an open unit of work.
    pub async fn fetch_movement_type(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> DbResult<Option<MovementType>> {
        let row = sqlx::query_as::<_, MovementType>(
            "SELECT id, code, description FROM movement_types WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(row)
    }
}

fn describe(code: MovementTypeCode) -> &'static str {
    match code {
        MovementTypeCode::ProviderIntake => "Intake from supplier into warehouse",
        MovementTypeCode::SiteReturn => "Return from site crew to warehouse",
        MovementTypeCode::SiteShipment => "Shipment from warehouse to site crew",
        MovementTypeCode::SiteConsumption => "Consumption at site",
        MovementTypeCode::SiteToSite => "Transfer between sites",
        MovementTypeCode::WarehouseToWarehouse => "Transfer between warehouses",
        MovementTypeCode::CrewToCrew => "Transfer between crews",
        MovementTypeCode::ProviderReturn => "Return from warehouse to supplier",
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_ensure_movement_types_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let first = catalog.ensure_movement_types().await.unwrap();
        let second = catalog.ensure_movement_types().await.unwrap();
        assert_eq!(first.len(), 8);
        assert_eq!(first, second);

        let intake = catalog
            .get_movement_type_by_code("PROVIDER_INTAKE")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(intake.code, "PROVIDER_INTAKE");
    }

    #[tokio::test]
    async fn test_customer_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let created = db.catalog().create_customer("Utility Co").await.unwrap();
        let loaded = db.catalog().get_customer(created.id).await.unwrap();
        assert_eq!(loaded, Some(created));
    }
}
