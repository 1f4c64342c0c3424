//! # Serial Registry
//!
//! Storage for individually tracked units. The lifecycle rules live in
//! `obrador_core::serial`; this module only persists their outcome.
//!
//! A unit is identified by (material, serial code, customer). Units are
//! created by provider intakes, transitioned by every other movement, and
//! only deleted when their material stops being serialized.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use obrador_core::serial::SerialPlacement;
use obrador_core::SerialUnit;

const SELECT_UNIT: &str = r#"
    SELECT id, material_id, serial_code, customer_id, state, active,
           location_id, crew_id, created_at, updated_at
    FROM serial_units
"#;

/// Repository for serial units.
#[derive(Debug, Clone)]
pub struct SerialRegistry {
    pool: SqlitePool,
}

impl SerialRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        SerialRegistry { pool }
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<SerialUnit>> {
        let unit = sqlx::query_as::<_, SerialUnit>(&format!("{SELECT_UNIT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(unit)
    }

    /// Finds a unit by its natural key, outside any unit of work.
    pub async fn find(
        &self,
        material_id: i64,
        serial_code: &str,
        customer_id: i64,
    ) -> DbResult<Option<SerialUnit>> {
        let mut conn = self.pool.acquire().await?;
        Self::lookup(&mut conn, material_id, serial_code, customer_id).await
    }

    /// Lists every unit of a material, oldest first.
    pub async fn list_for_material(&self, material_id: i64) -> DbResult<Vec<SerialUnit>> {
        let units = sqlx::query_as::<_, SerialUnit>(&format!(
            "{SELECT_UNIT} WHERE material_id = ?1 ORDER BY id"
        ))
        .bind(material_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(units)
    }

    // =========================================================================
    // Unit-of-work operations
    // =========================================================================

    pub async fn lookup(
        conn: &mut SqliteConnection,
        material_id: i64,
        serial_code: &str,
        customer_id: i64,
    ) -> DbResult<Option<SerialUnit>> {
        let unit = sqlx::query_as::<_, SerialUnit>(&format!(
            "{SELECT_UNIT} WHERE material_id = ?1 AND serial_code = ?2 AND customer_id = ?3"
        ))
        .bind(material_id)
        .bind(serial_code)
        .bind(customer_id)
        .fetch_optional(conn)
        .await?;
        Ok(unit)
    }

    /// Creates a unit already placed where the movement leaves it.
    pub async fn register(
        conn: &mut SqliteConnection,
        material_id: i64,
        serial_code: &str,
        customer_id: i64,
        placement: &SerialPlacement,
    ) -> DbResult<i64> {
        let now = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO serial_units
                (material_id, serial_code, customer_id, state, active,
                 location_id, crew_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            "#,
        )
        .bind(material_id)
        .bind(serial_code)
        .bind(customer_id)
        .bind(placement.state)
        .bind(placement.active)
        .bind(placement.location_id)
        .bind(placement.crew_id)
        .bind(now)
        .execute(conn)
        .await?
        .last_insert_rowid();

        debug!(serial_unit_id = id, serial_code, state = %placement.state, "Registered serial unit");
        Ok(id)
    }

    /// Moves an existing unit to its new placement.
    pub async fn transition(
        conn: &mut SqliteConnection,
        unit_id: i64,
        placement: &SerialPlacement,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE serial_units
            SET state = ?2, active = ?3, location_id = ?4, crew_id = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(unit_id)
        .bind(placement.state)
        .bind(placement.active)
        .bind(placement.location_id)
        .bind(placement.crew_id)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        debug!(serial_unit_id = unit_id, state = %placement.state, "Serial unit transitioned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use obrador_core::SerialState;

    #[tokio::test]
    async fn test_register_then_transition() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = db.catalog().create_customer("Utility Co").await.unwrap();
        let unit = db.catalog().create_unit("U", "Unit").await.unwrap();
        let meter = db.materials().create("METER-1", "Meter", unit.id, true).await.unwrap();
        let (_, warehouse) = db.locations().create_warehouse("Central").await.unwrap();
        let (_, site) = db.locations().create_site("Obra", customer.id).await.unwrap();
        let crew = db.crews().create("C1", customer.id).await.unwrap();

        let mut uow = db.begin_immediate().await.unwrap();
        let id = SerialRegistry::register(
            uow.conn(),
            meter.id,
            "S001",
            customer.id,
            &SerialPlacement {
                state: SerialState::Available,
                active: true,
                location_id: warehouse.id,
                crew_id: None,
            },
        )
        .await
        .unwrap();
        SerialRegistry::transition(
            uow.conn(),
            id,
            &SerialPlacement {
                state: SerialState::Assigned,
                active: true,
                location_id: site.id,
                crew_id: Some(crew.id),
            },
        )
        .await
        .unwrap();
        uow.commit().await.unwrap();

        let found = db.serials().find(meter.id, "S001", customer.id).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.state, SerialState::Assigned);
        assert_eq!(found.location_id, site.id);
        assert_eq!(found.crew_id, Some(crew.id));
        assert!(db.serials().find(meter.id, "S001", customer.id + 1).await.unwrap().is_none());
    }
}
