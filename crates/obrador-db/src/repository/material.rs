//! # Material Repository
//!
//! Material rows and the primitives behind toggling `serialized`.
//! The toggle itself (with its side effects) is `MaterialService::set_serialized`.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use obrador_core::Material;

const SELECT_MATERIAL: &str = "SELECT id, code, name, unit_id, serialized FROM materials";

/// Repository for materials.
#[derive(Debug, Clone)]
pub struct MaterialRepository {
    pool: SqlitePool,
}

impl MaterialRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MaterialRepository { pool }
    }

    /// Inserts a material. Fails with `UniqueViolation` on a repeated code.
    pub async fn create(
        &self,
        code: &str,
        name: &str,
        unit_id: i64,
        serialized: bool,
    ) -> DbResult<Material> {
        let id = sqlx::query(
            "INSERT INTO materials (code, name, unit_id, serialized) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(code)
        .bind(name)
        .bind(unit_id)
        .bind(serialized)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        debug!(material_id = id, code, serialized, "Created material");
        Ok(Material {
            id,
            code: code.to_string(),
            name: name.to_string(),
            unit_id,
            serialized,
        })
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<Material>> {
        let material = sqlx::query_as::<_, Material>(&format!("{SELECT_MATERIAL} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(material)
    }

    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Material>> {
        let material =
            sqlx::query_as::<_, Material>(&format!("{SELECT_MATERIAL} WHERE code = ?1"))
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;
        Ok(material)
    }

    // =========================================================================
    // Unit-of-work operations
    // =========================================================================

    /// Loads a material inside an open unit of work.
    pub async fn fetch(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Material>> {
        let material = sqlx::query_as::<_, Material>(&format!("{SELECT_MATERIAL} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(material)
    }

    /// True if any stock cell holds a positive quantity of the material.
    pub async fn has_stock(conn: &mut SqliteConnection, id: i64) -> DbResult<bool> {
        let held: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM stock_entries WHERE material_id = ?1 AND quantity > 0)",
        )
        .bind(id)
        .fetch_one(conn)
        .await?;
        Ok(held)
    }

    pub async fn update_serialized(
        conn: &mut SqliteConnection,
        id: i64,
        serialized: bool,
    ) -> DbResult<()> {
        sqlx::query("UPDATE materials SET serialized = ?2 WHERE id = ?1")
            .bind(id)
            .bind(serialized)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Deletes every serial unit of the material. Join rows cascade;
    /// movement lines and history keep their snapshots.
    pub async fn delete_serial_units(conn: &mut SqliteConnection, id: i64) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM serial_units WHERE material_id = ?1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let unit = db.catalog().create_unit("M", "Meter").await.unwrap();
        let repo = db.materials();

        let cable = repo.create("CABLE-10", "Cable 10mm", unit.id, false).await.unwrap();
        assert_eq!(repo.get_by_code("CABLE-10").await.unwrap(), Some(cable));

        let err = repo
            .create("CABLE-10", "Again", unit.id, false)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
