//! # Stock Ledger
//!
//! On-hand bulk quantities per stock cell, and the merged stock view.
//!
//! ## Stock Cell
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ (material, location, crew | NULL, customer) ──► quantity (hundredths) │
//! │                                                                      │
//! │ Warehouse/supplier cells always have crew = NULL (see `crew_key`).   │
//! │ The unique index folds NULL crew to 0 so each cell is one row.       │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write Path (inside a unit of work)
//! - `available`: current quantity, zero when the row is absent
//! - `decrement`: guarded `quantity >= amount`; returns false when the guard
//!   fails, never goes negative (the column also has `CHECK (quantity >= 0)`)
//! - `increment_or_create`: add to the row, or insert it at `amount`

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use obrador_core::ledger::StockCell;
use obrador_core::{Actor, Quantity, StockFilter, StockSnapshotRow};

/// Repository for bulk stock.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

impl StockLedger {
    pub fn new(pool: SqlitePool) -> Self {
        StockLedger { pool }
    }

    /// Current quantity of a cell, read outside any unit of work.
    pub async fn quantity(&self, cell: &StockCell) -> DbResult<Quantity> {
        let mut conn = self.pool.acquire().await?;
        Self::available(&mut conn, cell).await
    }

    /// Merged view of bulk stock and active serial units.
    ///
    /// ## Rows
    /// - one per stock cell with quantity > 0, for non-serialized materials
    /// - one per active serial unit, quantity 1, `is_serial = true`
    ///
    /// Restricted to the actor's customers; sorted by quantity descending,
    /// then material code, then serial code.
    pub async fn snapshot(&self, actor: &Actor, filter: &StockFilter) -> DbResult<Vec<StockSnapshotRow>> {
        if actor.customer_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT material_id, material_code, quantity, location_id, crew_id,
                   customer_id, is_serial, serial_code
            FROM (
                SELECT s.material_id, m.code AS material_code, s.quantity,
                       s.location_id, s.crew_id, s.customer_id,
                       0 AS is_serial, NULL AS serial_code
                FROM stock_entries s
                JOIN materials m ON m.id = s.material_id
                WHERE s.quantity > 0 AND m.serialized = 0
                UNION ALL
                SELECT u.material_id, m.code, "#,
        );
        qb.push_bind(Quantity::ONE);
        qb.push(
            r#",
                       u.location_id, u.crew_id, u.customer_id,
                       1, u.serial_code
                FROM serial_units u
                JOIN materials m ON m.id = u.material_id
                WHERE u.active = 1
            ) AS snapshot
            WHERE customer_id IN ("#,
        );
        let mut customers = qb.separated(", ");
        for id in &actor.customer_ids {
            customers.push_bind(*id);
        }
        customers.push_unseparated(")");

        if let Some(material_id) = filter.material_id {
            qb.push(" AND material_id = ").push_bind(material_id);
        }
        if let Some(location_id) = filter.location_id {
            qb.push(" AND location_id = ").push_bind(location_id);
        }
        if let Some(crew_id) = filter.crew_id {
            qb.push(" AND crew_id = ").push_bind(crew_id);
        }
        if let Some(customer_id) = filter.customer_id {
            qb.push(" AND customer_id = ").push_bind(customer_id);
        }
        qb.push(" ORDER BY quantity DESC, material_code, serial_code");

        let rows = qb
            .build_query_as::<StockSnapshotRow>()
            .fetch_all(&self.pool)
            .await?;

        debug!(rows = rows.len(), "Stock snapshot loaded");
        Ok(rows)
    }

    // =========================================================================
    // Unit-of-work operations
    // =========================================================================

    /// Quantity on hand in `cell`; zero when no row exists.
    pub async fn available(conn: &mut SqliteConnection, cell: &StockCell) -> DbResult<Quantity> {
        let quantity: Option<Quantity> = sqlx::query_scalar(
            r#"
            SELECT quantity FROM stock_entries
            WHERE material_id = ?1 AND location_id = ?2 AND crew_id IS ?3 AND customer_id = ?4
            "#,
        )
        .bind(cell.material_id)
        .bind(cell.location_id)
        .bind(cell.crew_id)
        .bind(cell.customer_id)
        .fetch_optional(conn)
        .await?;

        Ok(quantity.unwrap_or_default())
    }

    /// Removes `amount` from `cell` if at least that much is on hand.
    ///
    /// Returns false, leaving the row untouched, when the guard fails.
    pub async fn decrement(
        conn: &mut SqliteConnection,
        cell: &StockCell,
        amount: Quantity,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE stock_entries
            SET quantity = quantity - ?5, updated_at = ?6
            WHERE material_id = ?1 AND location_id = ?2 AND crew_id IS ?3 AND customer_id = ?4
              AND quantity >= ?5
            "#,
        )
        .bind(cell.material_id)
        .bind(cell.location_id)
        .bind(cell.crew_id)
        .bind(cell.customer_id)
        .bind(amount)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        debug!(
            material_id = cell.material_id,
            location_id = cell.location_id,
            amount = %amount,
            applied = result.rows_affected() == 1,
            "Stock decrement"
        );
        Ok(result.rows_affected() == 1)
    }

    /// Adds `amount` to `cell`, creating the row if needed.
    pub async fn increment_or_create(
        conn: &mut SqliteConnection,
        cell: &StockCell,
        amount: Quantity,
    ) -> DbResult<()> {
        let now = Utc::now();
        let updated = sqlx::query(
            r#"
            UPDATE stock_entries
            SET quantity = quantity + ?5, updated_at = ?6
            WHERE material_id = ?1 AND location_id = ?2 AND crew_id IS ?3 AND customer_id = ?4
            "#,
        )
        .bind(cell.material_id)
        .bind(cell.location_id)
        .bind(cell.crew_id)
        .bind(cell.customer_id)
        .bind(amount)
        .bind(now)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if updated == 0 {
            sqlx::query(
                r#"
                INSERT INTO stock_entries
                    (material_id, location_id, crew_id, customer_id, quantity, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(cell.material_id)
            .bind(cell.location_id)
            .bind(cell.crew_id)
            .bind(cell.customer_id)
            .bind(amount)
            .bind(now)
            .execute(&mut *conn)
            .await?;
        }

        debug!(
            material_id = cell.material_id,
            location_id = cell.location_id,
            amount = %amount,
            created = updated == 0,
            "Stock increment"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    struct Fixture {
        db: Database,
        cell: StockCell,
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = db.catalog().create_customer("Utility Co").await.unwrap();
        let unit = db.catalog().create_unit("M", "Meter").await.unwrap();
        let material = db
            .materials()
            .create("CABLE-10", "Cable", unit.id, false)
            .await
            .unwrap();
        let (_, location) = db.locations().create_warehouse("Central").await.unwrap();
        Fixture {
            db,
            cell: StockCell {
                material_id: material.id,
                location_id: location.id,
                crew_id: None,
                customer_id: customer.id,
            },
        }
    }

    #[tokio::test]
    async fn test_missing_cell_reads_as_zero() {
        let f = fixture().await;
        assert_eq!(f.db.stock().quantity(&f.cell).await.unwrap(), Quantity::zero());
    }

    #[tokio::test]
    async fn test_increment_creates_then_accumulates() {
        let f = fixture().await;
        let mut uow = f.db.begin_immediate().await.unwrap();
        StockLedger::increment_or_create(uow.conn(), &f.cell, Quantity::from_units(30))
            .await
            .unwrap();
        StockLedger::increment_or_create(uow.conn(), &f.cell, Quantity::from_hundredths(250))
            .await
            .unwrap();
        uow.commit().await.unwrap();

        assert_eq!(
            f.db.stock().quantity(&f.cell).await.unwrap(),
            Quantity::from_hundredths(3250)
        );
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_entries")
            .fetch_one(f.db.pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_guarded_decrement_never_goes_negative() {
        let f = fixture().await;
        let mut uow = f.db.begin_immediate().await.unwrap();
        StockLedger::increment_or_create(uow.conn(), &f.cell, Quantity::from_units(30))
            .await
            .unwrap();

        let applied = StockLedger::decrement(uow.conn(), &f.cell, Quantity::from_units(50))
            .await
            .unwrap();
        assert!(!applied);
        assert_eq!(
            StockLedger::available(uow.conn(), &f.cell).await.unwrap(),
            Quantity::from_units(30)
        );

        let applied = StockLedger::decrement(uow.conn(), &f.cell, Quantity::from_units(30))
            .await
            .unwrap();
        assert!(applied);
        assert_eq!(
            StockLedger::available(uow.conn(), &f.cell).await.unwrap(),
            Quantity::zero()
        );
        uow.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_crew_cells_are_distinct() {
        let f = fixture().await;
        let crewless = f.cell;
        let crewed = StockCell {
            crew_id: Some(1),
            ..f.cell
        };
        sqlx::query("INSERT INTO crews (id, name, customer_id) VALUES (1, 'C1', ?1)")
            .bind(f.cell.customer_id)
            .execute(f.db.pool())
            .await
            .unwrap();

        let mut uow = f.db.begin_immediate().await.unwrap();
        StockLedger::increment_or_create(uow.conn(), &crewless, Quantity::from_units(5))
            .await
            .unwrap();
        StockLedger::increment_or_create(uow.conn(), &crewed, Quantity::from_units(7))
            .await
            .unwrap();
        uow.commit().await.unwrap();

        assert_eq!(f.db.stock().quantity(&crewless).await.unwrap(), Quantity::from_units(5));
        assert_eq!(f.db.stock().quantity(&crewed).await.unwrap(), Quantity::from_units(7));
    }

    #[tokio::test]
    async fn test_snapshot_scoped_to_actor_customers() {
        let f = fixture().await;
        let mut uow = f.db.begin_immediate().await.unwrap();
        StockLedger::increment_or_create(uow.conn(), &f.cell, Quantity::from_units(12))
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let own = Actor::new(1, vec![f.cell.customer_id]);
        let rows = f.db.stock().snapshot(&own, &StockFilter::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].material_code, "CABLE-10");
        assert!(!rows[0].is_serial);

        let stranger = Actor::new(2, vec![f.cell.customer_id + 100]);
        assert!(f
            .db
            .stock()
            .snapshot(&stranger, &StockFilter::default())
            .await
            .unwrap()
            .is_empty());
    }
}
