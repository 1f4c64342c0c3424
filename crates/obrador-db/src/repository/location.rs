//! # Location Registry
//!
//! Suppliers, warehouses and sites, each paired 1:1 with a Location.
//!
//! ```text
//! create_warehouse("Central")
//!   ┌──────────────── one transaction ────────────────┐
//!   │ INSERT warehouses (name)            → id = 3     │
//!   │ INSERT locations (WAREHOUSE, warehouse_id = 3)   │
//!   └──────────────────────────────────────────────────┘
//! ```
//! The `locations` CHECK constraint rejects any row whose owner reference
//! does not match its kind; UNIQUE owner columns keep the pairing 1:1.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use obrador_core::{Location, LocationKind, Site, Supplier, Warehouse};

const SELECT_LOCATION: &str =
    "SELECT id, kind, supplier_id, warehouse_id, site_id FROM locations";

/// Repository for locations and their owners.
#[derive(Debug, Clone)]
pub struct LocationRepository {
    pool: SqlitePool,
}

impl LocationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LocationRepository { pool }
    }

    /// Creates a supplier and its location.
    pub async fn create_supplier(&self, name: &str) -> DbResult<(Supplier, Location)> {
        let mut tx = self.pool.begin().await?;
        let id = sqlx::query("INSERT INTO suppliers (name) VALUES (?1)")
            .bind(name)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
        let location = insert_location(&mut tx, LocationKind::Supplier, id).await?;
        tx.commit().await?;

        debug!(supplier_id = id, location_id = location.id, "Created supplier");
        Ok((
            Supplier {
                id,
                name: name.to_string(),
            },
            location,
        ))
    }

    /// Creates a warehouse and its location.
    pub async fn create_warehouse(&self, name: &str) -> DbResult<(Warehouse, Location)> {
        let mut tx = self.pool.begin().await?;
        let id = sqlx::query("INSERT INTO warehouses (name) VALUES (?1)")
            .bind(name)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
        let location = insert_location(&mut tx, LocationKind::Warehouse, id).await?;
        tx.commit().await?;

        debug!(warehouse_id = id, location_id = location.id, "Created warehouse");
        Ok((
            Warehouse {
                id,
                name: name.to_string(),
            },
            location,
        ))
    }

    /// Creates a site for `customer_id` and its location.
    pub async fn create_site(&self, name: &str, customer_id: i64) -> DbResult<(Site, Location)> {
        let mut tx = self.pool.begin().await?;
        let id = sqlx::query("INSERT INTO sites (name, customer_id) VALUES (?1, ?2)")
            .bind(name)
            .bind(customer_id)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
        let location = insert_location(&mut tx, LocationKind::Site, id).await?;
        tx.commit().await?;

        debug!(site_id = id, location_id = location.id, "Created site");
        Ok((
            Site {
                id,
                name: name.to_string(),
                customer_id,
            },
            location,
        ))
    }

    /// Gets a location by ID.
    pub async fn get(&self, id: i64) -> DbResult<Option<Location>> {
        let location = sqlx::query_as::<_, Location>(&format!("{SELECT_LOCATION} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(location)
    }

    /// Finds the location owned by a supplier, warehouse or site.
    pub async fn for_owner(&self, kind: LocationKind, owner_id: i64) -> DbResult<Option<Location>> {
        let column = match kind {
            LocationKind::Supplier => "supplier_id",
            LocationKind::Warehouse => "warehouse_id",
            LocationKind::Site => "site_id",
        };
        let location =
            sqlx::query_as::<_, Location>(&format!("{SELECT_LOCATION} WHERE {column} = ?1"))
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(location)
    }

    /// Loads a location inside an open unit of work.
    pub async fn fetch(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Location>> {
        let location = sqlx::query_as::<_, Location>(&format!("{SELECT_LOCATION} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(location)
    }
}

async fn insert_location(
    conn: &mut SqliteConnection,
    kind: LocationKind,
    owner_id: i64,
) -> DbResult<Location> {
    let mut location = Location {
        id: 0,
        kind,
        supplier_id: None,
        warehouse_id: None,
        site_id: None,
    };
    match kind {
        LocationKind::Supplier => location.supplier_id = Some(owner_id),
        LocationKind::Warehouse => location.warehouse_id = Some(owner_id),
        LocationKind::Site => location.site_id = Some(owner_id),
    }

    location.id = sqlx::query(
        "INSERT INTO locations (kind, supplier_id, warehouse_id, site_id) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(location.kind)
    .bind(location.supplier_id)
    .bind(location.warehouse_id)
    .bind(location.site_id)
    .execute(conn)
    .await?
    .last_insert_rowid();

    Ok(location)
}

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use obrador_core::LocationKind;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_each_owner_gets_one_location() {
        let db = db().await;
        let customer = db.catalog().create_customer("Utility Co").await.unwrap();
        let repo = db.locations();

        let (supplier, s_loc) = repo.create_supplier("Cables SA").await.unwrap();
        let (warehouse, w_loc) = repo.create_warehouse("Central").await.unwrap();
        let (site, o_loc) = repo.create_site("Obra Norte", customer.id).await.unwrap();

        assert_eq!(s_loc.supplier_id, Some(supplier.id));
        assert_eq!(w_loc.kind, LocationKind::Warehouse);
        assert_eq!(o_loc.owner_id(), Some(site.id));
        assert!(s_loc.is_consistent() && w_loc.is_consistent() && o_loc.is_consistent());

        let found = repo
            .for_owner(LocationKind::Warehouse, warehouse.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, w_loc);
        assert_eq!(repo.get(o_loc.id).await.unwrap(), Some(o_loc));
        assert_eq!(repo.get(9999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_inconsistent_location_rejected_by_schema() {
        let db = db().await;
        let warehouse_id = sqlx::query("INSERT INTO warehouses (name) VALUES ('Loose')")
            .execute(db.pool())
            .await
            .unwrap()
            .last_insert_rowid();

        let err: DbError = sqlx::query(
            "INSERT INTO locations (kind, supplier_id, warehouse_id, site_id) VALUES ('SITE', NULL, ?1, NULL)",
        )
        .bind(warehouse_id)
        .execute(db.pool())
        .await
        .unwrap_err()
        .into();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
