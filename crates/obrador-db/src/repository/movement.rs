//! # Movement Repository
//!
//! Movement headers, their lines, and the line ↔ serial unit join.
//!
//! ## Ownership
//! ```text
//! movements ──(cascade)──► movement_lines ──(cascade)──► movement_line_serials
//!                                │                               │
//!                        serial_code snapshot           serial_units (cascade)
//! ```
//! Movements are immutable once written; this module never updates them.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use obrador_core::{Movement, MovementDetail, MovementLine, NewMovement, Quantity};

/// Repository for movements.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Loads a movement with its lines and type code.
    pub async fn get_detail(&self, id: i64) -> DbResult<Option<MovementDetail>> {
        let movement = sqlx::query_as::<_, Movement>(
            r#"
            SELECT id, movement_type_id, origin_location_id, destination_location_id,
                   origin_crew_id, destination_crew_id, customer_id, user_id,
                   description, reservation, created_at
            FROM movements
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(movement) = movement else {
            return Ok(None);
        };

        let movement_type_code: String =
            sqlx::query_scalar("SELECT code FROM movement_types WHERE id = ?1")
                .bind(movement.movement_type_id)
                .fetch_one(&self.pool)
                .await?;

        let lines = sqlx::query_as::<_, MovementLine>(
            r#"
            SELECT l.id, l.movement_id, l.material_id, l.quantity, l.serial_code,
                   j.serial_unit_id
            FROM movement_lines l
            LEFT JOIN movement_line_serials j ON j.movement_line_id = l.id
            WHERE l.movement_id = ?1
            ORDER BY l.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(MovementDetail {
            movement,
            movement_type_code,
            lines,
        }))
    }

    // =========================================================================
    // Unit-of-work operations
    // =========================================================================

    /// Writes the movement header; `user_id` is the acting user.
    pub async fn insert(conn: &mut SqliteConnection, request: &NewMovement, user_id: i64) -> DbResult<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO movements (
                movement_type_id, origin_location_id, destination_location_id,
                origin_crew_id, destination_crew_id, customer_id, user_id,
                description, reservation, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(request.movement_type_id)
        .bind(request.origin_location_id)
        .bind(request.destination_location_id)
        .bind(request.origin_crew_id)
        .bind(request.destination_crew_id)
        .bind(request.customer_id)
        .bind(user_id)
        .bind(request.description.as_deref())
        .bind(request.reservation.as_deref())
        .bind(Utc::now())
        .execute(conn)
        .await?
        .last_insert_rowid();

        debug!(movement_id = id, "Movement header inserted");
        Ok(id)
    }

    /// Writes one line. `serial_code` is stored as a snapshot.
    pub async fn insert_line(
        conn: &mut SqliteConnection,
        movement_id: i64,
        material_id: i64,
        quantity: Quantity,
        serial_code: Option<&str>,
    ) -> DbResult<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO movement_lines (movement_id, material_id, quantity, serial_code)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(movement_id)
        .bind(material_id)
        .bind(quantity)
        .bind(serial_code)
        .execute(conn)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    /// Links a line to the serial unit it moved.
    pub async fn link_serial(conn: &mut SqliteConnection, line_id: i64, serial_unit_id: i64) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO movement_line_serials (movement_line_id, serial_unit_id) VALUES (?1, ?2)",
        )
        .bind(line_id)
        .bind(serial_unit_id)
        .execute(conn)
        .await?;
        Ok(())
    }
}
