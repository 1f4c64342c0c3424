//! # History Recorder
//!
//! Append-only audit trail of serial state changes. Rows are never updated
//! or deleted (triggers in the schema abort any attempt), and they carry a
//! snapshot of material and serial code so they outlive their unit.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use obrador_core::{Actor, HistoryFilter, SerialHistoryRecord, SerialState};

/// Input for one history row.
#[derive(Debug, Clone)]
pub struct HistoryEntry<'a> {
    pub serial_unit_id: i64,
    pub material_id: i64,
    pub serial_code: &'a str,
    pub state: SerialState,
    pub location_id: i64,
    pub crew_id: Option<i64>,
    pub movement_type_id: i64,
    pub movement_id: i64,
    pub user_id: i64,
    pub customer_id: i64,
}

/// Repository for serial history.
#[derive(Debug, Clone)]
pub struct HistoryRecorder {
    pool: SqlitePool,
}

impl HistoryRecorder {
    pub fn new(pool: SqlitePool) -> Self {
        HistoryRecorder { pool }
    }

    /// History visible to `actor`, newest first.
    pub async fn query(&self, actor: &Actor, filter: &HistoryFilter) -> DbResult<Vec<SerialHistoryRecord>> {
        if actor.customer_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT id, serial_unit_id, material_id, serial_code, state, location_id,
                   crew_id, movement_type_id, movement_id, user_id, customer_id, recorded_at
            FROM serial_history
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
        if let Some(serial_code) = &filter.serial_code {
            qb.push(" AND serial_code = ").push_bind(serial_code.trim().to_string());
        }
        if let Some(unit_id) = filter.serial_unit_id {
            qb.push(" AND serial_unit_id = ").push_bind(unit_id);
        }
        if let Some(movement_id) = filter.movement_id {
            qb.push(" AND movement_id = ").push_bind(movement_id);
        }
        qb.push(" ORDER BY recorded_at DESC, id DESC");

        let records = qb
            .build_query_as::<SerialHistoryRecord>()
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    /// Appends one record inside an open unit of work.
    pub async fn append(conn: &mut SqliteConnection, entry: &HistoryEntry<'_>) -> DbResult<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO serial_history
                (serial_unit_id, material_id, serial_code, state, location_id, crew_id,
                 movement_type_id, movement_id, user_id, customer_id, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(entry.serial_unit_id)
        .bind(entry.material_id)
        .bind(entry.serial_code)
        .bind(entry.state)
        .bind(entry.location_id)
        .bind(entry.crew_id)
        .bind(entry.movement_type_id)
        .bind(entry.movement_id)
        .bind(entry.user_id)
        .bind(entry.customer_id)
        .bind(Utc::now())
        .execute(conn)
        .await?
        .last_insert_rowid();

        debug!(
            history_id = id,
            serial_unit_id = entry.serial_unit_id,
            state = %entry.state,
            "History appended"
        );
        Ok(id)
    }
}
