//! Schema and reference-data setup.

use serde::Serialize;
use tracing::info;

use super::{print_json, Context};
use crate::error::ApiError;
use obrador_core::MovementType;
use obrador_db::migrations::migration_status;

#[derive(Debug, Serialize)]
struct MigrationReport {
    total: usize,
    applied: usize,
}

#[derive(Debug, Serialize)]
struct InitReport {
    migrations: MigrationReport,
    movement_types: Vec<MovementType>,
}

async fn migrate_inner(ctx: &Context) -> Result<MigrationReport, ApiError> {
    ctx.db.run_migrations().await?;
    let (total, applied) = migration_status(ctx.db.pool()).await?;
    info!(total, applied, "Schema up to date");
    Ok(MigrationReport { total, applied })
}

/// `obrador migrate`
pub async fn migrate(ctx: &Context) -> Result<(), ApiError> {
    let report = migrate_inner(ctx).await?;
    print_json(&report)
}

/// `obrador init`: migrations plus the eight movement types.
pub async fn init(ctx: &Context) -> Result<(), ApiError> {
    let migrations = migrate_inner(ctx).await?;
    let movement_types = ctx.db.catalog().ensure_movement_types().await?;
    info!(count = movement_types.len(), "Movement types ensured");
    print_json(&InitReport {
        migrations,
        movement_types,
    })
}
