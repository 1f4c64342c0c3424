//! Material catalog commands.

use tracing::info;

use super::{print_json, Context};
use crate::error::ApiError;

pub async fn create(
    ctx: &Context,
    code: &str,
    name: &str,
    unit_id: i64,
    serialized: bool,
) -> Result<(), ApiError> {
    let material = ctx
        .materials()
        .create_material(code, name, unit_id, serialized)
        .await?;
    info!(material_id = material.id, code = %material.code, "Material created");
    print_json(&material)
}

/// Switching to `false` deletes every serial unit of the material.
pub async fn set_serialized(ctx: &Context, material_id: i64, serialized: bool) -> Result<(), ApiError> {
    let material = ctx.materials().set_serialized(material_id, serialized).await?;
    print_json(&material)
}
