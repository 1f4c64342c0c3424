//! # Movement Commands
//!
//! ```text
//! obrador movement create --file m.json     ──► {"movement_id": 42}
//! obrador movement check  --file m.json     ──► {"ok": false, "shortfalls": [...]}
//! obrador movement show 42                  ──► movement + lines
//! obrador movement types                    ──► configured movement types
//! ```
//!
//! `--file -` reads the payload from stdin.

use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use super::{print_json, Context};
use crate::error::ApiError;
use obrador_core::{NewMovement, Shortfall};

#[derive(Debug, Serialize)]
struct AvailabilityReport {
    ok: bool,
    shortfalls: Vec<Shortfall>,
}

/// Reads a movement payload from a file, or stdin for `-`.
pub fn read_payload(path: &Path) -> Result<NewMovement, ApiError> {
    let contents = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(path)?
    };
    parse_payload(&contents)
}

pub fn parse_payload(contents: &str) -> Result<NewMovement, ApiError> {
    let request: NewMovement = serde_json::from_str(contents)?;
    debug!(lines = request.lines.len(), "Movement payload parsed");
    Ok(request)
}

pub async fn create(ctx: &Context, file: &Path) -> Result<(), ApiError> {
    let actor = ctx.actor()?;
    let request = read_payload(file)?;
    let created = ctx.movements().create_movement(actor, &request).await?;
    info!(movement_id = created.movement_id, "Movement created");
    print_json(&created)
}

pub async fn check(ctx: &Context, file: &Path) -> Result<(), ApiError> {
    let actor = ctx.actor()?;
    let request = read_payload(file)?;
    let shortfalls = ctx.movements().check_availability(actor, &request).await?;
    print_json(&AvailabilityReport {
        ok: shortfalls.is_empty(),
        shortfalls,
    })
}

pub async fn show(ctx: &Context, id: i64) -> Result<(), ApiError> {
    let actor = ctx.actor()?;
    let detail = ctx.movements().get_movement(actor, id).await?;
    print_json(&detail)
}

pub async fn types(ctx: &Context) -> Result<(), ApiError> {
    let types = ctx.db.catalog().list_movement_types().await?;
    print_json(&types)
}
