//! Stock snapshot and serial history reads, scoped to the acting user.

use clap::Args;

use super::{print_json, Context};
use crate::error::ApiError;
use obrador_core::{HistoryFilter, StockFilter};

#[derive(Debug, Clone, Default, Args)]
pub struct StockArgs {
    #[arg(long, help = "Only this material")]
    pub material: Option<i64>,
    #[arg(long, help = "Only this location")]
    pub location: Option<i64>,
    #[arg(long, help = "Only this crew")]
    pub crew: Option<i64>,
    #[arg(long, help = "Only this customer (within the permitted set)")]
    pub customer: Option<i64>,
}

impl From<StockArgs> for StockFilter {
    fn from(args: StockArgs) -> Self {
        StockFilter {
            material_id: args.material,
            location_id: args.location,
            crew_id: args.crew,
            customer_id: args.customer,
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct HistoryArgs {
    #[arg(long, help = "Only this material")]
    pub material: Option<i64>,
    #[arg(long, help = "Only this serial code")]
    pub serial: Option<String>,
    #[arg(long, help = "Only this serial unit id")]
    pub unit: Option<i64>,
    #[arg(long, help = "Only records written by this movement")]
    pub movement: Option<i64>,
}

impl From<HistoryArgs> for HistoryFilter {
    fn from(args: HistoryArgs) -> Self {
        HistoryFilter {
            material_id: args.material,
            serial_code: args.serial,
            serial_unit_id: args.unit,
            movement_id: args.movement,
        }
    }
}

pub async fn snapshot(ctx: &Context, args: StockArgs) -> Result<(), ApiError> {
    let actor = ctx.actor()?;
    let rows = ctx
        .movements()
        .get_stock_snapshot(actor, &args.into())
        .await?;
    print_json(&rows)
}

pub async fn history(ctx: &Context, args: HistoryArgs) -> Result<(), ApiError> {
    let actor = ctx.actor()?;
    let records = ctx
        .movements()
        .get_serial_history(actor, &args.into())
        .await?;
    print_json(&records)
}
