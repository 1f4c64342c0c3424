//! # Movement Service
//!
//! The movement transaction orchestrator: validates a requested transfer,
//! checks stock and serials, and applies every mutation atomically.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_movement(actor, request)                                        │
//! │                                                                         │
//! │  validate payload, customer permitted ─────────────── (no transaction) │
//! │       │                                                                 │
//! │  BEGIN IMMEDIATE ──────────────────────────────────────────────────┐   │
//! │  │ 1. load type, customer, origin, destination                      │   │
//! │  │ 2. rules table (type × kinds × crews)                            │   │
//! │  │ 3. crews exist and belong to the customer                        │   │
//! │  │ 4. materials; per line serial checks (fail-fast)                 │   │
//! │  │ 5. availability per material, unless origin is SUPPLIER          │   │
//! │  │    (all shortfalls collected, then abort)                        │   │
//! │  │ 6. movement header                                               │   │
//! │  │ 7. lines; serial register/transition, join row, history record   │   │
//! │  │ 8. debit origin by (total - exempt); credit destination by total │   │
//! │  └── COMMIT ─── or ─── ROLLBACK on any error ───────────────────────┘   │
//! │       │                                                                 │
//! │  Ok(MovementCreated { movement_id })                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `BEGIN IMMEDIATE` takes the SQLite write lock before step 1, so two
//! movements never both pass step 5 on the same stock cell. The decrement
//! in step 8 is still guarded on `quantity >= amount`.

use std::collections::HashMap;

use sqlx::SqliteConnection;
use tracing::{debug, error, info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::pool::Database;
use crate::repository::catalog::CatalogRepository;
use crate::repository::crew::CrewRepository;
use crate::repository::history::{HistoryEntry, HistoryRecorder};
use crate::repository::location::LocationRepository;
use crate::repository::material::MaterialRepository;
use crate::repository::movement::MovementRepository;
use crate::repository::serial::SerialRegistry;
use crate::repository::stock::StockLedger;
use obrador_core::ledger::{self, LedgerLine, MaterialTotals, StockCell};
use obrador_core::rules::{self, MovementShape};
use obrador_core::serial::{self, SerialPlacement};
use obrador_core::validation::{validate_line_for_material, validate_new_movement};
use obrador_core::{
    Actor, CoreError, HistoryFilter, Location, LocationKind, Material, MovementCreated,
    MovementDetail, MovementTypeCode, NewMovement, NewMovementLine, SerialError,
    SerialHistoryRecord, SerialUnit, Shortfall, StockFilter, StockSnapshotRow,
};

// =============================================================================
// Plan
// =============================================================================

/// How a serialized line resolves against the registry.
#[derive(Debug)]
enum SerialPlan {
    /// Unknown serial on a provider intake; registered on apply.
    Register,
    /// Known unit that may leave the origin.
    Move { unit: SerialUnit, exempt: bool },
}

#[derive(Debug)]
struct PlannedLine<'r> {
    line: &'r NewMovementLine,
    serial: Option<(&'r str, SerialPlan)>,
}

impl PlannedLine<'_> {
    fn exempt(&self) -> bool {
        matches!(self.serial, Some((_, SerialPlan::Move { exempt: true, .. })))
    }
}

/// Everything checked before the first write.
#[derive(Debug)]
struct Plan<'r> {
    code: MovementTypeCode,
    origin: Location,
    destination: Option<Location>,
    lines: Vec<PlannedLine<'r>>,
    totals: Vec<MaterialTotals>,
    materials: HashMap<i64, Material>,
    shortfalls: Vec<Shortfall>,
}

impl Plan<'_> {
    fn origin_cell(&self, request: &NewMovement, material_id: i64) -> StockCell {
        StockCell {
            material_id,
            location_id: self.origin.id,
            crew_id: ledger::crew_key(self.origin.kind, request.origin_crew_id),
            customer_id: request.customer_id,
        }
    }

    fn destination_crew(&self, request: &NewMovement) -> Option<i64> {
        self.destination
            .as_ref()
            .and_then(|d| ledger::crew_key(d.kind, request.destination_crew_id))
    }

    fn material_code(&self, material_id: i64) -> &str {
        self.materials
            .get(&material_id)
            .map_or("", |m| m.code.as_str())
    }

    fn debits_origin(&self) -> bool {
        self.origin.kind != LocationKind::Supplier
    }
}

// =============================================================================
// Service
// =============================================================================

/// Movement orchestrator and the read views that go with it.
#[derive(Debug, Clone)]
pub struct MovementService {
    db: Database,
}

impl MovementService {
    pub fn new(db: Database) -> Self {
        MovementService { db }
    }

    /// Creates a movement, all or nothing.
    ///
    /// ## Errors
    /// - `Domain(Validation)` before any transaction
    /// - `Domain(CustomerNotPermitted)` before any transaction
    /// - `Domain(NotFound | RuleViolation | CrewCustomerMismatch | Serial)` first wins
    /// - `Domain(InsufficientStock)` with every shortfall
    /// - `Db(..)` for anything unexpected
    pub async fn create_movement(
        &self,
        actor: &Actor,
        request: &NewMovement,
    ) -> ServiceResult<MovementCreated> {
        authorize(actor, request)?;

        let mut uow = self.db.begin_immediate().await?;
        let outcome = apply(uow.conn(), actor, request).await;
        match outcome {
            Ok(movement_id) => {
                uow.commit().await?;
                info!(
                    movement_id,
                    user_id = actor.user_id,
                    customer_id = request.customer_id,
                    lines = request.lines.len(),
                    "Movement committed"
                );
                Ok(MovementCreated { movement_id })
            }
            Err(err) => {
                if let Err(rollback_err) = uow.rollback().await {
                    error!(error = %rollback_err, "Rollback failed");
                }
                log_rejection(actor, request, &err);
                Err(err)
            }
        }
    }

    /// Runs the checks of `create_movement` up to the availability pass and
    /// rolls back. Returns every shortfall; empty means the stock is there.
    pub async fn check_availability(
        &self,
        actor: &Actor,
        request: &NewMovement,
    ) -> ServiceResult<Vec<Shortfall>> {
        authorize(actor, request)?;

        let mut uow = self.db.begin_immediate().await?;
        let outcome = prepare(uow.conn(), request).await;
        uow.rollback().await?;

        let plan = outcome?;
        debug!(shortfalls = plan.shortfalls.len(), "Availability checked");
        Ok(plan.shortfalls)
    }

    /// Merged bulk and serial stock visible to the actor.
    pub async fn get_stock_snapshot(
        &self,
        actor: &Actor,
        filter: &StockFilter,
    ) -> ServiceResult<Vec<StockSnapshotRow>> {
        Ok(self.db.stock().snapshot(actor, filter).await?)
    }

    /// Serial history visible to the actor, newest first.
    pub async fn get_serial_history(
        &self,
        actor: &Actor,
        filter: &HistoryFilter,
    ) -> ServiceResult<Vec<SerialHistoryRecord>> {
        Ok(self.db.history().query(actor, filter).await?)
    }

    /// A movement with its lines. Movements of other customers read as
    /// not found.
    pub async fn get_movement(&self, actor: &Actor, id: i64) -> ServiceResult<MovementDetail> {
        match self.db.movements().get_detail(id).await? {
            Some(detail) if actor.may_access(detail.movement.customer_id) => Ok(detail),
            _ => Err(CoreError::not_found("Movement", id).into()),
        }
    }
}

fn authorize(actor: &Actor, request: &NewMovement) -> ServiceResult<()> {
    validate_new_movement(request)?;
    if !actor.may_access(request.customer_id) {
        return Err(CoreError::CustomerNotPermitted {
            customer_id: request.customer_id,
        }
        .into());
    }
    Ok(())
}

fn log_rejection(actor: &Actor, request: &NewMovement, err: &ServiceError) {
    match err {
        ServiceError::Domain(reason) => warn!(
            user_id = actor.user_id,
            customer_id = request.customer_id,
            movement_type_id = request.movement_type_id,
            reason = %reason,
            "Movement rejected, rolled back"
        ),
        ServiceError::Db(cause) => error!(
            user_id = actor.user_id,
            customer_id = request.customer_id,
            error = %cause,
            "Movement failed, rolled back"
        ),
    }
}

// =============================================================================
// Steps 1-5: Plan
// =============================================================================

async fn prepare<'r>(conn: &mut SqliteConnection, request: &'r NewMovement) -> ServiceResult<Plan<'r>> {
    // 1. References
    let movement_type = CatalogRepository::fetch_movement_type(conn, request.movement_type_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Movement type", request.movement_type_id))?;
    CatalogRepository::fetch_customer(conn, request.customer_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Customer", request.customer_id))?;
    let origin = LocationRepository::fetch(conn, request.origin_location_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Location", request.origin_location_id))?;
    let destination = match request.destination_location_id {
        Some(id) => Some(
            LocationRepository::fetch(conn, id)
                .await?
                .ok_or_else(|| CoreError::not_found("Location", id))?,
        ),
        None => None,
    };
    debug!(
        movement_type = %movement_type.code,
        origin_location_id = origin.id,
        destination_location_id = ?destination.as_ref().map(|d| d.id),
        "Movement references loaded"
    );

    // 2. Rules
    let shape = MovementShape {
        origin_location_id: origin.id,
        origin_kind: origin.kind,
        destination: destination.as_ref().map(|d| (d.id, d.kind)),
        origin_crew_id: request.origin_crew_id,
        destination_crew_id: request.destination_crew_id,
    };
    let code = rules::validate(&movement_type.code, &shape)?;
    debug!(code = %code, "Movement rules passed");

    // 3. Crews
    for crew_id in [request.origin_crew_id, request.destination_crew_id]
        .into_iter()
        .flatten()
    {
        let crew = CrewRepository::fetch(conn, crew_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Crew", crew_id))?;
        if crew.customer_id != request.customer_id {
            return Err(CoreError::CrewCustomerMismatch {
                crew_id,
                customer_id: request.customer_id,
            }
            .into());
        }
    }

    // 4. Materials and serials
    let origin_crew = ledger::crew_key(origin.kind, request.origin_crew_id);
    let mut materials: HashMap<i64, Material> = HashMap::new();
    let mut lines = Vec::with_capacity(request.lines.len());
    for line in &request.lines {
        if !materials.contains_key(&line.material_id) {
            let material = MaterialRepository::fetch(conn, line.material_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Material", line.material_id))?;
            materials.insert(material.id, material);
        }
        if let Some(material) = materials.get(&line.material_id) {
            validate_line_for_material(line, material)?;
        }

        let serial = match line.serial() {
            Some(serial_code) => {
                let plan = match SerialRegistry::lookup(
                    conn,
                    line.material_id,
                    serial_code,
                    request.customer_id,
                )
                .await?
                {
                    Some(unit) => {
                        let check = serial::check_at_origin(&unit, code, origin.id, origin_crew)?;
                        SerialPlan::Move {
                            unit,
                            exempt: check.exempt,
                        }
                    }
                    None if code.registers_new_serials() => SerialPlan::Register,
                    None => {
                        return Err(SerialError::NotFound {
                            serial_code: serial_code.to_string(),
                        }
                        .into())
                    }
                };
                Some((serial_code, plan))
            }
            None => None,
        };
        lines.push(PlannedLine { line, serial });
    }
    debug!(materials = materials.len(), "Lines resolved");

    let totals = ledger::aggregate(lines.iter().map(|p| LedgerLine {
        material_id: p.line.material_id,
        quantity: p.line.quantity,
        exempt: p.exempt(),
    }))?;

    let mut plan = Plan {
        code,
        origin,
        destination,
        lines,
        totals,
        materials,
        shortfalls: Vec::new(),
    };

    // 5. Availability
    if plan.debits_origin() {
        let mut shortfalls = Vec::new();
        for totals in &plan.totals {
            let debit = totals.debit();
            if !debit.is_positive() {
                continue;
            }
            let cell = plan.origin_cell(request, totals.material_id);
            let available = StockLedger::available(conn, &cell).await?;
            if let Some(s) =
                ledger::shortfall(totals.material_id, plan.material_code(totals.material_id), available, debit)
            {
                shortfalls.push(s);
            }
        }
        plan.shortfalls = shortfalls;
    }

    Ok(plan)
}

// =============================================================================
// Steps 6-8: Apply
// =============================================================================

async fn apply(conn: &mut SqliteConnection, actor: &Actor, request: &NewMovement) -> ServiceResult<i64> {
    let plan = prepare(conn, request).await?;
    if !plan.shortfalls.is_empty() {
        return Err(CoreError::InsufficientStock {
            shortfalls: plan.shortfalls,
        }
        .into());
    }

    // 6. Header
    let movement_id = MovementRepository::insert(conn, request, actor.user_id).await?;

    // 7. Lines, serials, history
    let destination_id = plan.destination.as_ref().map(|d| d.id);
    let destination_crew = plan.destination_crew(request);
    for planned in &plan.lines {
        let line = planned.line;
        let serial_code = planned.serial.as_ref().map(|(s, _)| *s);
        let line_id =
            MovementRepository::insert_line(conn, movement_id, line.material_id, line.quantity, serial_code)
                .await?;

        let Some((serial_code, serial_plan)) = &planned.serial else {
            continue;
        };
        let (unit_id, placement): (i64, SerialPlacement) = match serial_plan {
            SerialPlan::Register => {
                let placement =
                    serial::place(plan.code, plan.origin.id, None, destination_id, destination_crew);
                let id = SerialRegistry::register(
                    conn,
                    line.material_id,
                    serial_code,
                    request.customer_id,
                    &placement,
                )
                .await?;
                (id, placement)
            }
            SerialPlan::Move { unit, .. } => {
                let placement = serial::place(
                    plan.code,
                    unit.location_id,
                    unit.crew_id,
                    destination_id,
                    destination_crew,
                );
                SerialRegistry::transition(conn, unit.id, &placement).await?;
                (unit.id, placement)
            }
        };

        MovementRepository::link_serial(conn, line_id, unit_id).await?;
        HistoryRecorder::append(
            conn,
            &HistoryEntry {
                serial_unit_id: unit_id,
                material_id: line.material_id,
                serial_code,
                state: placement.state,
                location_id: placement.location_id,
                crew_id: placement.crew_id,
                movement_type_id: request.movement_type_id,
                movement_id,
                user_id: actor.user_id,
                customer_id: request.customer_id,
            },
        )
        .await?;
    }
    debug!(movement_id, lines = plan.lines.len(), "Lines written");

    // 8. Ledger
    for totals in &plan.totals {
        let debit = totals.debit();
        if plan.debits_origin() && debit.is_positive() {
            let cell = plan.origin_cell(request, totals.material_id);
            if !StockLedger::decrement(conn, &cell, debit).await? {
                let available = StockLedger::available(conn, &cell).await?;
                return Err(CoreError::InsufficientStock {
                    shortfalls: ledger::shortfall(
                        totals.material_id,
                        plan.material_code(totals.material_id),
                        available,
                        debit,
                    )
                    .into_iter()
                    .collect(),
                }
                .into());
            }
        }

        if let (true, Some(destination)) = (plan.code.credits_destination(), &plan.destination) {
            let cell = StockCell {
                material_id: totals.material_id,
                location_id: destination.id,
                crew_id: destination_crew,
                customer_id: request.customer_id,
            };
            let held = StockLedger::available(conn, &cell).await?;
            ledger::credit(held, totals.total)?;
            StockLedger::increment_or_create(conn, &cell, totals.total).await?;
        }
    }
    debug!(movement_id, materials = plan.totals.len(), "Ledger updated");

    Ok(movement_id)
}
