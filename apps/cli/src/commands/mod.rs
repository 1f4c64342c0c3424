//! # CLI Commands
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── Context + JSON output
//! ├── admin.rs     ◄─── migrate, init
//! ├── movement.rs  ◄─── movement create / check / show / types
//! ├── stock.rs     ◄─── stock snapshot, serial history
//! └── material.rs  ◄─── material create / set-serialized
//! ```
//!
//! Every handler returns `Result<(), ApiError>` and prints one JSON
//! document on success; `main` prints the `ApiError` on failure.

pub mod admin;
pub mod material;
pub mod movement;
pub mod stock;

use serde::Serialize;

use crate::error::ApiError;
use obrador_core::Actor;
use obrador_db::{Database, MaterialService, MovementService};

/// What every handler gets.
pub struct Context {
    pub db: Database,
    actor: Option<Actor>,
}

impl Context {
    pub fn new(db: Database, actor: Option<Actor>) -> Self {
        Context { db, actor }
    }

    /// The acting user; required by movement and read commands.
    pub fn actor(&self) -> Result<&Actor, ApiError> {
        self.actor.as_ref().ok_or_else(|| {
            ApiError::validation("An acting user is required: pass --user or set actor.user_id")
        })
    }

    pub fn movements(&self) -> MovementService {
        MovementService::new(self.db.clone())
    }

    pub fn materials(&self) -> MaterialService {
        MaterialService::new(self.db.clone())
    }
}

/// Writes `value` to stdout as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), ApiError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
