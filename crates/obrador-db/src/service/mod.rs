//! # Services
//!
//! Operations that span several repositories and own their transaction.
//!
//! - [`MovementService`](movement::MovementService) - Movement orchestrator, stock and history views
//! - [`MaterialService`](material::MaterialService) - Material creation and the serialized toggle
//!
//! Services return [`ServiceResult`](crate::error::ServiceResult): domain
//! failures are `ServiceError::Domain`, everything else `ServiceError::Db`.

pub mod material;
pub mod movement;
