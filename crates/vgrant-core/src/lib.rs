//! vgrant core - domain model and pure logic for virtual grant backup/restore
//!
//! This crate provides:
//! - Credential batch, token, spend status and virtual grant models
//! - The structured `ExError` facility
//! - Schema snapshots and the table swap planner
//! - The restore state machine
//! - The logging facility shared by the store and engine crates
//!
//! Nothing in here talks to a storage engine.

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod restore;
pub mod schema;

// Used by the logging macros
#[doc(hidden)]
pub use vgrant_core_types;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, Result, VgError};
pub use model::{
    group_by_batch, CredentialBatch, CredsBatchStatus, GrantGroup, SpendStatus, Token,
    TriggerType, VirtualGrant,
};
pub use restore::{RestoreMachine, RestorePhase};
pub use schema::{plan_table_swap, SchemaSnapshot, SwapStep, TableSwapPlan, VG_TABLES};
