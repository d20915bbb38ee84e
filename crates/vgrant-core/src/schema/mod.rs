//! Captured schema text and the table swap planned from it.
//!
//! A restore never hard-codes the table layout: it captures the creation
//! statements from the engine catalog immediately before the swap and
//! replays them verbatim, so the rebuilt structure matches whatever schema
//! version the store is on.

pub mod snapshot;
pub mod swap;

pub use snapshot::{SchemaSnapshot, VG_TABLES};
pub use swap::{plan_table_swap, renamed_table_name, SwapStep, TableSwapPlan};
