//! Core types shared across the vgrant crates
//!
//! - **Schema constants**: canonical field keys and event names for logging
//! - **Sensitive data**: `Sensitive<T>` marker for credential material

pub mod schema;
pub mod sensitive;

pub use sensitive::Sensitive;
