//! Canonical schema constants for structured logging
//!
//! Event names emitted by the logging macros and the field keys the test
//! capture layer reads them back by.

// Field keys every operation event carries
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
