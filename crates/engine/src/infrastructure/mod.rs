//! Infrastructure implementations.
//!
//! Contains port trait implementations and process-level setup.

pub mod claims;
pub mod clock;
pub mod memory;
pub mod ports;
pub mod settings;
pub mod telemetry;
