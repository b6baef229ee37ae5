//! Ambient utilities shared across the crate.

pub mod telemetry;
