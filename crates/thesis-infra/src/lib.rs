//! Thesis Infrastructure Library
//!
//! Shared wiring for applications embedding the proposal wizard:
//! - Telemetry initialization (tracing)
//! - Session bootstrap from environment configuration

pub mod bootstrap;
pub mod telemetry;

pub use bootstrap::WizardEnvironment;
pub use telemetry::{init_telemetry, LogFormat, TelemetryConfig};
