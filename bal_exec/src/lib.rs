//! # Balancing robot library.
//!
//! This library allows the executable, benchmarks and any other crates in the
//! workspace to access items defined inside the balancing robot crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Balance control module - converts tilt and wheel feedback into motor voltage commands
pub mod bal_ctrl;

/// Data store - per-cycle data shared between the scheduler and the modules
pub mod data_store;

/// Equipment interfaces - the teleop, tilt sensor and motor driver collaborators
pub mod eqpt;

/// Motor electrical configuration
pub mod motor_config;

/// Simulation - a simplified wheeled inverted pendulum standing in for hardware
pub mod sim;
