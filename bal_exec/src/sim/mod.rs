//! Simulation module
//!
//! Stands in for the real robot: a simplified planar wheeled inverted
//! pendulum driven by the motor model, and cached-sample devices which feed
//! its state to BalCtrl through the equipment interfaces.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod devices;
mod params;
mod plant;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use devices::*;
pub use params::*;
pub use plant::*;

use crate::bal_ctrl::BalCtrl;

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// BalCtrl running on simulated equipment.
pub type SimBalCtrl = BalCtrl<SimTeleop, SimTilt, SimMotor>;
