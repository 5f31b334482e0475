//! Motor electrical configuration

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::bal_ctrl::{check_positive, BalCtrlError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Electrical constants shared by both drive motors.
#[derive(Debug, Clone, Deserialize)]
pub struct MotorConfig {
    /// Supply (battery) voltage, the largest voltage that can be commanded.
    ///
    /// Units: volts
    pub supply_voltage_v: f64,

    /// Back-EMF constant.
    ///
    /// Units: volts/(radians/second)
    pub back_emf_const: f64,

    /// Torque constant.
    ///
    /// Units: newton meters/amp
    pub torque_const: f64,

    /// Armature resistance.
    ///
    /// Units: ohms
    pub armature_resistance_ohm: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotorConfig {
    /// Check the configuration is physically meaningful.
    pub fn validate(&self) -> Result<(), BalCtrlError> {
        check_positive("supply_voltage_v", self.supply_voltage_v)?;
        check_positive("back_emf_const", self.back_emf_const)?;
        check_positive("torque_const", self.torque_const)?;
        check_positive("armature_resistance_ohm", self.armature_resistance_ohm)
    }

    /// Shaft torque produced when `voltage_v` is applied while the shaft
    /// spins at `velocity_rads`.
    ///
    /// Units: newton meters
    pub fn torque_nm(&self, voltage_v: f64, velocity_rads: f64) -> f64 {
        self.torque_const 
            * (voltage_v - self.back_emf_const * velocity_rads) 
            / self.armature_resistance_ohm
    }
}
