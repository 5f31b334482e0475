//! Simulation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::bal_ctrl::{check_positive, BalCtrlError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the simulated robot.
#[derive(Debug, Clone, Deserialize)]
pub struct SimParams {

    // ---- PHYSICAL ----

    /// Mass of the body (everything except the wheels).
    ///
    /// Units: kilograms
    pub body_mass_kg: f64,

    /// Height of the body's centre of mass above the wheel axle.
    ///
    /// Units: meters
    pub com_height_m: f64,

    /// Rotational inertia of one wheel about its axle, including the motor
    /// rotor.
    ///
    /// Units: kilogram meters^2
    pub wheel_inertia_kgm2: f64,

    /// Units: meters/second^2
    #[serde(default = "default_gravity_ms2")]
    pub gravity_ms2: f64,

    // ---- SCENARIO ----

    /// Pitch of the body at the start of the run.
    ///
    /// Units: radians
    pub initial_pitch_rad: f64,

    /// Length of the run.
    ///
    /// Units: seconds
    pub duration_s: f64,

    /// Constant forward velocity command sent by the simulated teleop.
    ///
    /// Units: meters/second
    #[serde(default)]
    pub lin_vel_cmd_ms: f64,

    /// Constant yaw rate command sent by the simulated teleop.
    ///
    /// Units: radians/second
    #[serde(default)]
    pub yaw_vel_cmd_rads: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimParams {
    /// Check the parameters describe a physical robot and a runnable scenario.
    pub fn validate(&self) -> Result<(), BalCtrlError> {
        check_positive("body_mass_kg", self.body_mass_kg)?;
        check_positive("com_height_m", self.com_height_m)?;
        check_positive("gravity_ms2", self.gravity_ms2)?;
        check_positive("duration_s", self.duration_s)?;

        if !(self.wheel_inertia_kgm2.is_finite() && self.wheel_inertia_kgm2 >= 0.0) {
            return Err(BalCtrlError::InvalidParam {
                name: "wheel_inertia_kgm2",
                value: self.wheel_inertia_kgm2,
                reason: "must be finite and non-negative"
            })
        }

        for (name, v) in [
            ("initial_pitch_rad", self.initial_pitch_rad),
            ("lin_vel_cmd_ms", self.lin_vel_cmd_ms),
            ("yaw_vel_cmd_rads", self.yaw_vel_cmd_rads)
        ].iter() {
            if !v.is_finite() {
                return Err(BalCtrlError::InvalidParam {
                    name: *name, value: *v, reason: "must be finite"
                })
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn default_gravity_ms2() -> f64 {
    9.81
}
