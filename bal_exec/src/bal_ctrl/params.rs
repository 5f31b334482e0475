//! Parameters structure for BalCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use super::BalCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for balance control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {

    // ---- TIMING ----

    /// Frequency at which `update` is called.
    ///
    /// Units: hertz
    pub ctrl_freq_hz: f64,

    /// Allowed deviation of a scheduler supplied period from the nominal
    /// period before it is flagged in the status report.
    ///
    /// Units: seconds
    #[serde(default = "default_period_tolerance_s")]
    pub period_tolerance_s: f64,

    // ---- GEOMETRY ----

    /// The radius of the robot's wheels.
    ///
    /// Units: meters
    pub wheel_radius_m: f64,

    // ---- SAFETY ----

    /// Pitch magnitude above which the robot is considered tipped over and
    /// the motors are cut.
    ///
    /// Units: radians
    pub pitch_max_rad: f64,

    // ---- GAINS ----

    /// Pitch rate error gain.
    ///
    /// Units: volts/(radians/second)
    pub k1: f64,

    /// Pitch error gain.
    ///
    /// Units: volts/radian
    pub k2: f64,

    /// Linear velocity error gain.
    ///
    /// Units: volts/(meters/second)
    pub k3: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// The nominal control period.
    ///
    /// Units: seconds
    pub fn ctrl_period_s(&self) -> f64 {
        1.0 / self.ctrl_freq_hz
    }

    /// Check the parameters describe a usable controller.
    pub fn validate(&self) -> Result<(), BalCtrlError> {
        check_positive("ctrl_freq_hz", self.ctrl_freq_hz)?;
        check_positive("wheel_radius_m", self.wheel_radius_m)?;
        check_positive("pitch_max_rad", self.pitch_max_rad)?;

        if !(self.period_tolerance_s.is_finite() && self.period_tolerance_s >= 0.0) {
            return Err(BalCtrlError::InvalidParam {
                name: "period_tolerance_s",
                value: self.period_tolerance_s,
                reason: "must be finite and non-negative"
            })
        }

        for (name, k) in [("k1", self.k1), ("k2", self.k2), ("k3", self.k3)].iter() {
            if !k.is_finite() {
                return Err(BalCtrlError::InvalidParam {
                    name: *name, value: *k, reason: "must be finite"
                })
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn default_period_tolerance_s() -> f64 {
    0.001
}

/// Ensure `value` is finite and strictly positive.
pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<(), BalCtrlError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    }
    else {
        Err(BalCtrlError::InvalidParam {
            name, value, reason: "must be finite and positive"
        })
    }
}
