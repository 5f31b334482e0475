//! Simulated equipment
//!
//! Each device just holds the latest sample written into it by the plant.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;

use crate::eqpt::{MotorDriver, Teleop, TiltSensor};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulated teleop link sending a fixed command.
#[derive(Debug, Default, Clone)]
pub struct SimTeleop {
    pub lin_vel_cmd_ms: f64,
    pub yaw_vel_cmd_rads: f64,

    /// Number of times `init` has been called.
    pub num_inits: u32
}

/// Simulated tilt sensor, perfect measurement of the plant.
#[derive(Debug, Default, Clone)]
pub struct SimTilt {
    pub pitch_rad: f64,
    pub pitch_vel_rads: f64,

    /// Number of times `init` has been called.
    pub num_inits: u32
}

/// Simulated wheel motor.
#[derive(Debug, Default, Clone)]
pub struct SimMotor {
    /// Name used in log messages.
    pub name: &'static str,

    pub velocity_rads: f64,

    /// Number of times `init` has been called.
    pub num_inits: u32
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimTeleop {
    pub fn new(lin_vel_cmd_ms: f64, yaw_vel_cmd_rads: f64) -> Self {
        Self {
            lin_vel_cmd_ms,
            yaw_vel_cmd_rads,
            num_inits: 0
        }
    }
}

impl SimMotor {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }
}

impl Teleop for SimTeleop {
    fn init(&mut self) {
        self.num_inits += 1;
        debug!(
            "SimTeleop initialised, command {} m/s, {} rad/s", 
            self.lin_vel_cmd_ms, 
            self.yaw_vel_cmd_rads
        );
    }

    fn get_lin_vel_cmd(&self) -> f64 {
        self.lin_vel_cmd_ms
    }

    fn get_yaw_vel_cmd(&self) -> f64 {
        self.yaw_vel_cmd_rads
    }
}

impl TiltSensor for SimTilt {
    fn init(&mut self) {
        self.num_inits += 1;
        debug!("SimTilt initialised");
    }

    fn get_pitch(&self) -> f64 {
        self.pitch_rad
    }

    fn get_pitch_vel(&self) -> f64 {
        self.pitch_vel_rads
    }
}

impl MotorDriver for SimMotor {
    fn init(&mut self) {
        self.num_inits += 1;
        debug!("SimMotor {} initialised", self.name);
    }

    fn get_velocity(&self) -> f64 {
        self.velocity_rads
    }
}
