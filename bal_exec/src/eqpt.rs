//! Equipment interfaces
//!
//! BalCtrl only ever reads from its equipment. The drivers behind these
//! traits are expected to keep the latest sample cached so that every getter
//! returns immediately, the control cycle must never block on I/O.
//!
//! Motor demands flow the other way through `BalCtrl::get_motor_l_cmd` and
//! `BalCtrl::get_motor_r_cmd`, which the driver layer applies itself.

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Teleoperation command source.
pub trait Teleop {
    /// Initialise the teleop link.
    fn init(&mut self);

    /// Most recently received forward velocity command.
    ///
    /// Units: meters/second
    fn get_lin_vel_cmd(&self) -> f64;

    /// Most recently received yaw rate command.
    ///
    /// Units: radians/second
    fn get_yaw_vel_cmd(&self) -> f64;
}

/// Body tilt sensor (usually an IMU with its own filtering).
pub trait TiltSensor {
    /// Initialise the sensor.
    fn init(&mut self);

    /// Body pitch from upright, positive when tipping forwards.
    ///
    /// Units: radians
    fn get_pitch(&self) -> f64;

    /// Body pitch rate.
    ///
    /// Units: radians/second
    fn get_pitch_vel(&self) -> f64;
}

/// A single wheel motor driver.
pub trait MotorDriver {
    /// Initialise the driver.
    fn init(&mut self);

    /// Measured wheel angular velocity, positive when driving forwards.
    ///
    /// Units: radians/second
    fn get_velocity(&self) -> f64;
}
