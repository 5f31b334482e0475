//! Simulated wheeled inverted pendulum
//!
//! The model is planar and deliberately simple:
//!
//! - each motor's torque comes from `MotorConfig::torque_nm`, using the wheel
//!   rolling velocity as the shaft speed (body rotation is ignored there),
//! - wheels roll without slip and each carries half the total mass,
//! - the body is a point mass at `com_height_m` above the axle, pushed over
//!   by gravity and the axle acceleration, and pushed back by the motors'
//!   reaction torque,
//! - once the body reaches horizontal it lies on the ground.
//!
//! It is integrated with explicit Euler at the control period.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use serde::Serialize;
use std::f64::consts::FRAC_PI_2;

use super::{SimBalCtrl, SimParams};
use crate::motor_config::MotorConfig;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulated plant.
#[derive(Debug, Clone)]
pub struct Plant {
    params: SimParams,
    motor: MotorConfig,
    wheel_radius_m: f64,

    state: PlantState,
    fallen: bool
}

/// The plant's state vector.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct PlantState {
    /// Units: radians
    pub pitch_rad: f64,

    /// Units: radians/second
    pub pitch_vel_rads: f64,

    /// Left wheel rolling velocity.
    ///
    /// Units: radians/second
    pub wheel_vel_l_rads: f64,

    /// Right wheel rolling velocity.
    ///
    /// Units: radians/second
    pub wheel_vel_r_rads: f64,

    /// Distance travelled by the axle.
    ///
    /// Units: meters
    pub position_m: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Plant {
    /// Create a new plant at rest at the initial pitch.
    pub fn new(params: SimParams, motor: MotorConfig, wheel_radius_m: f64) -> Self {
        let state = PlantState {
            pitch_rad: params.initial_pitch_rad,
            ..Default::default()
        };

        Self {
            params,
            motor,
            wheel_radius_m,
            state,
            fallen: false
        }
    }

    pub fn state(&self) -> &PlantState {
        &self.state
    }

    /// True once the body has hit the ground.
    pub fn has_fallen(&self) -> bool {
        self.fallen
    }

    /// Write the plant's current state into the simulated equipment.
    pub fn write_samples(&self, ctrl: &mut SimBalCtrl) {
        let tilt = ctrl.tilt_mut();
        tilt.pitch_rad = self.state.pitch_rad;
        tilt.pitch_vel_rads = self.state.pitch_vel_rads;

        ctrl.motor_l_mut().velocity_rads = self.state.wheel_vel_l_rads;
        ctrl.motor_r_mut().velocity_rads = self.state.wheel_vel_r_rads;
    }

    /// Advance the plant by `dt_s` seconds with the given motor voltages.
    pub fn step(&mut self, v_l_v: f64, v_r_v: f64, dt_s: f64) {
        let s = self.state;
        let r = self.wheel_radius_m;
        let l = self.params.com_height_m;
        let m_body = self.params.body_mass_kg;

        // Mass seen at the axle, including the wheels' rotational inertia
        let m_total = m_body + 2.0 * self.params.wheel_inertia_kgm2 / (r * r);

        let torque_l = self.motor.torque_nm(v_l_v, s.wheel_vel_l_rads);
        let torque_r = self.motor.torque_nm(v_r_v, s.wheel_vel_r_rads);

        // Each wheel accelerates half the mass
        let accel_l = torque_l / r / (0.5 * m_total);
        let accel_r = torque_r / r / (0.5 * m_total);
        let axle_accel = 0.5 * (accel_l + accel_r);

        let pitch_accel = (self.params.gravity_ms2 * s.pitch_rad.sin()
            - axle_accel * s.pitch_rad.cos()) / l
            - (torque_l + torque_r) / (m_body * l * l);

        let mut next = s;
        next.pitch_vel_rads += pitch_accel * dt_s;
        next.pitch_rad += next.pitch_vel_rads * dt_s;
        next.wheel_vel_l_rads += accel_l / r * dt_s;
        next.wheel_vel_r_rads += accel_r / r * dt_s;
        next.position_m += 0.5 * r * (next.wheel_vel_l_rads + next.wheel_vel_r_rads) * dt_s;

        if next.pitch_rad.abs() >= FRAC_PI_2 {
            next.pitch_rad = FRAC_PI_2.copysign(next.pitch_rad);
            next.pitch_vel_rads = 0.0;

            if !self.fallen {
                info!("Simulated robot has fallen over at {:.3} m", next.position_m);
            }
            self.fallen = true;
        }

        self.state = next;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bal_ctrl::{BalCtrl, Params};
    use crate::sim::{SimMotor, SimTeleop, SimTilt};
    use util::module::State;

    fn plant(initial_pitch_rad: f64) -> Plant {
        Plant::new(
            SimParams {
                body_mass_kg: 1.0,
                com_height_m: 0.1,
                wheel_inertia_kgm2: 0.0001,
                gravity_ms2: 9.81,
                initial_pitch_rad,
                duration_s: 1.0,
                lin_vel_cmd_ms: 0.0,
                yaw_vel_cmd_rads: 0.0
            },
            MotorConfig {
                supply_voltage_v: 12.0,
                back_emf_const: 0.5,
                torque_const: 0.5,
                armature_resistance_ohm: 2.0
            },
            0.04
        )
    }

    #[test]
    fn test_upright_equilibrium() {
        let mut p = plant(0.0);

        for _ in 0..500 {
            p.step(0.0, 0.0, 0.01);
        }

        assert_eq!(*p.state(), PlantState::default());
        assert!(!p.has_fallen());
    }

    #[test]
    fn test_falls_without_control() {
        let mut p = plant(0.05);

        p.step(0.0, 0.0, 0.01);
        assert!(p.state().pitch_rad > 0.05);
        assert!(p.state().pitch_vel_rads > 0.0);

        for _ in 0..500 {
            p.step(0.0, 0.0, 0.01);
        }

        assert!(p.has_fallen());
        assert_eq!(p.state().pitch_rad, FRAC_PI_2);
        assert_eq!(p.state().pitch_vel_rads, 0.0);
    }

    #[test]
    fn test_drive_forward_pitches_back() {
        let mut p = plant(0.0);

        p.step(6.0, 6.0, 0.01);

        let s = p.state();
        assert!(s.wheel_vel_l_rads > 0.0);
        assert_eq!(s.wheel_vel_l_rads, s.wheel_vel_r_rads);
        assert!(s.pitch_vel_rads < 0.0);
        assert!(s.pitch_rad < 0.0);
        assert!(s.position_m > 0.0);
    }

    #[test]
    fn test_shipped_params_balance() {
        let params: Params = util::params::parse(
            include_str!("../../../params/bal_ctrl.toml")
        ).unwrap();
        let motor: MotorConfig = util::params::parse(
            include_str!("../../../params/motor.toml")
        ).unwrap();
        let sim: SimParams = util::params::parse(
            include_str!("../../../params/sim.toml")
        ).unwrap();

        let mut p = Plant::new(sim.clone(), motor.clone(), params.wheel_radius_m);
        let mut ctrl = BalCtrl::new(
            params,
            &motor,
            SimTeleop::new(sim.lin_vel_cmd_ms, sim.yaw_vel_cmd_rads),
            SimTilt::default(),
            SimMotor::new("left"),
            SimMotor::new("right")
        ).unwrap();
        ctrl.init();

        let period_s = ctrl.ctrl_period_s();
        let num_cycles = (sim.duration_s / period_s).round() as u64;

        for _ in 0..num_cycles {
            p.write_samples(&mut ctrl);

            let (_, report) = ctrl.update();
            assert!(!report.tipped_over);
            assert!(!report.non_finite_input);

            p.step(ctrl.get_motor_l_cmd(), ctrl.get_motor_r_cmd(), period_s);
        }

        assert!(!p.has_fallen());
        assert!(p.state().pitch_rad.abs() < 0.01);
        assert!(p.state().pitch_vel_rads.abs() < 0.01);
    }
}
