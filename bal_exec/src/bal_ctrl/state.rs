//! Implementations for the BalCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace, warn};
use serde::Serialize;

// Internal
use super::{BalCtrlError, ClampLimiter, Params};
use crate::{
    eqpt::{MotorDriver, Teleop, TiltSensor},
    motor_config::MotorConfig
};
use util::{maths::clamp, module::State};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Balance control module state.
///
/// Owns the equipment it reads from. Between cycles the driver layer refreshes
/// the equipment's cached samples through the `*_mut` accessors and applies
/// the motor demands from `get_motor_l_cmd` and `get_motor_r_cmd`.
pub struct BalCtrl<T, S, M> {

    params: Params,

    /// Half the wheel radius, scales the wheel speed sum to body speed.
    half_wheel_radius_m: f64,

    /// Supply voltage bound.
    supply_voltage_v: f64,

    volt_limiter: ClampLimiter,

    teleop: T,
    tilt: S,
    motor_l: M,
    motor_r: M,

    init_complete: bool,

    lin_vel_ms: f64,
    lin_vel_cmd_ms: f64,
    yaw_vel_cmd_rads: f64,
    v_cmd_l_v: f64,
    v_cmd_r_v: f64,

    /// Whether the cutoff was active last cycle, only used to log transitions.
    cutoff_active: bool
}

/// Output of one BalCtrl cycle, to be applied by the motor drivers.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct OutputData {
    /// Estimated forward velocity of the body.
    ///
    /// Units: meters/second
    pub lin_vel_ms: f64,

    /// Left motor voltage demand.
    ///
    /// Units: volts
    pub v_cmd_l_v: f64,

    /// Right motor voltage demand.
    ///
    /// Units: volts
    pub v_cmd_r_v: f64
}

/// Status report for BalCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct StatusReport {
    /// `update` was called before `init`, motors held at zero.
    pub not_initialised: bool,

    /// The period given by the scheduler differed from the nominal control
    /// period by more than the tolerance.
    pub off_nominal_period: bool,

    /// A sensor reading or the velocity estimate was NaN or infinite, motors
    /// cut.
    pub non_finite_input: bool,

    /// The feedback law demanded more than the supply voltage.
    pub v_avg_saturated: bool,

    /// Pitch exceeded the tip-over limit, motors cut.
    pub tipped_over: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T, S, M> State for BalCtrl<T, S, M>
where
    T: Teleop,
    S: TiltSensor,
    M: MotorDriver
{
    type OutputData = OutputData;
    type StatusReport = StatusReport;

    /// Initialise the equipment used by BalCtrl.
    ///
    /// Only the first call does anything.
    fn init(&mut self) {
        if self.init_complete {
            return;
        }

        self.teleop.init();
        self.tilt.init();
        self.motor_l.init();
        self.motor_r.init();

        self.init_complete = true;

        info!(
            "BalCtrl initialised ({} Hz, pitch limit {} rad, supply {} V)",
            self.params.ctrl_freq_hz,
            self.params.pitch_max_rad,
            self.supply_voltage_v
        );
    }

    /// Perform one control cycle.
    ///
    /// Must be called exactly once per control period, see
    /// `update_with_period` if the scheduler cannot guarantee this.
    fn update(&mut self) -> (OutputData, StatusReport) {
        self.update_with_period(self.params.ctrl_period_s())
    }
}

impl<T, S, M> BalCtrl<T, S, M>
where
    T: Teleop,
    S: TiltSensor,
    M: MotorDriver
{
    /// Build a new controller around the given equipment.
    ///
    /// The equipment is not initialised until `init` is called.
    pub fn new(
        params: Params,
        motor_config: &MotorConfig,
        teleop: T,
        tilt: S,
        motor_l: M,
        motor_r: M
    ) -> Result<Self, BalCtrlError> {
        params.validate()?;
        motor_config.validate()?;

        Ok(Self {
            half_wheel_radius_m: params.wheel_radius_m / 2.0,
            supply_voltage_v: motor_config.supply_voltage_v,
            volt_limiter: ClampLimiter::new(motor_config.supply_voltage_v),
            params,
            teleop,
            tilt,
            motor_l,
            motor_r,
            init_complete: false,
            lin_vel_ms: 0.0,
            lin_vel_cmd_ms: 0.0,
            yaw_vel_cmd_rads: 0.0,
            v_cmd_l_v: 0.0,
            v_cmd_r_v: 0.0,
            cutoff_active: false
        })
    }

    /// Perform one control cycle with an explicit period from the scheduler.
    ///
    /// The feedback law is tuned for the nominal control period. A period
    /// outside the tolerance is reported but otherwise processed as normal,
    /// behaviour under variable rate invocation is not verified.
    pub fn update_with_period(&mut self, dt_s: f64) -> (OutputData, StatusReport) {
        let mut report = StatusReport::default();

        if !self.init_complete {
            warn!("BalCtrl updated before initialisation, holding motors at zero");
            report.not_initialised = true;
            self.set_motor_cmds(0.0);
            return (self.output(), report);
        }

        if !((dt_s - self.params.ctrl_period_s()).abs() <= self.params.period_tolerance_s) {
            report.off_nominal_period = true;
        }

        // Teleop commands are stored but don't feed the law yet
        self.lin_vel_cmd_ms = self.teleop.get_lin_vel_cmd();
        self.yaw_vel_cmd_rads = self.teleop.get_yaw_vel_cmd();

        // Estimate linear velocity
        self.lin_vel_ms = self.half_wheel_radius_m
            * (self.motor_l.get_velocity() + self.motor_r.get_velocity());

        let pitch_rad = self.tilt.get_pitch();
        let pitch_vel_rads = self.tilt.get_pitch_vel();

        // Bad data is treated as a tip over
        if !(pitch_rad.is_finite() && pitch_vel_rads.is_finite() && self.lin_vel_ms.is_finite()) {
            if !self.cutoff_active {
                warn!(
                    "Non-finite input (pitch {}, pitch rate {}, lin vel {}), motors disabled",
                    pitch_rad, pitch_vel_rads, self.lin_vel_ms
                );
            }
            report.non_finite_input = true;
            self.cutoff_active = true;
            self.set_motor_cmds(0.0);
            return (self.output(), report);
        }

        // Pitch-velocity state feedback, all setpoints zero
        let v_avg = self.params.k1 * (0.0 - pitch_vel_rads)
            + self.params.k2 * (0.0 - pitch_rad)
            + self.params.k3 * (0.0 - self.lin_vel_ms);

        // Finite inputs can still overflow the law
        if !v_avg.is_finite() {
            if !self.cutoff_active {
                warn!("Non-finite voltage demand ({}), motors disabled", v_avg);
            }
            report.non_finite_input = true;
            self.cutoff_active = true;
            self.set_motor_cmds(0.0);
            return (self.output(), report);
        }

        // Clamp the voltage within the supply limits
        let v_avg_clamped = clamp(&v_avg, &-self.supply_voltage_v, &self.supply_voltage_v);
        report.v_avg_saturated = v_avg_clamped != v_avg;

        // Motor voltage commands, the limiter is stateless so sharing it is
        // fine
        self.v_cmd_l_v = self.volt_limiter.update(v_avg_clamped);
        self.v_cmd_r_v = self.volt_limiter.update(v_avg_clamped);

        // Disable motors if tipped over
        let tipped_over = pitch_rad.abs() > self.params.pitch_max_rad;
        if tipped_over {
            report.tipped_over = true;
            self.set_motor_cmds(0.0);
        }

        if tipped_over && !self.cutoff_active {
            warn!("Tip over detected (pitch {:.3} rad), motors disabled", pitch_rad);
        }
        else if !tipped_over && self.cutoff_active {
            info!("Pitch back within limits ({:.3} rad), motors re-enabled", pitch_rad);
        }
        self.cutoff_active = tipped_over;

        trace!(
            "BalCtrl output: lin_vel {:.4} m/s, v_cmd [{:.3}, {:.3}] V",
            self.lin_vel_ms, self.v_cmd_l_v, self.v_cmd_r_v
        );

        (self.output(), report)
    }

    /// Estimated forward linear velocity.
    ///
    /// Units: meters/second
    pub fn get_lin_vel(&self) -> f64 {
        self.lin_vel_ms
    }

    /// Left motor voltage command.
    ///
    /// Units: volts
    pub fn get_motor_l_cmd(&self) -> f64 {
        self.v_cmd_l_v
    }

    /// Right motor voltage command.
    ///
    /// Units: volts
    pub fn get_motor_r_cmd(&self) -> f64 {
        self.v_cmd_r_v
    }

    /// Last forward velocity command read from teleop.
    ///
    /// Units: meters/second
    pub fn get_lin_vel_cmd(&self) -> f64 {
        self.lin_vel_cmd_ms
    }

    /// Last yaw rate command read from teleop.
    ///
    /// Units: radians/second
    pub fn get_yaw_vel_cmd(&self) -> f64 {
        self.yaw_vel_cmd_rads
    }

    pub fn is_init_complete(&self) -> bool {
        self.init_complete
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Nominal control period.
    ///
    /// Units: seconds
    pub fn ctrl_period_s(&self) -> f64 {
        self.params.ctrl_period_s()
    }

    pub fn teleop_mut(&mut self) -> &mut T {
        &mut self.teleop
    }

    pub fn tilt_mut(&mut self) -> &mut S {
        &mut self.tilt
    }

    pub fn motor_l_mut(&mut self) -> &mut M {
        &mut self.motor_l
    }

    pub fn motor_r_mut(&mut self) -> &mut M {
        &mut self.motor_r
    }

    fn set_motor_cmds(&mut self, v: f64) {
        self.v_cmd_l_v = v;
        self.v_cmd_r_v = v;
    }

    fn output(&self) -> OutputData {
        OutputData {
            lin_vel_ms: self.lin_vel_ms,
            v_cmd_l_v: self.v_cmd_l_v,
            v_cmd_r_v: self.v_cmd_r_v
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // ---- MOCK EQUIPMENT ----

    #[derive(Default)]
    struct MockTeleop {
        lin_vel_cmd: f64,
        yaw_vel_cmd: f64,
        num_inits: u32
    }

    #[derive(Default)]
    struct MockTilt {
        pitch: f64,
        pitch_vel: f64,
        num_inits: u32
    }

    #[derive(Default)]
    struct MockMotor {
        velocity: f64,
        num_inits: u32
    }

    impl Teleop for MockTeleop {
        fn init(&mut self) { self.num_inits += 1 }
        fn get_lin_vel_cmd(&self) -> f64 { self.lin_vel_cmd }
        fn get_yaw_vel_cmd(&self) -> f64 { self.yaw_vel_cmd }
    }

    impl TiltSensor for MockTilt {
        fn init(&mut self) { self.num_inits += 1 }
        fn get_pitch(&self) -> f64 { self.pitch }
        fn get_pitch_vel(&self) -> f64 { self.pitch_vel }
    }

    impl MotorDriver for MockMotor {
        fn init(&mut self) { self.num_inits += 1 }
        fn get_velocity(&self) -> f64 { self.velocity }
    }

    type TestCtrl = BalCtrl<MockTeleop, MockTilt, MockMotor>;

    // ---- HELPERS ----

    fn params(k1: f64, k2: f64, k3: f64) -> Params {
        Params {
            ctrl_freq_hz: 100.0,
            period_tolerance_s: 0.001,
            wheel_radius_m: 0.1,
            pitch_max_rad: 0.8,
            k1, k2, k3
        }
    }

    fn motor_config() -> MotorConfig {
        MotorConfig {
            supply_voltage_v: 12.0,
            back_emf_const: 0.5,
            torque_const: 0.5,
            armature_resistance_ohm: 2.0
        }
    }

    fn ctrl(k1: f64, k2: f64, k3: f64) -> TestCtrl {
        let mut c = BalCtrl::new(
            params(k1, k2, k3),
            &motor_config(),
            MockTeleop::default(),
            MockTilt::default(),
            MockMotor::default(),
            MockMotor::default()
        ).unwrap();
        c.init();
        c
    }

    fn set_state(c: &mut TestCtrl, pitch: f64, pitch_vel: f64, vel_l: f64, vel_r: f64) {
        c.tilt_mut().pitch = pitch;
        c.tilt_mut().pitch_vel = pitch_vel;
        c.motor_l_mut().velocity = vel_l;
        c.motor_r_mut().velocity = vel_r;
    }

    // ---- TESTS ----

    #[test]
    fn test_defaults_before_update() {
        let c = ctrl(1.0, 1.0, 1.0);

        assert_eq!(c.get_lin_vel(), 0.0);
        assert_eq!(c.get_motor_l_cmd(), 0.0);
        assert_eq!(c.get_motor_r_cmd(), 0.0);
        assert_eq!(c.get_lin_vel_cmd(), 0.0);
        assert_eq!(c.get_yaw_vel_cmd(), 0.0);
        assert_eq!(c.ctrl_period_s(), 0.01);
    }

    #[test]
    fn test_init_idempotent() {
        let mut c = BalCtrl::new(
            params(0.0, 0.0, 0.0),
            &motor_config(),
            MockTeleop::default(),
            MockTilt::default(),
            MockMotor::default(),
            MockMotor::default()
        ).unwrap();

        assert!(!c.is_init_complete());

        c.init();
        c.init();
        c.init();

        assert!(c.is_init_complete());
        assert_eq!(c.teleop_mut().num_inits, 1);
        assert_eq!(c.tilt_mut().num_inits, 1);
        assert_eq!(c.motor_l_mut().num_inits, 1);
        assert_eq!(c.motor_r_mut().num_inits, 1);
        assert_eq!(c.get_motor_l_cmd(), 0.0);
    }

    #[test]
    fn test_update_before_init() {
        let mut c = BalCtrl::new(
            params(0.0, -10.0, 0.0),
            &motor_config(),
            MockTeleop::default(),
            MockTilt::default(),
            MockMotor::default(),
            MockMotor::default()
        ).unwrap();
        c.tilt_mut().pitch = 0.3;

        let (output, report) = c.update();

        assert!(report.not_initialised);
        assert_eq!(output, OutputData::default());
        assert_eq!(c.get_motor_l_cmd(), 0.0);
        assert_eq!(c.get_motor_r_cmd(), 0.0);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut p = params(0.0, 0.0, 0.0);
        p.pitch_max_rad = 0.0;

        let r = BalCtrl::new(
            p,
            &motor_config(),
            MockTeleop::default(),
            MockTilt::default(),
            MockMotor::default(),
            MockMotor::default()
        );

        assert!(r.is_err());
    }

    #[test]
    fn test_zero_gains_zero_output() {
        let mut c = ctrl(0.0, 0.0, 0.0);
        set_state(&mut c, 0.0, 0.0, 0.0, 0.0);

        let (output, report) = c.update();

        assert_eq!(output, OutputData::default());
        assert_eq!(report, StatusReport::default());
        assert_eq!(c.get_motor_l_cmd(), 0.0);
        assert_eq!(c.get_motor_r_cmd(), 0.0);
    }

    #[test]
    fn test_saturation_at_supply_voltage() {
        // pitch = -0.5 with k2 = 100 demands 50 V
        let mut c = ctrl(0.0, 100.0, 0.0);
        set_state(&mut c, -0.5, 0.0, 0.0, 0.0);

        let (output, report) = c.update();

        assert!(report.v_avg_saturated);
        assert!(!report.tipped_over);
        assert_eq!(output.v_cmd_l_v, 12.0);
        assert_eq!(output.v_cmd_r_v, 12.0);
        assert_eq!(c.get_motor_l_cmd(), 12.0);
        assert_eq!(c.get_motor_r_cmd(), 12.0);

        set_state(&mut c, 0.5, 0.0, 0.0, 0.0);
        c.update();
        assert_eq!(c.get_motor_l_cmd(), -12.0);
        assert_eq!(c.get_motor_r_cmd(), -12.0);
    }

    #[test]
    fn test_tip_over_cuts_motors() {
        let mut c = ctrl(-5.0, -50.0, 0.0);
        set_state(&mut c, 0.9, 1.0, 0.0, 0.0);

        let (output, report) = c.update();

        assert!(report.tipped_over);
        assert_eq!(output.v_cmd_l_v, 0.0);
        assert_eq!(output.v_cmd_r_v, 0.0);
        assert_eq!(c.get_motor_l_cmd(), 0.0);
        assert_eq!(c.get_motor_r_cmd(), 0.0);

        // Backwards too
        set_state(&mut c, -0.9, -1.0, 0.0, 0.0);
        let (_, report) = c.update();
        assert!(report.tipped_over);
        assert_eq!(c.get_motor_l_cmd(), 0.0);
        assert_eq!(c.get_motor_r_cmd(), 0.0);
    }

    #[test]
    fn test_tip_over_not_latched() {
        let mut c = ctrl(0.0, -10.0, 0.0);

        set_state(&mut c, 0.9, 0.0, 0.0, 0.0);
        c.update();
        assert_eq!(c.get_motor_l_cmd(), 0.0);

        // Exactly at the limit is still within bounds
        set_state(&mut c, 0.8, 0.0, 0.0, 0.0);
        let (_, report) = c.update();
        assert!(!report.tipped_over);
        assert_eq!(c.get_motor_l_cmd(), 8.0);
        assert_eq!(c.get_motor_r_cmd(), 8.0);
    }

    #[test]
    fn test_non_finite_input_cuts_motors() {
        let mut c = ctrl(-1.0, -10.0, -1.0);

        for (pitch, pitch_vel, vel) in [
            (f64::NAN, 0.0, 0.0),
            (0.1, f64::NAN, 0.0),
            (0.1, f64::INFINITY, 0.0),
            (0.1, 0.0, f64::NEG_INFINITY)
        ].iter() {
            // Drive a non-zero command first
            set_state(&mut c, 0.1, 0.0, 0.0, 0.0);
            c.update();
            assert!(c.get_motor_l_cmd() != 0.0);

            set_state(&mut c, *pitch, *pitch_vel, *vel, 0.0);
            let (output, report) = c.update();

            assert!(report.non_finite_input);
            assert_eq!(output.v_cmd_l_v, 0.0);
            assert_eq!(output.v_cmd_r_v, 0.0);
        }
    }

    #[test]
    fn test_overflowing_demand_cuts_motors() {
        // Opposite sign terms overflow to +inf and -inf, summing to NaN
        let mut c = ctrl(100.0, 0.0, -100.0);
        set_state(&mut c, 0.1, 1e307, 1e308, 0.0);

        let (output, report) = c.update();

        assert!(c.get_lin_vel().is_finite());
        assert!(report.non_finite_input);
        assert!(!report.v_avg_saturated);
        assert_eq!(output.v_cmd_l_v, 0.0);
        assert_eq!(output.v_cmd_r_v, 0.0);
        assert_eq!(c.get_motor_l_cmd(), 0.0);
        assert_eq!(c.get_motor_r_cmd(), 0.0);

        // A single overflowing term is cut too rather than saturated
        let mut c = ctrl(100.0, 0.0, 0.0);
        set_state(&mut c, 0.1, -1e307, 0.0, 0.0);

        let (output, report) = c.update();

        assert!(report.non_finite_input);
        assert!(!report.v_avg_saturated);
        assert_eq!(output.v_cmd_l_v, 0.0);
        assert_eq!(output.v_cmd_r_v, 0.0);

        // Recovers once the inputs are sane again
        set_state(&mut c, 0.0, -0.01, 0.0, 0.0);
        let (_, report) = c.update();
        assert!(!report.non_finite_input);
        assert!((c.get_motor_l_cmd() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_lin_vel_estimate() {
        let mut c = ctrl(0.0, 0.0, 0.0);
        set_state(&mut c, 0.0, 0.0, 2.0, 4.0);

        let (output, _) = c.update();

        assert!((c.get_lin_vel() - 0.3).abs() < 1e-12);
        assert_eq!(output.lin_vel_ms, c.get_lin_vel());

        set_state(&mut c, 0.0, 0.0, 3.0, -3.0);
        c.update();
        assert_eq!(c.get_lin_vel(), 0.0);
    }

    #[test]
    fn test_feedback_law() {
        let mut c = ctrl(-0.5, -4.0, -2.0);
        set_state(&mut c, 0.25, 1.0, 1.0, 1.0);

        c.update();

        // lin_vel = 0.05 * 2 = 0.1
        // v_avg = -0.5*-1 + -4*-0.25 + -2*-0.1 = 0.5 + 1 + 0.2
        assert!((c.get_motor_l_cmd() - 1.7).abs() < 1e-12);
        assert_eq!(c.get_motor_l_cmd(), c.get_motor_r_cmd());
    }

    #[test]
    fn test_commands_bounded_and_equal() {
        let mut c = ctrl(-3.0, -40.0, -7.0);

        let pitches = [-0.8, -0.5, -0.1, 0.0, 0.05, 0.3, 0.79];
        let rates = [-20.0, -1.0, 0.0, 0.5, 15.0];
        let vels = [-50.0, -2.0, 0.0, 3.0, 40.0];

        for pitch in pitches.iter() {
            for rate in rates.iter() {
                for vel in vels.iter() {
                    set_state(&mut c, *pitch, *rate, *vel, -*vel * 0.5);
                    c.update();

                    assert!(c.get_motor_l_cmd().abs() <= 12.0);
                    assert!(c.get_motor_r_cmd().abs() <= 12.0);
                    assert_eq!(c.get_motor_l_cmd(), c.get_motor_r_cmd());
                }
            }
        }
    }

    #[test]
    fn test_teleop_read_but_unused() {
        let mut c = ctrl(0.0, 0.0, -1.0);
        c.teleop_mut().lin_vel_cmd = 0.7;
        c.teleop_mut().yaw_vel_cmd = -1.2;

        c.update();

        assert_eq!(c.get_lin_vel_cmd(), 0.7);
        assert_eq!(c.get_yaw_vel_cmd(), -1.2);

        // Velocity is regulated to zero, not to the command
        assert_eq!(c.get_motor_l_cmd(), 0.0);
    }

    #[test]
    fn test_off_nominal_period() {
        let mut c = ctrl(0.0, 0.0, 0.0);

        let (_, report) = c.update_with_period(0.0105);
        assert!(!report.off_nominal_period);

        let (_, report) = c.update_with_period(0.02);
        assert!(report.off_nominal_period);

        let (_, report) = c.update_with_period(f64::NAN);
        assert!(report.off_nominal_period);

        let (_, report) = c.update();
        assert!(!report.off_nominal_period);
    }
}
