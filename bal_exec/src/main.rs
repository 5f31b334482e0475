//! Main balancing robot executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop, once per control period:
//!         - Equipment sampling (simulated plant -> cached device samples)
//!         - Balance control processing
//!         - Motor demand application (simulated plant step)
//!         - Archiving
//!         - Cycle management
//!
//! # Usage
//!
//!     bal_exec [--no-sleep]
//!
//! With `--no-sleep` the loop runs as fast as possible instead of at the
//! control rate, the simulated time is unaffected.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{Report, eyre::{WrapErr, eyre}};
use log::{debug, info, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use bal_lib::{
    bal_ctrl::{BalCtrl, Params},
    data_store::DataStore,
    motor_config::MotorConfig,
    sim::{Plant, SimMotor, SimParams, SimTeleop, SimTilt},
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "bal_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Balancing Robot Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- ARGUMENTS ----

    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    let sleep = match args.len() {
        1 => true,
        2 if args[1] == "--no-sleep" => {
            info!("Running without sleeping between cycles");
            false
        },
        _ => return Err(eyre!(
            "Usage: bal_exec [--no-sleep], found {} arguments", args.len() - 1
        ))
    };

    // ---- LOAD PARAMETERS ----

    let bal_ctrl_params: Params = util::params::load("bal_ctrl.toml")
        .wrap_err("Could not load BalCtrl params")?;
    let motor_config: MotorConfig = util::params::load("motor.toml")
        .wrap_err("Could not load motor config")?;
    let sim_params: SimParams = util::params::load("sim.toml")
        .wrap_err("Could not load sim params")?;

    sim_params.validate().wrap_err("Invalid sim params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut plant = Plant::new(
        sim_params.clone(),
        motor_config.clone(),
        bal_ctrl_params.wheel_radius_m
    );

    let mut bal_ctrl = BalCtrl::new(
        bal_ctrl_params,
        &motor_config,
        SimTeleop::new(sim_params.lin_vel_cmd_ms, sim_params.yaw_vel_cmd_rads),
        SimTilt::default(),
        SimMotor::new("left"),
        SimMotor::new("right")
    ).wrap_err("Failed to create BalCtrl")?;

    bal_ctrl.init();
    info!("BalCtrl init complete");

    let mut arch = Archiver::from_path(&session, "bal_ctrl/cycles.csv")
        .wrap_err("Failed to create the BalCtrl archive")?;

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    let cycle_period_s = bal_ctrl.ctrl_period_s();
    let cycle_frequency_hz = bal_ctrl.params().ctrl_freq_hz;
    let num_cycles = (sim_params.duration_s / cycle_period_s).round() as u64;

    let mut ds = DataStore::default();

    info!(
        "Begining main loop, {} cycles at {} Hz\n",
        num_cycles,
        cycle_frequency_hz
    );

    while ds.num_cycles < num_cycles {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        ds.cycle_start(cycle_frequency_hz, cycle_period_s);

        // ---- EQUIPMENT SAMPLING ----

        plant.write_samples(&mut bal_ctrl);

        // ---- CONTROL ALGORITHM PROCESSING ----

        let (output, report) = bal_ctrl.update();
        ds.bal_ctrl_output = output;
        ds.bal_ctrl_status_rpt = report;

        // ---- DEMAND APPLICATION ----

        ds.plant_state = *plant.state();
        plant.step(
            bal_ctrl.get_motor_l_cmd(),
            bal_ctrl.get_motor_r_cmd(),
            cycle_period_s
        );

        // ---- WRITE ARCHIVES ----

        if let Err(e) = arch.serialise(ds.cycle_record()) {
            warn!("Could not archive cycle {}: {}", ds.num_cycles, e);
        }

        if ds.is_1_hz_cycle {
            info!(
                "t = {:6.2} s: pitch {:+.4} rad, lin vel {:+.4} m/s, v_cmd {:+.3} V",
                ds.sim_time_s,
                ds.plant_state.pitch_rad,
                output.lin_vel_ms,
                output.v_cmd_l_v
            );
        }

        // ---- CYCLE MANAGEMENT ----

        ds.cycle_end();

        if !sleep {
            continue;
        }

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(cycle_period_s)
            .checked_sub(cycle_dur)
        {
            Some(d) => {
                ds.cycle_on_time();
                thread::sleep(d);
            },
            None => {
                if ds.cycle_overrun() {
                    warn!(
                        "Cycle overran by {:.06} s",
                        cycle_dur.as_secs_f64() - cycle_period_s
                    );
                }
            }
        }
    }

    // ---- SHUTDOWN ----

    info!(
        "End of execution after {} cycles, motors cut for {} cycles, robot {}",
        ds.num_cycles,
        ds.num_cutoff_cycles,
        if plant.has_fallen() { "fell over" } else { "stayed up" }
    );

    Ok(())
}
