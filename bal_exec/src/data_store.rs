//! # Data Store

use log::warn;
use serde::Serialize;

use crate::{bal_ctrl, sim::PlantState};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of consecutive cycle overruns after which a warning is raised on
/// every further overrun rather than just the first.
pub const OVERRUN_WARN_LIMIT: u64 = 10;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Simulation elapsed time
    pub sim_time_s: f64,

    // BalCtrl
    pub bal_ctrl_output: bal_ctrl::OutputData,
    pub bal_ctrl_status_rpt: bal_ctrl::StatusReport,

    // Simulation
    pub plant_state: PlantState,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Total number of cycles in which the tip-over cutoff was active
    pub num_cutoff_cycles: u64,
}

/// One row of the cycle archive.
///
/// Kept flat so that it can be written as a CSV row with headers.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CycleRecord {
    pub cycle: u64,
    pub sim_time_s: f64,

    pub pitch_rad: f64,
    pub pitch_vel_rads: f64,
    pub position_m: f64,

    pub lin_vel_ms: f64,
    pub v_cmd_l_v: f64,
    pub v_cmd_r_v: f64,

    pub not_initialised: bool,
    pub off_nominal_period: bool,
    pub non_finite_input: bool,
    pub v_avg_saturated: bool,
    pub tipped_over: bool,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64, cycle_period_s: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz.round().max(1.0) as u64) == 0;

        self.bal_ctrl_output = bal_ctrl::OutputData::default();
        self.bal_ctrl_status_rpt = bal_ctrl::StatusReport::default();

        self.sim_time_s = self.num_cycles as f64 * cycle_period_s;
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        let rpt = &self.bal_ctrl_status_rpt;
        if rpt.tipped_over || rpt.non_finite_input {
            self.num_cutoff_cycles += 1;
        }

        self.num_cycles += 1;
    }

    /// Record a cycle overrun, returning true if it should be reported.
    ///
    /// The first overrun in a row is always reported, after that only once
    /// the warn limit is passed.
    pub fn cycle_overrun(&mut self) -> bool {
        self.num_consec_cycle_overruns += 1;

        if self.num_consec_cycle_overruns == OVERRUN_WARN_LIMIT {
            warn!("{} consecutive cycle overruns", OVERRUN_WARN_LIMIT);
        }

        self.num_consec_cycle_overruns == 1
            || self.num_consec_cycle_overruns > OVERRUN_WARN_LIMIT
    }

    /// Record a cycle that finished within its period.
    pub fn cycle_on_time(&mut self) {
        self.num_consec_cycle_overruns = 0;
    }

    /// Build the archive row for this cycle.
    pub fn cycle_record(&self) -> CycleRecord {
        let out = &self.bal_ctrl_output;
        let rpt = &self.bal_ctrl_status_rpt;

        CycleRecord {
            cycle: self.num_cycles,
            sim_time_s: self.sim_time_s,
            pitch_rad: self.plant_state.pitch_rad,
            pitch_vel_rads: self.plant_state.pitch_vel_rads,
            position_m: self.plant_state.position_m,
            lin_vel_ms: out.lin_vel_ms,
            v_cmd_l_v: out.v_cmd_l_v,
            v_cmd_r_v: out.v_cmd_r_v,
            not_initialised: rpt.not_initialised,
            off_nominal_period: rpt.off_nominal_period,
            non_finite_input: rpt.non_finite_input,
            v_avg_saturated: rpt.v_avg_saturated,
            tipped_over: rpt.tipped_over,
        }
    }
}
