//! Balance control module

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod limiter;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use limiter::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur when building BalCtrl.
///
/// Cyclic processing itself never errors, anomalies either saturate the
/// demand or trip the tip-over cutoff.
#[derive(Debug, thiserror::Error)]
pub enum BalCtrlError {
    #[error("Invalid parameter `{name}` = {value}: {reason}")]
    InvalidParam {
        name: &'static str,
        value: f64,
        reason: &'static str
    },
}
