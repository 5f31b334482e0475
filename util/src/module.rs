//! Module interfaces
//!
//! Each cyclic module in `bal_exec` shall implement all the items in this
//! module.

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// The module's internal state.
pub trait State {
    /// Data produced by cyclic processing.
    type OutputData;
    /// A report on the status of the cyclic processing.
    type StatusReport;

    /// Initialise the module.
    ///
    /// Shall be idempotent: only the first call has any effect.
    fn init(&mut self);

    /// Main module processing function, called once per control cycle.
    ///
    /// # Outputs
    /// - A tuple of the output data and status report for this cycle.
    fn update(&mut self) -> (Self::OutputData, Self::StatusReport);
}
