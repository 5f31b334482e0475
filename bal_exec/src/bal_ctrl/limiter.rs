//! Voltage limiter

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Symmetric clamp limiter, bounds a demand to `[-limit, +limit]`.
///
/// The limiter holds no history between calls, so one instance can serve
/// both motors in the same cycle. A rate limiting variant would need one
/// instance per motor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampLimiter {
    limit: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ClampLimiter {
    /// Create a new limiter with the given (positive) bound.
    pub fn new(limit: f64) -> Self {
        Self { limit: limit.abs() }
    }

    /// The bound of the limiter.
    pub fn limit(&self) -> f64 {
        self.limit
    }

    /// Limit the given value.
    ///
    /// NaN is returned unchanged and must be treated as a fault by the
    /// caller.
    pub fn update(&self, value: f64) -> f64 {
        clamp(&value, &-self.limit, &self.limit)
    }
}
