//! General maths functions

use num_traits::Float;

/// Clamp `value` into the range `[min, max]`.
///
/// Comparisons follow IEEE semantics, so a NaN `value` is passed straight
/// through.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T 
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}
