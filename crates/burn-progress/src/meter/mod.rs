mod average;
mod stopwatch;
mod time;

pub use average::*;
pub use stopwatch::*;
pub use time::*;

/// Round a value to the given number of decimals, ties to even.
pub(crate) fn round_decimals(value: f64, decimals: Option<u32>) -> f64 {
    match decimals {
        Some(decimals) => {
            let factor = 10f64.powi(decimals as i32);
            (value * factor).round_ties_even() / factor
        }
        None => value,
    }
}
