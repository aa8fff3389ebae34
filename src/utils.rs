//! Small DSP helper tools.

pub mod smoothed;

pub use smoothed::{ExponentialSmoothedValue, LinearSmoothedValue, SmoothedValue};
