//! 내장 전략.

pub mod percent_change;

pub use percent_change::{PercentChangeConfig, PercentChangeStrategy};
