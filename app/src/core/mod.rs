pub mod channel;
pub mod ext;
pub mod unit;

pub use channel::Channel;
pub use unit::{MeasurementSystem, UnitOfMeasure};

/// Rounds a reported value to exactly one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
