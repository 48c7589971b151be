use derive_more::derive::{Display, From};
use serde::{Deserialize, Serialize};

/// Unit convention selected by the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementSystem {
    #[default]
    #[display("metric")]
    Metric,
    #[display("imperial")]
    Imperial,
    #[display("uk")]
    Uk,
}

impl MeasurementSystem {
    /// Parses the operator setting. `si` is an alias for metric and `us` for imperial.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "metric" | "si" => Some(MeasurementSystem::Metric),
            "imperial" | "us" => Some(MeasurementSystem::Imperial),
            "uk" => Some(MeasurementSystem::Uk),
            _ => None,
        }
    }
}

/// Unit-of-measure code attached to every reported value, interpreted by the controller for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
#[display("uom{}", _0)]
pub struct UnitOfMeasure(pub u16);

impl UnitOfMeasure {
    pub const BOOLEAN: UnitOfMeasure = UnitOfMeasure(2);
    pub const CELSIUS: UnitOfMeasure = UnitOfMeasure(4);
    pub const FAHRENHEIT: UnitOfMeasure = UnitOfMeasure(17);
    pub const PERCENT: UnitOfMeasure = UnitOfMeasure(22);
    pub const INCHES_HG: UnitOfMeasure = UnitOfMeasure(23);
    pub const INDEX: UnitOfMeasure = UnitOfMeasure(25);
    pub const KPH: UnitOfMeasure = UnitOfMeasure(32);
    pub const MPH: UnitOfMeasure = UnitOfMeasure(48);
    pub const UV_INDEX: UnitOfMeasure = UnitOfMeasure(71);
    pub const WATTS_PER_M2: UnitOfMeasure = UnitOfMeasure(74);
    pub const DEGREES: UnitOfMeasure = UnitOfMeasure(76);
    pub const MILLIMETERS: UnitOfMeasure = UnitOfMeasure(82);
    pub const KILOMETERS: UnitOfMeasure = UnitOfMeasure(83);
    pub const INCHES: UnitOfMeasure = UnitOfMeasure(105);
    pub const MM_PER_DAY: UnitOfMeasure = UnitOfMeasure(106);
    pub const MILES: UnitOfMeasure = UnitOfMeasure(116);
    pub const MILLIBAR: UnitOfMeasure = UnitOfMeasure(117);
    pub const INCHES_PER_DAY: UnitOfMeasure = UnitOfMeasure(120);

    pub fn code(&self) -> u16 {
        self.0
    }
}

pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

pub fn mph_to_mps(mph: f64) -> f64 {
    mph * 0.44704
}

pub fn kph_to_mps(kph: f64) -> f64 {
    kph / 3.6
}

/// Millimetres to inches, kept at two decimals.
pub fn mm_to_inch(mm: f64) -> f64 {
    (mm / 25.4 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!(MeasurementSystem::parse("si"), Some(MeasurementSystem::Metric));
        assert_eq!(MeasurementSystem::parse("US"), Some(MeasurementSystem::Imperial));
        assert_eq!(MeasurementSystem::parse(" uk "), Some(MeasurementSystem::Uk));
        assert_eq!(MeasurementSystem::parse("kelvin"), None);
    }

    #[test]
    fn converts_units() {
        assert!((fahrenheit_to_celsius(212.0) - 100.0).abs() < 1e-9);
        assert!((mph_to_mps(10.0) - 4.4704).abs() < 1e-9);
        assert!((kph_to_mps(36.0) - 10.0).abs() < 1e-9);
        assert_eq!(mm_to_inch(25.4), 1.0);
        assert_eq!(mm_to_inch(5.0), 0.2);
    }
}
