use serde_json::Value;

use super::codes::Decoder;
use super::error::QueryError;
use crate::core::{Channel, MeasurementSystem, UnitOfMeasure, round1};

pub const MIN_HUMIDITY_TAG: &str = "minHumidity";
pub const MAX_HUMIDITY_TAG: &str = "maxHumidity";
pub const TIMESTAMP_TAG: &str = "timestamp";
pub const DATE_TIME_TAG: &str = "dateTimeISO";

/// Where a channel's value comes from and how it is labelled, for one measurement system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSpec {
    pub unit: UnitOfMeasure,
    /// Key into a current observation (`response.ob`). Empty if not observable.
    pub observation_tag: &'static str,
    /// Key into a forecast period. Empty if not forecast.
    pub forecast_tag: &'static str,
    pub decoder: Option<Decoder>,
}

impl ChannelSpec {
    fn new(unit: UnitOfMeasure, observation_tag: &'static str, forecast_tag: &'static str) -> Self {
        Self {
            unit,
            observation_tag,
            forecast_tag,
            decoder: None,
        }
    }

    fn coded(decoder: Decoder) -> Self {
        Self {
            unit: UnitOfMeasure::INDEX,
            observation_tag: "weatherCoded",
            forecast_tag: "weatherPrimaryCoded",
            decoder: Some(decoder),
        }
    }

    fn for_channel(system: MeasurementSystem, channel: Channel) -> Self {
        use MeasurementSystem::*;

        let celsius = system != Imperial;
        let millibar = system != Imperial;
        let kph = system == Metric;
        let metric_length = system == Metric;

        let pick = |cond: bool, a: &'static str, b: &'static str| if cond { a } else { b };

        let temp_unit = if celsius {
            UnitOfMeasure::CELSIUS
        } else {
            UnitOfMeasure::FAHRENHEIT
        };
        let speed_unit = if kph { UnitOfMeasure::KPH } else { UnitOfMeasure::MPH };
        let depth_unit = if metric_length {
            UnitOfMeasure::MILLIMETERS
        } else {
            UnitOfMeasure::INCHES
        };

        match channel {
            Channel::Status => Self::new(UnitOfMeasure::BOOLEAN, "", ""),
            Channel::Temperature => Self::new(
                temp_unit,
                pick(celsius, "tempC", "tempF"),
                pick(celsius, "avgTempC", "avgTempF"),
            ),
            Channel::Humidity => Self::new(UnitOfMeasure::PERCENT, "humidity", "humidity"),
            Channel::Pressure => {
                let tag = pick(millibar, "pressureMB", "pressureIN");
                let unit = if millibar {
                    UnitOfMeasure::MILLIBAR
                } else {
                    UnitOfMeasure::INCHES_HG
                };
                Self::new(unit, tag, tag)
            }
            Channel::WindSpeed => {
                let tag = pick(kph, "windSpeedKPH", "windSpeedMPH");
                Self::new(speed_unit, tag, tag)
            }
            Channel::GustSpeed => {
                let tag = pick(kph, "windGustKPH", "windGustMPH");
                Self::new(speed_unit, tag, tag)
            }
            Channel::WindDirection => Self::new(UnitOfMeasure::DEGREES, "windDirDEG", "windDirDEG"),
            Channel::DewPoint => {
                let tag = pick(celsius, "dewpointC", "dewpointF");
                Self::new(temp_unit, tag, tag)
            }
            Channel::HeatIndex => Self::new(temp_unit, pick(celsius, "heatindexC", "heatindexF"), ""),
            Channel::WindChill => Self::new(temp_unit, pick(celsius, "windchillC", "windchillF"), ""),
            Channel::FeelsLike => {
                let tag = pick(celsius, "feelslikeC", "feelslikeF");
                Self::new(temp_unit, tag, tag)
            }
            Channel::SolarRadiation => Self::new(UnitOfMeasure::WATTS_PER_M2, "solradWM2", "solradWM2"),
            Channel::UvIndex => Self::new(UnitOfMeasure::UV_INDEX, "uvi", "uvi"),
            Channel::Visibility => {
                let unit = if metric_length {
                    UnitOfMeasure::KILOMETERS
                } else {
                    UnitOfMeasure::MILES
                };
                Self::new(unit, pick(metric_length, "visibilityKM", "visibilityMI"), "")
            }
            Channel::SnowDepth => Self::new(
                depth_unit,
                pick(metric_length, "snowDepthCM", "snowDepthIN"),
                pick(metric_length, "snowCM", "snowIN"),
            ),
            Channel::Precipitation => {
                let tag = pick(metric_length, "precipMM", "precipIN");
                Self::new(depth_unit, tag, tag)
            }
            Channel::SkyCover => Self::new(UnitOfMeasure::PERCENT, "sky", "sky"),
            Channel::WeatherCoverage => Self::coded(Decoder::Coverage),
            Channel::WeatherIntensity => Self::coded(Decoder::Intensity),
            Channel::WeatherCondition => Self::coded(Decoder::Condition),
            Channel::MaxTemperature => Self::new(temp_unit, "", pick(celsius, "maxTempC", "maxTempF")),
            Channel::MinTemperature => Self::new(temp_unit, "", pick(celsius, "minTempC", "minTempF")),
            Channel::MaxWindSpeed => Self::new(speed_unit, "", pick(kph, "windSpeedMaxKPH", "windSpeedMaxMPH")),
            Channel::MinWindSpeed => Self::new(speed_unit, "", pick(kph, "windSpeedMinKPH", "windSpeedMinMPH")),
            Channel::PrecipitationChance => Self::new(UnitOfMeasure::PERCENT, "", "pop"),
            Channel::DayOfWeek => Self::new(UnitOfMeasure::INDEX, "", ""),
            Channel::Evapotranspiration => {
                let unit = if metric_length {
                    UnitOfMeasure::MM_PER_DAY
                } else {
                    UnitOfMeasure::INCHES_PER_DAY
                };
                Self::new(unit, "", "")
            }
        }
    }
}

/// Channel table for one measurement system. Immutable once built; a different system means a
/// new profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitProfile {
    system: MeasurementSystem,
    specs: [ChannelSpec; Channel::ALL.len()],
}

impl UnitProfile {
    pub fn new(system: MeasurementSystem) -> Self {
        Self {
            system,
            specs: Channel::ALL.map(|channel| ChannelSpec::for_channel(system, channel)),
        }
    }

    pub fn system(&self) -> MeasurementSystem {
        self.system
    }

    pub fn spec(&self, channel: Channel) -> &ChannelSpec {
        &self.specs[channel as usize]
    }

    pub fn unit(&self, channel: Channel) -> UnitOfMeasure {
        self.spec(channel).unit
    }

    /// Field of the observation summary holding the accumulated precipitation.
    pub fn precip_summary_tag(&self) -> &'static str {
        if self.system == MeasurementSystem::Metric {
            "totalMM"
        } else {
            "totalIN"
        }
    }

    pub fn temperature_in_fahrenheit(&self) -> bool {
        self.unit(Channel::MinTemperature) == UnitOfMeasure::FAHRENHEIT
    }

    pub fn wind_in_mph(&self) -> bool {
        self.unit(Channel::WindSpeed) == UnitOfMeasure::MPH
    }

    pub fn resolve_observation(&self, channel: Channel, observation: &Value) -> Result<f64, QueryError> {
        self.resolve(channel, self.spec(channel).observation_tag, observation)
    }

    pub fn resolve_forecast(&self, channel: Channel, period: &Value) -> Result<f64, QueryError> {
        self.resolve(channel, self.spec(channel).forecast_tag, period)
    }

    /// Converts a resolved value into what is reported: metric snow depth arrives in centimetres
    /// but is published in millimetres, then everything is rounded to one decimal.
    pub fn to_reported(&self, channel: Channel, value: f64) -> f64 {
        let scaled = if channel == Channel::SnowDepth && self.system == MeasurementSystem::Metric {
            value * 10.0
        } else {
            value
        };

        round1(scaled)
    }

    fn resolve(&self, channel: Channel, tag: &'static str, record: &Value) -> Result<f64, QueryError> {
        let not_found = || QueryError::FieldNotFound {
            channel,
            tag: tag.to_string(),
        };

        if tag.is_empty() {
            return Err(not_found());
        }

        let value = record.get(tag).ok_or_else(not_found)?;

        match self.spec(channel).decoder {
            Some(decoder) => Ok(decoder.decode(value.as_str().unwrap_or_default()) as f64),
            None => numeric_value(value).ok_or_else(|| QueryError::InvalidValue {
                channel,
                tag: tag.to_string(),
            }),
        }
    }
}

/// Missing values (`null`, empty, or the literal `None`) count as zero.
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => match s.trim() {
            "" | "None" => Some(0.0),
            s => s.parse().ok(),
        },
        _ => None,
    }
}
