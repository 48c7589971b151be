use derive_more::derive::Display;
use serde::{Deserialize, Serialize};

/// Named sensor quantity published to the controller, independent of the measurement system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Status,
    Temperature,
    Humidity,
    Pressure,
    WindSpeed,
    GustSpeed,
    WindDirection,
    DewPoint,
    HeatIndex,
    WindChill,
    FeelsLike,
    SolarRadiation,
    UvIndex,
    Visibility,
    SnowDepth,
    Precipitation,
    SkyCover,
    WeatherCoverage,
    WeatherIntensity,
    WeatherCondition,
    MaxTemperature,
    MinTemperature,
    MaxWindSpeed,
    MinWindSpeed,
    PrecipitationChance,
    DayOfWeek,
    Evapotranspiration,
}

impl Channel {
    pub const ALL: [Channel; 27] = [
        Channel::Status,
        Channel::Temperature,
        Channel::Humidity,
        Channel::Pressure,
        Channel::WindSpeed,
        Channel::GustSpeed,
        Channel::WindDirection,
        Channel::DewPoint,
        Channel::HeatIndex,
        Channel::WindChill,
        Channel::FeelsLike,
        Channel::SolarRadiation,
        Channel::UvIndex,
        Channel::Visibility,
        Channel::SnowDepth,
        Channel::Precipitation,
        Channel::SkyCover,
        Channel::WeatherCoverage,
        Channel::WeatherIntensity,
        Channel::WeatherCondition,
        Channel::MaxTemperature,
        Channel::MinTemperature,
        Channel::MaxWindSpeed,
        Channel::MinWindSpeed,
        Channel::PrecipitationChance,
        Channel::DayOfWeek,
        Channel::Evapotranspiration,
    ];

    /// Channels carried by the primary (current conditions) entity.
    pub const OBSERVED: [Channel; 20] = [
        Channel::Status,
        Channel::Temperature,
        Channel::Humidity,
        Channel::DewPoint,
        Channel::Pressure,
        Channel::WindDirection,
        Channel::WindSpeed,
        Channel::GustSpeed,
        Channel::FeelsLike,
        Channel::HeatIndex,
        Channel::WindChill,
        Channel::Precipitation,
        Channel::SnowDepth,
        Channel::WeatherCoverage,
        Channel::WeatherIntensity,
        Channel::WeatherCondition,
        Channel::SkyCover,
        Channel::Visibility,
        Channel::SolarRadiation,
        Channel::UvIndex,
    ];

    /// Channels carried by every forecast-day entity.
    pub const FORECAST: [Channel; 18] = [
        Channel::DayOfWeek,
        Channel::MaxTemperature,
        Channel::MinTemperature,
        Channel::Humidity,
        Channel::Pressure,
        Channel::WeatherCoverage,
        Channel::WeatherIntensity,
        Channel::WeatherCondition,
        Channel::SkyCover,
        Channel::WindSpeed,
        Channel::GustSpeed,
        Channel::Precipitation,
        Channel::SnowDepth,
        Channel::MaxWindSpeed,
        Channel::MinWindSpeed,
        Channel::PrecipitationChance,
        Channel::UvIndex,
        Channel::Evapotranspiration,
    ];

    /// Driver identifier understood by the home-automation controller.
    pub fn driver_id(&self) -> &'static str {
        match self {
            Channel::Status => "ST",
            Channel::Temperature => "CLITEMP",
            Channel::Humidity => "CLIHUM",
            Channel::Pressure => "BARPRES",
            Channel::WindSpeed => "SPEED",
            Channel::GustSpeed => "GV5",
            Channel::WindDirection => "WINDDIR",
            Channel::DewPoint => "DEWPT",
            Channel::HeatIndex => "GV3",
            Channel::WindChill => "GV4",
            Channel::FeelsLike => "GV2",
            Channel::SolarRadiation => "SOLRAD",
            Channel::UvIndex => "UV",
            Channel::Visibility => "DISTANC",
            Channel::SnowDepth => "GV15",
            Channel::Precipitation => "GV6",
            Channel::SkyCover => "GV14",
            Channel::WeatherCoverage => "GV11",
            Channel::WeatherIntensity => "GV12",
            Channel::WeatherCondition => "GV13",
            Channel::MaxTemperature => "GV0",
            Channel::MinTemperature => "GV1",
            Channel::MaxWindSpeed => "GV7",
            Channel::MinWindSpeed => "GV8",
            Channel::PrecipitationChance => "GV18",
            Channel::DayOfWeek => "GV19",
            Channel::Evapotranspiration => "GV20",
        }
    }
}
