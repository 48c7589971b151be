mod lifecycle;

use std::collections::{BTreeMap, BTreeSet};

use crate::core::Channel;

pub use lifecycle::ForecastLifecycleManager;

/// Upper bound of forecast days supported by the remote API.
pub const MAX_FORECAST_DAYS: u8 = 6;

const ADDRESS_PREFIX: &str = "forecast_";

/// One calendar day (midnight to midnight) of forecast data.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDayEntity {
    pub day_offset: u8,
    pub latitude: f64,
    pub elevation: f64,
    pub plant_coefficient: f64,
    pub min_humidity: f64,
    pub max_humidity: f64,
    values: BTreeMap<Channel, f64>,
}

impl ForecastDayEntity {
    pub fn new(day_offset: u8, elevation: f64, plant_coefficient: f64) -> Self {
        Self {
            day_offset,
            latitude: 0.0,
            elevation,
            plant_coefficient,
            min_humidity: 0.0,
            max_humidity: 0.0,
            values: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> String {
        address_of(self.day_offset)
    }

    /// Last value reported on a channel.
    pub fn value(&self, channel: Channel) -> Option<f64> {
        self.values.get(&channel).copied()
    }

    pub fn record(&mut self, channel: Channel, value: f64) {
        self.values.insert(channel, value);
    }
}

pub fn address_of(day_offset: u8) -> String {
    format!("{}{}", ADDRESS_PREFIX, day_offset)
}

pub fn name_of(day_offset: u8) -> String {
    format!("Forecast {}", day_offset)
}

/// Day offset encoded in a forecast entity address, e.g. `forecast_3`.
pub fn offset_of(address: &str) -> Option<u8> {
    address.strip_prefix(ADDRESS_PREFIX)?.parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayLifecycle {
    Absent,
    CreateRequested,
    Present,
}

/// Forecast-day entities known to this node, keyed by day offset.
#[derive(Debug, Default)]
pub struct ForecastDays {
    present: BTreeMap<u8, ForecastDayEntity>,
    requested: BTreeSet<u8>,
}

impl ForecastDays {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lifecycle(&self, day_offset: u8) -> DayLifecycle {
        if self.present.contains_key(&day_offset) {
            DayLifecycle::Present
        } else if self.requested.contains(&day_offset) {
            DayLifecycle::CreateRequested
        } else {
            DayLifecycle::Absent
        }
    }

    pub fn get(&self, day_offset: u8) -> Option<&ForecastDayEntity> {
        self.present.get(&day_offset)
    }

    pub fn get_mut(&mut self, day_offset: u8) -> Option<&mut ForecastDayEntity> {
        self.present.get_mut(&day_offset)
    }

    pub fn offsets(&self) -> Vec<u8> {
        self.present.keys().chain(self.requested.iter()).copied().collect()
    }

    pub fn len(&self) -> usize {
        self.present.len()
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    fn mark_requested(&mut self, day_offset: u8) {
        self.requested.insert(day_offset);
    }

    /// Tracks an entity the controller already holds.
    pub fn insert_present(&mut self, entity: ForecastDayEntity) {
        self.requested.remove(&entity.day_offset);
        self.present.insert(entity.day_offset, entity);
    }

    fn remove(&mut self, day_offset: u8) {
        self.requested.remove(&day_offset);
        self.present.remove(&day_offset);
    }
}
