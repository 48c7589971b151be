use chrono::{DateTime, Datelike, Utc};
use serde_json::Value;

use super::evapotranspiration::{EtInputs, EvapotranspirationModel};
use super::profile::{self, UnitProfile, numeric_value};
use super::QueryError;
use crate::core::ext::ResultExt;
use crate::core::unit::{fahrenheit_to_celsius, kph_to_mps, mm_to_inch, mph_to_mps};
use crate::core::{Channel, MeasurementSystem, UnitOfMeasure};
use crate::forecast::{ForecastDayEntity, ForecastDays};
use crate::port::{ChannelSink, WeatherApi};

/// Connection parameters for one pass. Built from the operator's parameters and replaced as a
/// whole when they change, so a pass never sees a half-applied update.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub location: String,
    pub client_id: String,
    pub client_secret: String,
    pub measurement_system: MeasurementSystem,
    pub forecast_day_count: u8,
    pub plant_coefficient: f64,
    pub elevation: f64,
    pub configured: bool,
}

impl QueryState {
    pub fn unconfigured() -> Self {
        Self {
            location: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            measurement_system: MeasurementSystem::Metric,
            forecast_day_count: 0,
            plant_coefficient: 0.23,
            elevation: 0.0,
            configured: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherRequest {
    Observations,
    ObservationSummary,
    Forecasts { days: u8 },
}

impl WeatherRequest {
    fn resource(&self) -> &'static str {
        match self {
            WeatherRequest::Observations => "observations",
            WeatherRequest::ObservationSummary => "observations/summary",
            WeatherRequest::Forecasts { .. } => "forecasts",
        }
    }

    pub fn url(&self, base_url: &str, state: &QueryState) -> String {
        let mut url = format!(
            "{}{}/{}?client_id={}&client_secret={}",
            base_url,
            self.resource(),
            state.location,
            state.client_id,
            state.client_secret
        );

        match self {
            WeatherRequest::Observations => {}
            WeatherRequest::ObservationSummary => url.push_str("&fields=periods.summary.precip"),
            WeatherRequest::Forecasts { days } => {
                url.push_str(&format!("&filter=mdnt2mdnt&precise&limit={}", days));
            }
        }

        url
    }
}

pub struct QueryOrchestrator<A, S, E> {
    api: A,
    sink: S,
    et_model: E,
    base_url: String,
    latitude: f64,
}

impl<A, S, E> QueryOrchestrator<A, S, E>
where
    A: WeatherApi,
    S: ChannelSink,
    E: EvapotranspirationModel,
{
    pub fn new(api: A, sink: S, et_model: E, base_url: impl Into<String>) -> Self {
        Self {
            api,
            sink,
            et_model,
            base_url: base_url.into(),
            latitude: 0.0,
        }
    }

    /// Latitude reported by the most recent successful current-conditions fetch.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[tracing::instrument(skip_all, fields(target = %target))]
    pub async fn run_current_conditions_pass(&mut self, state: &QueryState, target: &str, force: bool) {
        match self.current_conditions(state, target, force).await {
            Ok(()) => {}
            Err(QueryError::NotConfigured) => {
                tracing::info!("Skipping current conditions because the node isn't configured yet");
            }
            Err(e) => tracing::error!("Current observation update failure: {}", e),
        }
    }

    #[tracing::instrument(skip_all)]
    pub async fn run_forecast_pass(&self, state: &QueryState, days: &mut ForecastDays, force: bool) {
        match self.forecasts(state, days, force).await {
            Ok(()) => {}
            Err(QueryError::NotConfigured) => {
                tracing::info!("Skipping forecast because the node isn't configured yet");
            }
            Err(e) => tracing::error!("Forecast update failure: {}", e),
        }
    }

    async fn current_conditions(&mut self, state: &QueryState, target: &str, force: bool) -> Result<(), QueryError> {
        if !state.configured {
            return Err(QueryError::NotConfigured);
        }

        let profile = UnitProfile::new(state.measurement_system);
        let doc = self.fetch(WeatherRequest::Observations, state).await?;

        let response = first_response(&doc).ok_or(QueryError::MalformedResponse("response"))?;
        let ob = response.get("ob").ok_or(QueryError::MalformedResponse("response.ob"))?;

        match response.get("loc").and_then(|loc| loc.get("lat")).and_then(numeric_value) {
            Some(lat) => self.latitude = lat,
            None => tracing::error!("No latitude data in response"),
        }

        for channel in Channel::OBSERVED {
            if matches!(channel, Channel::Status | Channel::Precipitation) {
                continue;
            }

            match profile.resolve_observation(channel, ob) {
                Ok(value) => {
                    let value = profile.to_reported(channel, value);
                    self.report(target, channel, value, profile.unit(channel), force).await;
                }
                Err(e) => tracing::warn!("Skipping {}: {}", channel, e),
            }
        }

        let precipitation = self
            .precipitation_summary(state, &profile)
            .await
            .unwrap_or_warn(0.0, "Precipitation summary update failure");

        self.report(
            target,
            Channel::Precipitation,
            profile.to_reported(Channel::Precipitation, precipitation),
            profile.unit(Channel::Precipitation),
            force,
        )
        .await;

        Ok(())
    }

    async fn precipitation_summary(&self, state: &QueryState, profile: &UnitProfile) -> Result<f64, QueryError> {
        let doc = self.fetch(WeatherRequest::ObservationSummary, state).await?;

        let summary = first_response(&doc)
            .ok_or(QueryError::MalformedResponse("response"))?
            .get("periods")
            .and_then(|periods| periods.get(0))
            .and_then(|period| period.get("summary"))
            .ok_or(QueryError::MalformedResponse("response.periods[0].summary"))?;

        let precip = summary
            .get("precip")
            .ok_or(QueryError::MalformedResponse("response.periods[0].summary.precip"))?;

        let tag = profile.precip_summary_tag();
        precip
            .get(tag)
            .and_then(numeric_value)
            .ok_or_else(|| QueryError::FieldNotFound {
                channel: Channel::Precipitation,
                tag: tag.to_string(),
            })
    }

    async fn forecasts(&self, state: &QueryState, days: &mut ForecastDays, force: bool) -> Result<(), QueryError> {
        if !state.configured {
            return Err(QueryError::NotConfigured);
        }

        let profile = UnitProfile::new(state.measurement_system);
        let doc = self
            .fetch(WeatherRequest::Forecasts { days: state.forecast_day_count }, state)
            .await?;

        let periods = first_response(&doc)
            .and_then(|response| response.get("periods"))
            .and_then(|periods| periods.as_array())
            .ok_or(QueryError::MalformedResponse("response.periods"))?;

        tracing::debug!("Processing {} forecast periods", periods.len());

        for (offset, period) in periods.iter().take(state.forecast_day_count as usize).enumerate() {
            let Some(day) = days.get_mut(offset as u8) else {
                tracing::warn!("No forecast entity for day {}, skipping period", offset);
                continue;
            };

            self.map_forecast_period(state, &profile, day, period, force).await;
        }

        Ok(())
    }

    async fn map_forecast_period(
        &self,
        state: &QueryState,
        profile: &UnitProfile,
        day: &mut ForecastDayEntity,
        period: &Value,
        force: bool,
    ) {
        let address = day.address();
        let timestamp = period_timestamp(period);

        day.latitude = self.latitude;
        day.elevation = state.elevation;
        day.plant_coefficient = state.plant_coefficient;

        for channel in Channel::FORECAST {
            let value = match channel {
                Channel::Evapotranspiration => continue,
                Channel::DayOfWeek => match timestamp {
                    Some(ts) => ts.weekday().num_days_from_monday() as f64,
                    None => {
                        tracing::warn!("Skipping {} of {}: period has no timestamp", channel, address);
                        continue;
                    }
                },
                _ => match profile.resolve_forecast(channel, period) {
                    Ok(value) => profile.to_reported(channel, value),
                    Err(e) => {
                        tracing::warn!("Skipping {} of {}: {}", channel, address, e);
                        continue;
                    }
                },
            };

            day.record(channel, value);
            self.report(&address, channel, value, profile.unit(channel), force).await;
        }

        if let Some(humidity) = period.get(profile::MIN_HUMIDITY_TAG).and_then(numeric_value) {
            day.min_humidity = humidity;
        }
        if let Some(humidity) = period.get(profile::MAX_HUMIDITY_TAG).and_then(numeric_value) {
            day.max_humidity = humidity;
        }

        match timestamp {
            Some(ts) => {
                let et = self.evapotranspiration(profile, day, ts);
                day.record(Channel::Evapotranspiration, et);
                self.report(&address, Channel::Evapotranspiration, et, profile.unit(Channel::Evapotranspiration), force)
                    .await;
            }
            None => tracing::warn!("Skipping evapotranspiration of {}: period has no timestamp", address),
        }
    }

    fn evapotranspiration(&self, profile: &UnitProfile, day: &ForecastDayEntity, timestamp: DateTime<Utc>) -> f64 {
        let mut t_min = day.value(Channel::MinTemperature).unwrap_or_default();
        let mut t_max = day.value(Channel::MaxTemperature).unwrap_or_default();
        let wind = day.value(Channel::WindSpeed).unwrap_or_default();

        if profile.temperature_in_fahrenheit() {
            t_min = fahrenheit_to_celsius(t_min);
            t_max = fahrenheit_to_celsius(t_max);
        }
        let wind_speed_mps = if profile.wind_in_mph() {
            mph_to_mps(wind)
        } else {
            kph_to_mps(wind)
        };

        let inputs = EtInputs {
            t_min_c: t_min,
            t_max_c: t_max,
            wind_speed_mps,
            elevation_m: day.elevation,
            humidity_min: day.min_humidity,
            humidity_max: day.max_humidity,
            latitude_deg: day.latitude,
            plant_coefficient: day.plant_coefficient,
            day_of_year: timestamp.ordinal(),
        };

        let mm = self.et_model.rate_mm(&inputs);
        tracing::debug!("ETo for {} = {} mm", day.address(), mm);

        let rate = match profile.system() {
            MeasurementSystem::Metric => mm,
            MeasurementSystem::Imperial | MeasurementSystem::Uk => mm_to_inch(mm),
        };

        profile.to_reported(Channel::Evapotranspiration, rate)
    }

    async fn fetch(&self, request: WeatherRequest, state: &QueryState) -> Result<Value, QueryError> {
        let url = request.url(&self.base_url, state);
        tracing::debug!("request = {}", url.replace(&state.client_secret, "***"));

        self.api.fetch(&url).await.map_err(QueryError::Fetch)
    }

    async fn report(&self, address: &str, channel: Channel, value: f64, unit: UnitOfMeasure, force: bool) {
        if let Err(e) = self.sink.set_channel(address, channel, value, unit, force).await {
            tracing::warn!("Error reporting {} of {}: {:?}", channel, address, e);
        }
    }
}

/// The API wraps results either in an object or in a list of objects.
fn first_response(doc: &Value) -> Option<&Value> {
    match doc.get("response")? {
        Value::Array(items) => items.first(),
        response => Some(response),
    }
}

fn period_timestamp(period: &Value) -> Option<DateTime<Utc>> {
    if let Some(epoch) = period.get(profile::TIMESTAMP_TAG).and_then(|v| v.as_i64()) {
        return DateTime::from_timestamp(epoch, 0);
    }

    period
        .get(profile::DATE_TIME_TAG)
        .and_then(|v| v.as_str())
        .and_then(|iso| DateTime::parse_from_rfc3339(iso).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
