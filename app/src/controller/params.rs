use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;

use crate::core::MeasurementSystem;
use crate::forecast::MAX_FORECAST_DAYS;
use crate::weather::QueryState;

pub const CLIENT_ID: &str = "ClientID";
pub const CLIENT_SECRET: &str = "ClientSecret";
pub const LOCATION: &str = "Location";
pub const UNITS: &str = "Units";
pub const FORECAST_DAYS: &str = "Forecast Days";
pub const ELEVATION: &str = "Elevation";
pub const PLANT_TYPE: &str = "Plant Type";

const CLIENT_ID_LEN: usize = 21;
const CLIENT_SECRET_LEN: usize = 40;
const DEFAULT_PLANT_COEFFICIENT: f64 = 0.23;

const DECLARED: [(&str, &str); 7] = [
    (CLIENT_ID, ""),
    (CLIENT_SECRET, ""),
    (LOCATION, ""),
    (UNITS, "metric"),
    (FORECAST_DAYS, "0"),
    (ELEVATION, "0"),
    (PLANT_TYPE, "0.23"),
];

/// Operator-facing messages keyed by topic (`id`, `secret`, `loc`, `days`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Notices(BTreeMap<&'static str, String>);

impl Notices {
    pub fn raise(&mut self, key: &'static str, message: impl Into<String>) {
        self.0.insert(key, message.into());
    }

    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ParameterUpdate {
    pub state: Arc<QueryState>,
    pub notices: Notices,
    pub changed: Vec<&'static str>,
    pub day_count_changed: bool,
}

/// Declared custom parameters with their defaults. A parameter counts as set once its value
/// differs from the default.
#[derive(Debug)]
pub struct ParameterStore {
    values: BTreeMap<&'static str, String>,
    current: Arc<QueryState>,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterStore {
    pub fn new() -> Self {
        Self {
            values: DECLARED.iter().map(|(key, default)| (*key, default.to_string())).collect(),
            current: Arc::new(QueryState::unconfigured()),
        }
    }

    pub fn state(&self) -> Arc<QueryState> {
        self.current.clone()
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_set(&self, key: &str) -> bool {
        DECLARED
            .iter()
            .find(|(declared, _)| *declared == key)
            .zip(self.values.get(key))
            .is_some_and(|((_, default), value)| value != default)
    }

    /// Loads a full parameter snapshot. Keys missing from the snapshot fall back to their default,
    /// unknown keys are ignored.
    #[tracing::instrument(skip_all)]
    pub fn apply(&mut self, snapshot: &HashMap<String, String>) -> ParameterUpdate {
        let mut changed = vec![];

        for (key, default) in DECLARED {
            let value = snapshot.get(key).map(|v| v.trim().to_string()).unwrap_or_else(|| default.to_string());
            if self.values.get(key) != Some(&value) {
                changed.push(key);
                self.values.insert(key, value);
            }
        }

        let mut notices = Notices::default();
        let state = Arc::new(self.build_state(&mut notices));
        if !notices.is_empty() {
            tracing::warn!("Parameter notices: {:?}", notices);
        }
        let day_count_changed = state.forecast_day_count != self.current.forecast_day_count;
        self.current = state.clone();

        ParameterUpdate {
            state,
            notices,
            changed,
            day_count_changed,
        }
    }

    fn build_state(&self, notices: &mut Notices) -> QueryState {
        let client_id = self.text(CLIENT_ID);
        let client_secret = self.text(CLIENT_SECRET);
        let location = self.text(LOCATION);

        let id_valid = self.is_set(CLIENT_ID) && client_id.len() == CLIENT_ID_LEN;
        let secret_valid = self.is_set(CLIENT_SECRET) && client_secret.len() == CLIENT_SECRET_LEN;
        let location_valid = self.is_set(LOCATION) && (location.contains("PWS") || location.len() > 2);

        if !id_valid {
            tracing::debug!("Client ID {} invalid", client_id);
            notices.raise("id", "AERIS client ID must be configured.");
        }
        if !secret_valid {
            tracing::debug!("Client secret invalid");
            notices.raise("secret", "AERIS client secret key must be configured.");
        }
        if !location_valid {
            tracing::debug!("Location {} invalid", location);
            notices.raise("loc", "AERIS location must be configured.");
        }

        QueryState {
            location: location.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            measurement_system: self.measurement_system(),
            forecast_day_count: self.forecast_day_count(notices),
            plant_coefficient: self.number(PLANT_TYPE, DEFAULT_PLANT_COEFFICIENT),
            elevation: self.number(ELEVATION, 0.0),
            configured: id_valid && secret_valid && location_valid,
        }
    }

    fn text(&self, key: &str) -> &str {
        self.value(key).unwrap_or_default()
    }

    fn measurement_system(&self) -> MeasurementSystem {
        let units = self.text(UNITS);
        MeasurementSystem::parse(units).unwrap_or_else(|| {
            tracing::warn!("Unknown units {}, using metric", units);
            MeasurementSystem::Metric
        })
    }

    fn forecast_day_count(&self, notices: &mut Notices) -> u8 {
        let raw = self.text(FORECAST_DAYS);

        match raw.parse::<u32>() {
            Ok(days) if days > MAX_FORECAST_DAYS as u32 => {
                tracing::warn!("Forecast Days {} above limit, using {}", days, MAX_FORECAST_DAYS);
                notices.raise("days", format!("Forecast Days limited to {}.", MAX_FORECAST_DAYS));
                MAX_FORECAST_DAYS
            }
            Ok(days) => days as u8,
            Err(_) => {
                tracing::warn!("Forecast Days {} is not a number, using 0", raw);
                notices.raise("days", "Forecast Days must be a number between 0 and 6.");
                0
            }
        }
    }

    fn number(&self, key: &str, default: f64) -> f64 {
        let raw = self.text(key);
        raw.parse().unwrap_or_else(|_| {
            tracing::warn!("{} {} is not a number, using {}", key, raw, default);
            default
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> HashMap<String, String> {
        [
            (CLIENT_ID, "a".repeat(21)),
            (CLIENT_SECRET, "b".repeat(40)),
            (LOCATION, "PWS_KMNPLYMO12".to_string()),
            (UNITS, "imperial".to_string()),
            (FORECAST_DAYS, "3".to_string()),
            (ELEVATION, "280".to_string()),
            (PLANT_TYPE, "0.5".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    fn with(key: &str, value: &str) -> HashMap<String, String> {
        let mut params = valid();
        params.insert(key.to_string(), value.to_string());
        params
    }

    #[test]
    fn starts_unconfigured_with_defaults() {
        let store = ParameterStore::new();

        assert!(!store.state().configured);
        assert_eq!(store.value(UNITS), Some("metric"));
        assert!(!store.is_set(CLIENT_ID));
    }

    #[test]
    fn valid_snapshot_configures_the_node() {
        let mut store = ParameterStore::new();

        let update = store.apply(&valid());

        assert!(update.notices.is_empty());
        assert!(update.state.configured);
        assert_eq!(update.state.measurement_system, MeasurementSystem::Imperial);
        assert_eq!(update.state.forecast_day_count, 3);
        assert_eq!(update.state.elevation, 280.0);
        assert_eq!(update.state.plant_coefficient, 0.5);
        assert!(update.day_count_changed);
        assert_eq!(update.changed.len(), 7);
    }

    #[test]
    fn wrong_client_id_length_raises_notice() {
        let mut store = ParameterStore::new();

        let update = store.apply(&with(CLIENT_ID, "too-short"));

        assert!(update.notices.contains("id"));
        assert!(!update.notices.contains("secret"));
        assert!(!update.state.configured);
    }

    #[test]
    fn missing_credentials_raise_all_notices() {
        let mut store = ParameterStore::new();

        let update = store.apply(&HashMap::new());

        assert!(update.notices.contains("id"));
        assert!(update.notices.contains("secret"));
        assert!(update.notices.contains("loc"));
        assert!(!update.state.configured);
    }

    #[test]
    fn short_location_is_accepted_only_with_pws() {
        let mut store = ParameterStore::new();

        assert!(store.apply(&with(LOCATION, "55")).notices.contains("loc"));
        assert!(!store.apply(&with(LOCATION, "mpls,mn")).notices.contains("loc"));
    }

    #[test]
    fn forecast_days_above_limit_are_clamped() {
        let mut store = ParameterStore::new();

        let update = store.apply(&with(FORECAST_DAYS, "9"));

        assert_eq!(update.state.forecast_day_count, 6);
        assert!(update.notices.contains("days"));
        assert!(update.state.configured);
    }

    #[test]
    fn unit_aliases_are_accepted() {
        let mut store = ParameterStore::new();

        assert_eq!(store.apply(&with(UNITS, "us")).state.measurement_system, MeasurementSystem::Imperial);
        assert_eq!(store.apply(&with(UNITS, "si")).state.measurement_system, MeasurementSystem::Metric);
        assert_eq!(store.apply(&with(UNITS, "uk")).state.measurement_system, MeasurementSystem::Uk);
        assert_eq!(store.apply(&with(UNITS, "kelvin")).state.measurement_system, MeasurementSystem::Metric);
    }

    #[test]
    fn reapplying_same_snapshot_changes_nothing() {
        let mut store = ParameterStore::new();
        store.apply(&valid());

        let update = store.apply(&valid());

        assert!(update.changed.is_empty());
        assert!(!update.day_count_changed);
    }

    #[test]
    fn day_count_change_is_detected() {
        let mut store = ParameterStore::new();
        store.apply(&valid());

        let update = store.apply(&with(FORECAST_DAYS, "5"));

        assert_eq!(update.changed, vec![FORECAST_DAYS]);
        assert!(update.day_count_changed);
    }

    #[test]
    fn notices_serialize_as_object() {
        let mut notices = Notices::default();
        notices.raise("days", "limited");

        assert_eq!(serde_json::to_value(&notices).unwrap(), serde_json::json!({"days": "limited"}));
    }
}
