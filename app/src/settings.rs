use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use infrastructure::{MonitoringConfig, MqttConfig};
use serde::Deserialize;

use crate::adapter::aeris::AerisSettings;
use crate::controller::NodeTiming;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub monitoring: MonitoringConfig,
    pub mqtt: MqttConfig,
    pub aeris: AerisSettings,
    pub node: NodeSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config.toml"))
            .add_source(Environment::default().separator("__").list_separator(","));

        let s = builder.build()?;
        let settings: Settings = s.try_deserialize()?;
        settings.node.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NodeSettings {
    pub address: String,
    pub topic_prefix: String,
    pub short_poll_secs: u64,
    pub long_poll_secs: u64,
    pub ack_timeout_secs: u64,
    pub ack_poll_secs: u64,
}

impl NodeSettings {
    /// Intervals and timeouts must be at least one second.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("short_poll_secs", self.short_poll_secs),
            ("long_poll_secs", self.long_poll_secs),
            ("ack_timeout_secs", self.ack_timeout_secs),
            ("ack_poll_secs", self.ack_poll_secs),
        ];

        match durations.iter().find(|(_, secs)| *secs == 0) {
            Some((name, _)) => Err(ConfigError::Message(format!("node.{} must be greater than 0", name))),
            None => Ok(()),
        }
    }

    pub fn timing(&self) -> NodeTiming {
        NodeTiming {
            short_poll: Duration::from_secs(self.short_poll_secs),
            long_poll: Duration::from_secs(self.long_poll_secs),
        }
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_secs(self.ack_timeout_secs)
    }

    pub fn ack_poll(&self) -> Duration {
        Duration::from_secs(self.ack_poll_secs)
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    const SAMPLE: &str = r#"
        [monitoring]
        service_name = "aeris-node"
        json = false

        [monitoring.logs]
        default_level = "info"
        filters = ["aeris_node=debug"]

        [mqtt]
        host = "localhost"
        port = 1883
        client_id = "aeris-node"

        [aeris]
        timeout_secs = 15

        [node]
        address = "aeris"
        topic_prefix = "udi/aeris"
        short_poll_secs = 600
        long_poll_secs = 3600
        ack_timeout_secs = 120
        ack_poll_secs = 2
    "#;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn sample_config_deserializes() {
        let settings = parse(SAMPLE);

        assert_eq!(settings.aeris.base_url, "http://api.aerisapi.com/");
        assert_eq!(settings.aeris.timeout_secs, 15);
        assert_eq!(settings.node.timing().short_poll, Duration::from_secs(600));
        assert_eq!(settings.node.ack_timeout(), Duration::from_secs(120));
        assert_eq!(settings.node.ack_poll(), Duration::from_secs(2));
    }

    #[test]
    fn sample_config_is_valid() {
        assert!(parse(SAMPLE).node.validate().is_ok());
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let settings = parse(&SAMPLE.replace("ack_poll_secs = 2", "ack_poll_secs = 0"));
        let err = settings.node.validate().unwrap_err();
        assert!(err.to_string().contains("ack_poll_secs"));

        let settings = parse(&SAMPLE.replace("short_poll_secs = 600", "short_poll_secs = 0"));
        assert!(settings.node.validate().is_err());
    }
}
