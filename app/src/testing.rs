use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::controller::Notices;
use crate::core::{Channel, UnitOfMeasure};
use crate::port::{ChannelSink, CreationAck, EntityRegistry, NewEntity, NoticeBoard, WeatherApi};
use crate::weather::EvapotranspirationModel;
use crate::weather::evapotranspiration::EtInputs;

#[derive(Clone, Default)]
pub struct FakeWeatherApi {
    pub observations: Option<Value>,
    pub summary: Option<Value>,
    pub forecasts: Option<Value>,
    pub(crate) requests: Arc<Mutex<Vec<String>>>,
}

impl FakeWeatherApi {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl WeatherApi for FakeWeatherApi {
    async fn fetch(&self, url: &str) -> anyhow::Result<Value> {
        self.requests.lock().unwrap().push(url.to_string());

        let doc = if url.contains("observations/summary/") {
            &self.summary
        } else if url.contains("forecasts/") {
            &self.forecasts
        } else {
            &self.observations
        };

        doc.clone().ok_or_else(|| anyhow!("connection refused"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reported {
    pub address: String,
    pub channel: Channel,
    pub value: f64,
    pub unit: UnitOfMeasure,
    pub force: bool,
}

#[derive(Clone, Default)]
pub struct RecordingSink {
    reported: Arc<Mutex<Vec<Reported>>>,
}

impl RecordingSink {
    pub fn reported(&self) -> Vec<Reported> {
        self.reported.lock().unwrap().clone()
    }

    pub fn value_of(&self, address: &str, channel: Channel) -> Option<f64> {
        self.find(address, channel).map(|r| r.value)
    }

    pub fn unit_of(&self, address: &str, channel: Channel) -> Option<UnitOfMeasure> {
        self.find(address, channel).map(|r| r.unit)
    }

    pub fn addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self.reported().into_iter().map(|r| r.address).collect();
        addresses.sort();
        addresses.dedup();
        addresses
    }

    fn find(&self, address: &str, channel: Channel) -> Option<Reported> {
        self.reported()
            .into_iter()
            .rev()
            .find(|r| r.address == address && r.channel == channel)
    }
}

impl ChannelSink for RecordingSink {
    async fn set_channel(
        &self,
        address: &str,
        channel: Channel,
        value: f64,
        unit: UnitOfMeasure,
        force: bool,
    ) -> anyhow::Result<()> {
        self.reported.lock().unwrap().push(Reported {
            address: address.to_string(),
            channel,
            value,
            unit,
            force,
        });
        Ok(())
    }
}

/// Returns a fixed rate and remembers what it was asked.
#[derive(Clone)]
pub struct FixedEt {
    pub rate_mm: f64,
    calls: Arc<Mutex<Vec<EtInputs>>>,
}

impl FixedEt {
    pub fn new(rate_mm: f64) -> Self {
        Self {
            rate_mm,
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<EtInputs> {
        self.calls.lock().unwrap().clone()
    }
}

impl EvapotranspirationModel for FixedEt {
    fn rate_mm(&self, inputs: &EtInputs) -> f64 {
        self.calls.lock().unwrap().push(inputs.clone());
        self.rate_mm
    }
}

/// In-memory entity registry. Creations stay pending until acknowledged, unless `auto_ack` is set.
#[derive(Clone, Default)]
pub struct FakeRegistry {
    pub existing: Vec<String>,
    pub fail_create: bool,
    pub auto_ack: bool,
    pub(crate) created: Arc<Mutex<Vec<NewEntity>>>,
    pub(crate) deleted: Arc<Mutex<Vec<String>>>,
    pub(crate) pending: Arc<Mutex<Vec<(String, oneshot::Sender<()>)>>>,
}

impl FakeRegistry {
    pub fn acknowledging() -> Self {
        Self {
            auto_ack: true,
            ..Default::default()
        }
    }

    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().iter().map(|e| e.address.clone()).collect()
    }

    pub fn created_entities(&self) -> Vec<NewEntity> {
        self.created.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn acknowledge(&self, address: &str) -> bool {
        let mut pending = self.pending.lock().unwrap();
        match pending.iter().position(|(a, _)| a == address) {
            Some(idx) => pending.remove(idx).1.send(()).is_ok(),
            None => false,
        }
    }

    pub fn drop_pending(&self) {
        self.pending.lock().unwrap().clear();
    }
}

impl EntityRegistry for FakeRegistry {
    async fn list_entities(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.existing.clone())
    }

    async fn create_entity(&self, entity: &NewEntity) -> anyhow::Result<CreationAck> {
        if self.fail_create {
            return Err(anyhow!("controller offline"));
        }

        self.created.lock().unwrap().push(entity.clone());
        let (tx, ack) = CreationAck::pending();

        if self.auto_ack {
            let _ = tx.send(());
        } else {
            self.pending.lock().unwrap().push((entity.address.clone(), tx));
        }

        Ok(ack)
    }

    async fn delete_entity(&self, address: &str) -> anyhow::Result<()> {
        self.deleted.lock().unwrap().push(address.to_string());
        Ok(())
    }

    async fn forget_pending(&self, address: &str) {
        self.pending.lock().unwrap().retain(|(a, _)| a != address);
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotices {
    published: Arc<Mutex<Vec<Notices>>>,
}

impl RecordingNotices {
    pub fn last(&self) -> Option<Notices> {
        self.published.lock().unwrap().last().cloned()
    }
}

impl NoticeBoard for RecordingNotices {
    async fn publish_notices(&self, notices: &Notices) -> anyhow::Result<()> {
        self.published.lock().unwrap().push(notices.clone());
        Ok(())
    }
}
