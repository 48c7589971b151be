#![allow(async_fn_in_trait)]

use anyhow::Result;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::controller::Notices;
use crate::core::{Channel, UnitOfMeasure};

/// Fetches a JSON document from the remote weather API.
pub trait WeatherApi {
    async fn fetch(&self, url: &str) -> Result<Value>;
}

/// Publishes one channel value of an entity to the controller.
pub trait ChannelSink {
    async fn set_channel(
        &self,
        address: &str,
        channel: Channel,
        value: f64,
        unit: UnitOfMeasure,
        force: bool,
    ) -> Result<()>;
}

/// Entity lifecycle operations of the controller.
pub trait EntityRegistry {
    async fn list_entities(&self) -> Result<Vec<String>>;

    async fn create_entity(&self, entity: &NewEntity) -> Result<CreationAck>;

    async fn delete_entity(&self, address: &str) -> Result<()>;

    /// Stops waiting for the acknowledgment of an earlier creation request.
    async fn forget_pending(&self, address: &str);
}

/// Operator-facing notices of the controller. Each call replaces the whole set.
pub trait NoticeBoard {
    async fn publish_notices(&self, notices: &Notices) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NewEntity {
    pub kind: &'static str,
    pub address: String,
    pub name: String,
    pub primary: String,
}

/// Resolves once the controller confirms that a requested entity exists.
#[derive(Debug)]
pub struct CreationAck {
    rx: oneshot::Receiver<()>,
}

impl CreationAck {
    pub fn new(rx: oneshot::Receiver<()>) -> Self {
        Self { rx }
    }

    pub fn pending() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self::new(rx))
    }

    /// Fails if the acknowledging side went away without confirming.
    pub async fn wait(self) -> Result<(), oneshot::error::RecvError> {
        self.rx.await
    }
}
