use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use anyhow::Context;
use infrastructure::{Mqtt, MqttInMessage, MqttSender, MqttSubscription};
use serde_json::{Value, json};
use tokio::sync::{Mutex, mpsc, oneshot};

use crate::controller::{Command, NodeEvent, Notices};
use crate::core::{Channel, UnitOfMeasure};
use crate::port::{ChannelSink, CreationAck, EntityRegistry, NewEntity, NoticeBoard};

#[derive(Debug, Clone)]
struct Topics {
    prefix: String,
}

impl Topics {
    fn channel(&self, address: &str, channel: Channel) -> String {
        format!("{}/{}/{}", self.prefix, address, channel.driver_id())
    }

    fn registry(&self, action: &str) -> String {
        format!("{}/registry/{}", self.prefix, action)
    }

    fn params(&self) -> String {
        format!("{}/params", self.prefix)
    }

    fn notices(&self) -> String {
        format!("{}/notices", self.prefix)
    }

    fn command(&self) -> String {
        format!("{}/command", self.prefix)
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    pending: Mutex<HashMap<String, oneshot::Sender<()>>>,
    entities: Mutex<BTreeSet<String>>,
}

impl RegistryState {
    async fn forget(&self, address: &str) -> bool {
        self.pending.lock().await.remove(address).is_some()
    }
}

/// Controller side of the node, spoken over MQTT below a common topic prefix.
#[derive(Clone)]
pub struct MqttController {
    sender: MqttSender,
    topics: Topics,
    state: Arc<RegistryState>,
}

/// Incoming controller messages: entity list, creation acknowledgments, parameter snapshots and
/// commands.
pub struct ControllerEvents {
    subscription: MqttSubscription,
    topics: Topics,
    state: Arc<RegistryState>,
}

impl MqttController {
    pub async fn new(mqtt: &mut Mqtt, topic_prefix: &str) -> anyhow::Result<(Self, ControllerEvents)> {
        let topics = Topics {
            prefix: topic_prefix.trim_end_matches('/').to_string(),
        };

        let subscription = mqtt
            .subscribe_all(&[
                topics.registry("entities"),
                topics.registry("added"),
                topics.params(),
                topics.command(),
            ])
            .await
            .context("Error subscribing to controller topics")?;

        let state = Arc::new(RegistryState::default());

        let controller = Self {
            sender: mqtt.sender(),
            topics: topics.clone(),
            state: state.clone(),
        };

        let events = ControllerEvents {
            subscription,
            topics,
            state,
        };

        Ok((controller, events))
    }
}

impl ChannelSink for MqttController {
    async fn set_channel(
        &self,
        address: &str,
        channel: Channel,
        value: f64,
        unit: UnitOfMeasure,
        force: bool,
    ) -> anyhow::Result<()> {
        let payload = channel_payload(value, unit, force);
        self.sender
            .send_retained(self.topics.channel(address, channel), payload.to_string())
            .await
    }
}

impl EntityRegistry for MqttController {
    async fn list_entities(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.state.entities.lock().await.iter().cloned().collect())
    }

    async fn create_entity(&self, entity: &NewEntity) -> anyhow::Result<CreationAck> {
        let payload = serde_json::to_string(entity)?;
        let (tx, ack) = CreationAck::pending();
        self.state.pending.lock().await.insert(entity.address.clone(), tx);

        if let Err(e) = self.sender.send_transient(self.topics.registry("create"), payload).await {
            self.state.forget(&entity.address).await;
            return Err(e.context(format!("Error requesting creation of {}", entity.address)));
        }

        Ok(ack)
    }

    async fn delete_entity(&self, address: &str) -> anyhow::Result<()> {
        let payload = json!({ "address": address }).to_string();
        self.sender
            .send_transient(self.topics.registry("delete"), payload)
            .await
            .with_context(|| format!("Error requesting deletion of {}", address))?;

        self.state.entities.lock().await.remove(address);
        Ok(())
    }

    async fn forget_pending(&self, address: &str) {
        if self.state.forget(address).await {
            tracing::debug!("Stopped waiting for {} to be added", address);
        }
    }
}

impl NoticeBoard for MqttController {
    async fn publish_notices(&self, notices: &Notices) -> anyhow::Result<()> {
        let payload = serde_json::to_string(notices)?;
        self.sender.send_retained(self.topics.notices(), payload).await
    }
}

impl ControllerEvents {
    pub async fn run(mut self, events_tx: mpsc::Sender<NodeEvent>) {
        while let Some(msg) = self.subscription.recv().await {
            let Some(event) = self.handle(&msg).await else {
                continue;
            };

            if let Err(e) = events_tx.send(event).await {
                tracing::error!("Error forwarding controller event: {}", e);
                return;
            }
        }

        tracing::warn!("Controller subscription closed");
    }

    /// Applies registry updates in place. Returns the event for the node if the message carried one.
    async fn handle(&self, msg: &MqttInMessage) -> Option<NodeEvent> {
        handle_message(&self.topics, &self.state, msg).await
    }
}

async fn handle_message(topics: &Topics, state: &RegistryState, msg: &MqttInMessage) -> Option<NodeEvent> {
    if msg.topic == topics.registry("entities") {
        match serde_json::from_str::<Vec<String>>(&msg.payload) {
            Ok(addresses) => {
                tracing::debug!("Controller holds entities {:?}", addresses);
                *state.entities.lock().await = addresses.into_iter().collect();
            }
            Err(e) => tracing::error!("Error parsing entity list {:?}: {}", msg.payload, e),
        }
    } else if msg.topic == topics.registry("added") {
        let address = parse_address(&msg.payload);
        state.entities.lock().await.insert(address.clone());

        match state.pending.lock().await.remove(&address) {
            Some(tx) => {
                tracing::info!("Entity {} added", address);
                let _ = tx.send(());
            }
            None => tracing::debug!("Entity {} added without pending request", address),
        }
    } else if msg.topic == topics.params() {
        match parse_params(&msg.payload) {
            Ok(snapshot) => return Some(NodeEvent::Params(snapshot)),
            Err(e) => tracing::error!("Error parsing parameters {:?}: {:?}", msg.payload, e),
        }
    } else if msg.topic == topics.command() {
        match parse_command(&msg.payload) {
            Some(command) => return Some(NodeEvent::Command(command)),
            None => tracing::warn!("Ignoring unknown command {:?}", msg.payload),
        }
    }

    None
}

fn channel_payload(value: f64, unit: UnitOfMeasure, force: bool) -> Value {
    json!({
        "value": value,
        "uom": unit.code(),
        "force": force,
    })
}

/// Accepts a bare address, a JSON string or `{"address": ...}`.
fn parse_address(payload: &str) -> String {
    match serde_json::from_str::<Value>(payload) {
        Ok(Value::String(address)) => address,
        Ok(Value::Object(obj)) => match obj.get("address").and_then(Value::as_str) {
            Some(address) => address.to_string(),
            None => payload.trim().to_string(),
        },
        _ => payload.trim().to_string(),
    }
}

/// Accepts a bare command name, a JSON string or `{"cmd": ...}`.
fn parse_command(payload: &str) -> Option<Command> {
    match serde_json::from_str::<Value>(payload) {
        Ok(Value::String(name)) => Command::from_name(&name),
        Ok(Value::Object(obj)) => obj.get("cmd").and_then(Value::as_str).and_then(Command::from_name),
        _ => Command::from_name(payload),
    }
}

fn parse_params(payload: &str) -> anyhow::Result<HashMap<String, String>> {
    let params: serde_json::Map<String, Value> = serde_json::from_str(payload).context("Expected JSON object")?;

    Ok(params
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Null => return None,
                Value::String(s) => s,
                other => other.to_string(),
            };
            Some((key, value))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use assert_json_diff::assert_json_eq;

    use super::*;

    fn topics() -> Topics {
        Topics {
            prefix: "udi/aeris".to_string(),
        }
    }

    fn msg(topic: &str, payload: &str) -> MqttInMessage {
        MqttInMessage {
            topic: topic.to_string(),
            payload: payload.to_string(),
        }
    }

    #[test]
    fn channel_topic_uses_driver_id() {
        assert_eq!(topics().channel("forecast_2", Channel::MaxTemperature), "udi/aeris/forecast_2/GV0");
        assert_eq!(topics().registry("added"), "udi/aeris/registry/added");
        assert_eq!(topics().command(), "udi/aeris/command");
    }

    #[test]
    fn channel_payload_carries_unit_code() {
        assert_json_eq!(
            channel_payload(21.4, UnitOfMeasure::CELSIUS, true),
            json!({"value": 21.4, "uom": 4, "force": true})
        );
    }

    #[test]
    fn new_entity_payload() {
        let entity = NewEntity {
            kind: "daily",
            address: "forecast_0".to_string(),
            name: "Forecast 0".to_string(),
            primary: "aeris".to_string(),
        };

        assert_json_eq!(
            serde_json::to_value(&entity).unwrap(),
            json!({"kind": "daily", "address": "forecast_0", "name": "Forecast 0", "primary": "aeris"})
        );
    }

    #[test]
    fn params_values_are_stringified() {
        let params = parse_params(r#"{"ClientID": "abc", "Forecast Days": 3, "Elevation": null}"#).unwrap();

        assert_eq!(params.get("ClientID").map(String::as_str), Some("abc"));
        assert_eq!(params.get("Forecast Days").map(String::as_str), Some("3"));
        assert!(!params.contains_key("Elevation"));
        assert!(parse_params("[1, 2]").is_err());
    }

    #[test]
    fn address_formats() {
        assert_eq!(parse_address("forecast_1\n"), "forecast_1");
        assert_eq!(parse_address(r#""forecast_1""#), "forecast_1");
        assert_eq!(parse_address(r#"{"address": "forecast_1"}"#), "forecast_1");
    }

    #[tokio::test]
    async fn added_message_resolves_pending_ack() {
        let state = RegistryState::default();
        let (tx, ack) = CreationAck::pending();
        state.pending.lock().await.insert("forecast_0".to_string(), tx);

        let res = handle_message(&topics(), &state, &msg("udi/aeris/registry/added", "forecast_0")).await;

        assert!(res.is_none());
        assert!(ack.wait().await.is_ok());
        assert!(state.entities.lock().await.contains("forecast_0"));
    }

    #[tokio::test]
    async fn entity_list_replaces_known_entities() {
        let state = RegistryState::default();
        state.entities.lock().await.insert("forecast_5".to_string());

        handle_message(
            &topics(),
            &state,
            &msg("udi/aeris/registry/entities", r#"["aeris", "forecast_0"]"#),
        )
        .await;

        let entities: Vec<_> = state.entities.lock().await.iter().cloned().collect();
        assert_eq!(entities, vec!["aeris", "forecast_0"]);
    }

    #[tokio::test]
    async fn params_message_yields_snapshot() {
        let state = RegistryState::default();

        let snapshot = handle_message(&topics(), &state, &msg("udi/aeris/params", r#"{"Units": "uk"}"#)).await;

        match snapshot {
            Some(NodeEvent::Params(params)) => assert_eq!(params.get("Units").map(String::as_str), Some("uk")),
            other => panic!("expected parameter snapshot, got {:?}", other),
        }
    }

    #[test]
    fn command_formats() {
        assert_eq!(parse_command("QUERY"), Some(Command::Query));
        assert_eq!(parse_command(r#""remove_notices_all""#), Some(Command::RemoveNoticesAll));
        assert_eq!(parse_command(r#"{"cmd": "QUERY"}"#), Some(Command::Query));
        assert_eq!(parse_command("DISCOVER"), None);
    }

    #[tokio::test]
    async fn command_message_yields_command() {
        let state = RegistryState::default();

        let event = handle_message(&topics(), &state, &msg("udi/aeris/command", "REMOVE_NOTICES_ALL")).await;

        assert_eq!(event, Some(NodeEvent::Command(Command::RemoveNoticesAll)));
    }

    #[tokio::test]
    async fn unknown_command_is_ignored() {
        let state = RegistryState::default();

        let event = handle_message(&topics(), &state, &msg("udi/aeris/command", "REBOOT")).await;

        assert!(event.is_none());
    }

    #[tokio::test]
    async fn forgotten_creation_is_not_acknowledged() {
        let state = RegistryState::default();
        let (tx, ack) = CreationAck::pending();
        state.pending.lock().await.insert("forecast_1".to_string(), tx);

        assert!(state.forget("forecast_1").await);
        assert!(!state.forget("forecast_1").await);
        assert!(ack.wait().await.is_err());

        handle_message(&topics(), &state, &msg("udi/aeris/registry/added", "forecast_1")).await;

        assert!(state.pending.lock().await.is_empty());
        assert!(state.entities.lock().await.contains("forecast_1"));
    }
}
