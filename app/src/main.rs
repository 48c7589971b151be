use adapter::mqtt::MqttController;
use controller::WeatherNode;
use forecast::ForecastLifecycleManager;
use settings::Settings;
use tokio::sync::mpsc;
use weather::{Fao56, QueryOrchestrator};

mod adapter;
mod controller;
mod core;
mod forecast;
pub mod port;
mod settings;
#[cfg(test)]
mod testing;
mod weather;

#[tokio::main(flavor = "multi_thread")]
pub async fn main() {
    let settings = Settings::new().expect("Error reading configuration");

    settings.monitoring.init().expect("Error initializing monitoring");

    let mut mqtt_client = settings.mqtt.new_client();

    let (controller, controller_events) = MqttController::new(&mut mqtt_client, &settings.node.topic_prefix)
        .await
        .expect("Error connecting to controller");

    let aeris = settings.aeris.new_client().expect("Error creating Aeris client");

    let orchestrator = QueryOrchestrator::new(aeris, controller.clone(), Fao56, settings.aeris.base_url.clone());
    let lifecycle = ForecastLifecycleManager::new(
        controller.clone(),
        settings.node.address.clone(),
        settings.node.ack_timeout(),
        settings.node.ack_poll(),
    );
    let node = WeatherNode::new(
        settings.node.address.clone(),
        orchestrator,
        lifecycle,
        controller,
        settings.node.timing(),
    );

    let (events_tx, events_rx) = mpsc::channel(8);

    tracing::info!("Starting main loop");

    tokio::select!(
        _ = mqtt_client.run() => {},
        _ = controller_events.run(events_tx) => {},
        _ = node.run(events_rx) => {},
    );
}
