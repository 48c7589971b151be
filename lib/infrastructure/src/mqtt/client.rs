use std::sync::Arc;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, Publish, QoS};
use tokio::sync::mpsc;

use super::*;

pub struct Mqtt {
    client: Arc<AsyncClient>,
    event_loop: EventLoop,
    subscriptions: Vec<MqttSubscriptionHandle>,
}

struct MqttSubscriptionHandle {
    topic: String,
    txs: Vec<mpsc::Sender<MqttInMessage>>,
}

impl Mqtt {
    pub fn connect(host: &str, port: u16, client_id: &str) -> Self {
        let mut mqttoptions = MqttOptions::new(client_id, host, port);
        mqttoptions.set_keep_alive(::std::time::Duration::from_secs(5));
        mqttoptions.set_clean_session(false);
        mqttoptions.set_max_packet_size(1024 * 1024, 1024 * 1024);

        let (client, event_loop) = AsyncClient::new(mqttoptions, 10);

        Mqtt {
            client: Arc::new(client),
            event_loop,
            subscriptions: vec![],
        }
    }

    pub async fn subscribe(&mut self, topic: impl Into<String>) -> anyhow::Result<MqttSubscription> {
        self.subscribe_all(&[topic.into()]).await
    }

    pub async fn subscribe_all(&mut self, topics: &[String]) -> anyhow::Result<MqttSubscription> {
        let (tx, rx) = mpsc::channel::<MqttInMessage>(32);

        for topic in topics {
            if let Some(subscription) = self.subscriptions.iter_mut().find(|s| s.topic == *topic) {
                tracing::info!("Adding subscriber to existing subscription: {:?}", &topic);

                subscription.txs.push(tx.clone());
                continue;
            };

            tracing::info!("Creating new subscription for topic: {:?}", &topic);

            self.subscriptions.push(MqttSubscriptionHandle {
                topic: topic.clone(),
                txs: vec![tx.clone()],
            });

            self.client.subscribe(topic, QoS::AtLeastOnce).await?;
        }

        Ok(MqttSubscription::new(rx))
    }

    pub fn sender(&self) -> MqttSender {
        MqttSender::new(self.client.clone())
    }

    pub async fn run(mut self) {
        //Receive and forward MQTT messages
        loop {
            match self.event_loop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    self.handle_publish(publish).await;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("MQTT error: {}", e);
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                }
            }
        }
    }

    async fn handle_publish(&self, msg: Publish) {
        let mqtt_in_message: MqttInMessage = match (&msg).try_into() {
            Ok(m) => m,
            Err(e) => {
                tracing::error!("Error parsing MQTT message: {}", e);
                return;
            }
        };

        tracing::trace!("Received MQTT message on topic {}", mqtt_in_message.topic);

        for sub in self.subscriptions.iter().filter(|s| s.topic == mqtt_in_message.topic) {
            for tx in sub.txs.iter() {
                if let Err(e) = tx
                    .send_timeout(mqtt_in_message.clone(), tokio::time::Duration::from_secs(5))
                    .await
                {
                    tracing::error!("Failed to forward MQTT message to subscriber {}: {}", sub.topic, e);
                }
            }
        }
    }
}
