use std::time::Duration;

use derive_more::derive::{Display, Error};
use tokio::time::{Instant, MissedTickBehavior};

use super::{DayLifecycle, ForecastDayEntity, ForecastDays, MAX_FORECAST_DAYS, address_of, name_of, offset_of};
use crate::port::{CreationAck, EntityRegistry, NewEntity};
use crate::weather::QueryState;

const FORECAST_KIND: &str = "daily";
const MIN_HEARTBEAT: Duration = Duration::from_millis(10);

#[derive(Debug, Display, Error)]
pub enum ReconcileError {
    #[display("Error requesting creation of {}: {:#}", address, source)]
    CreateFailed {
        address: String,
        #[error(not(source))]
        source: anyhow::Error,
    },
    #[display("No acknowledgment for {} within {:?}", address, timeout)]
    AckTimeout { address: String, timeout: Duration },
    #[display("Acknowledgment channel for {} closed", address)]
    AckDropped { address: String },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: Vec<u8>,
    pub deleted: Vec<u8>,
}

/// Brings the set of forecast-day entities in line with the configured day count.
pub struct ForecastLifecycleManager<R> {
    registry: R,
    primary_address: String,
    ack_timeout: Duration,
    heartbeat: Duration,
}

impl<R: EntityRegistry> ForecastLifecycleManager<R> {
    pub fn new(registry: R, primary_address: impl Into<String>, ack_timeout: Duration, heartbeat: Duration) -> Self {
        Self {
            registry,
            primary_address: primary_address.into(),
            ack_timeout,
            heartbeat: heartbeat.max(MIN_HEARTBEAT),
        }
    }

    /// Deletes surplus days without waiting, then creates missing days in ascending order, each
    /// one only after the previous creation was acknowledged. Stops at the first day that could
    /// not be created, so present offsets always stay contiguous from 0.
    ///
    /// Takes the day set mutably, which keeps a second reconciliation from starting while this
    /// one waits for acknowledgments.
    #[tracing::instrument(skip_all, fields(count = state.forecast_day_count))]
    pub async fn reconcile(&self, state: &QueryState, days: &mut ForecastDays) -> Result<ReconcileReport, ReconcileError> {
        let count = state.forecast_day_count.min(MAX_FORECAST_DAYS);
        let mut report = ReconcileReport::default();

        self.adopt_existing(state, days).await;

        for offset in days.offsets().into_iter().filter(|offset| *offset >= count) {
            let address = address_of(offset);
            tracing::info!("Removing forecast entity {}", address);

            if let Err(e) = self.registry.delete_entity(&address).await {
                tracing::error!("Error deleting {}: {:?}", address, e);
            }

            days.remove(offset);
            report.deleted.push(offset);
        }

        for offset in 0..count {
            if days.lifecycle(offset) == DayLifecycle::Present {
                continue;
            }

            let address = address_of(offset);
            let entity = NewEntity {
                kind: FORECAST_KIND,
                address: address.clone(),
                name: name_of(offset),
                primary: self.primary_address.clone(),
            };

            tracing::info!("Adding forecast entity {}", address);
            days.mark_requested(offset);

            let ack = match self.registry.create_entity(&entity).await {
                Ok(ack) => ack,
                Err(source) => {
                    days.remove(offset);
                    return Err(ReconcileError::CreateFailed { address, source });
                }
            };

            if let Err(e) = self.await_ack(&address, ack).await {
                self.registry.forget_pending(&address).await;
                days.remove(offset);
                return Err(e);
            }

            days.insert_present(ForecastDayEntity::new(offset, state.elevation, state.plant_coefficient));
            report.created.push(offset);
        }

        tracing::info!(
            "{} forecast days present, created {:?}, deleted {:?}",
            days.len(),
            report.created,
            report.deleted
        );
        Ok(report)
    }

    async fn adopt_existing(&self, state: &QueryState, days: &mut ForecastDays) {
        let addresses = match self.registry.list_entities().await {
            Ok(addresses) => addresses,
            Err(e) => {
                tracing::warn!("Error listing existing entities, assuming none: {:?}", e);
                return;
            }
        };

        for offset in addresses.iter().filter_map(|address| offset_of(address)) {
            if days.get(offset).is_none() {
                tracing::debug!("Adopting existing forecast entity {}", address_of(offset));
                days.insert_present(ForecastDayEntity::new(offset, state.elevation, state.plant_coefficient));
            }
        }
    }

    async fn await_ack(&self, address: &str, ack: CreationAck) -> Result<(), ReconcileError> {
        let started = Instant::now();
        let deadline = tokio::time::sleep(self.ack_timeout);
        let mut heartbeat = tokio::time::interval_at(started + self.heartbeat, self.heartbeat);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let ack = ack.wait();
        tokio::pin!(deadline, ack);

        loop {
            tokio::select! {
                res = &mut ack => {
                    return res.map_err(|_| ReconcileError::AckDropped { address: address.to_string() });
                }
                _ = &mut deadline => {
                    return Err(ReconcileError::AckTimeout {
                        address: address.to_string(),
                        timeout: self.ack_timeout,
                    });
                }
                _ = heartbeat.tick() => {
                    tracing::info!("Waiting for {} to be added, {:?} elapsed", address, started.elapsed());
                }
            }
        }
    }
}
