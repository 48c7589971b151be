use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use super::event::{Command, NodeEvent};
use super::params::{Notices, ParameterStore, ParameterUpdate};
use crate::core::{Channel, UnitOfMeasure};
use crate::forecast::{ForecastDays, ForecastLifecycleManager};
use crate::port::{ChannelSink, EntityRegistry, NoticeBoard, WeatherApi};
use crate::weather::{EvapotranspirationModel, QueryOrchestrator, QueryState};

const MIN_POLL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct NodeTiming {
    pub short_poll: Duration,
    pub long_poll: Duration,
}

/// The primary controller entity: owns the parameters, the forecast days and the poll schedule.
pub struct WeatherNode<A, S, E, R, N> {
    address: String,
    orchestrator: QueryOrchestrator<A, S, E>,
    lifecycle: ForecastLifecycleManager<R>,
    notices: N,
    params: ParameterStore,
    state: Arc<QueryState>,
    days: ForecastDays,
    timing: NodeTiming,
    started: bool,
    reconciled_days: Option<u8>,
}

impl<A, S, E, R, N> WeatherNode<A, S, E, R, N>
where
    A: WeatherApi,
    S: ChannelSink,
    E: EvapotranspirationModel,
    R: EntityRegistry,
    N: NoticeBoard,
{
    pub fn new(
        address: impl Into<String>,
        orchestrator: QueryOrchestrator<A, S, E>,
        lifecycle: ForecastLifecycleManager<R>,
        notices: N,
        timing: NodeTiming,
    ) -> Self {
        let params = ParameterStore::new();
        let state = params.state();

        Self {
            address: address.into(),
            orchestrator,
            lifecycle,
            notices,
            params,
            state,
            days: ForecastDays::new(),
            timing,
            started: false,
            reconciled_days: None,
        }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn days(&self) -> &ForecastDays {
        &self.days
    }

    /// Waits for a valid parameter snapshot, starts up, then polls until the controller event
    /// channel closes.
    pub async fn run(mut self, mut events: mpsc::Receiver<NodeEvent>) {
        tracing::info!("Waiting for configuration of {}", self.address);

        while !self.state.configured {
            match events.recv().await {
                Some(event) => self.handle_event(event).await,
                None => {
                    tracing::warn!("Controller event channel closed before the node was configured");
                    return;
                }
            }
        }

        self.start().await;

        let mut short_poll = poll_interval(self.timing.short_poll);
        let mut long_poll = poll_interval(self.timing.long_poll);

        loop {
            tokio::select! {
                _ = short_poll.tick() => {
                    self.orchestrator
                        .run_current_conditions_pass(&self.state, &self.address, false)
                        .await;
                }
                _ = long_poll.tick() => {
                    self.orchestrator.run_forecast_pass(&self.state, &mut self.days, false).await;
                }
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        tracing::info!("Controller event channel closed, stopping {}", self.address);
                        break;
                    }
                },
            }
        }
    }

    /// Reconciles the forecast days and reports everything once, forced.
    #[tracing::instrument(skip_all, fields(address = %self.address))]
    pub async fn start(&mut self) {
        tracing::info!("Starting weather node");
        self.started = true;

        self.reconcile().await;

        if let Err(e) = self
            .orchestrator
            .sink()
            .set_channel(&self.address, Channel::Status, 1.0, UnitOfMeasure::BOOLEAN, true)
            .await
        {
            tracing::error!("Error reporting node status: {:?}", e);
        }

        self.query().await;
    }

    /// Forced current-conditions and forecast passes.
    pub async fn query(&mut self) {
        self.orchestrator
            .run_current_conditions_pass(&self.state, &self.address, true)
            .await;
        self.orchestrator.run_forecast_pass(&self.state, &mut self.days, true).await;
    }

    async fn handle_event(&mut self, event: NodeEvent) {
        match event {
            NodeEvent::Params(snapshot) => {
                self.handle_params(&snapshot).await;
            }
            NodeEvent::Command(command) => self.handle_command(command).await,
        }
    }

    #[tracing::instrument(skip_all)]
    pub async fn handle_params(&mut self, snapshot: &HashMap<String, String>) -> ParameterUpdate {
        let update = self.params.apply(snapshot);

        if !update.changed.is_empty() {
            tracing::info!("Custom parameters changed: {:?}", update.changed);
        }

        if let Err(e) = self.notices.publish_notices(&update.notices).await {
            tracing::error!("Error publishing notices: {:?}", e);
        }

        self.state = update.state.clone();

        if update.day_count_changed {
            tracing::info!("Forecast days changed to {}", self.state.forecast_day_count);
        }

        //also catches counts changed while unconfigured and earlier failed reconciliations
        if self.started && self.state.configured && self.reconciled_days != Some(self.state.forecast_day_count) {
            self.reconcile().await;
            self.orchestrator.run_forecast_pass(&self.state, &mut self.days, true).await;
        }

        update
    }

    #[tracing::instrument(skip(self))]
    pub async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Query if !self.started => {
                tracing::warn!("Ignoring {}, node is not started", command);
            }
            Command::Query => {
                tracing::info!("Querying on request");
                self.query().await;
            }
            Command::RemoveNoticesAll => {
                tracing::info!("Removing all notices");
                if let Err(e) = self.notices.publish_notices(&Notices::default()).await {
                    tracing::error!("Error removing notices: {:?}", e);
                }
            }
        }
    }

    async fn reconcile(&mut self) {
        match self.lifecycle.reconcile(&self.state, &mut self.days).await {
            Ok(_) => self.reconciled_days = Some(self.state.forecast_day_count),
            Err(e) => {
                tracing::error!("Forecast day reconciliation failed: {}", e);
                self.reconciled_days = None;
            }
        }
    }
}

fn poll_interval(period: Duration) -> tokio::time::Interval {
    let period = period.max(MIN_POLL);
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
