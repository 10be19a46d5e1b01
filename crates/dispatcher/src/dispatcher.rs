//! FanOutDispatcher - acknowledge now, fan out after the adaptive delay

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, info, info_span, instrument, warn, Instrument};

use contracts::{
    Acknowledgment, DelayConfig, RecorderConfig, RelayBlueprint, TargetConfig, TargetType,
    WorkOrderEvent,
};
use recorder::ConfiguredRecorder;

use crate::delay::DelayCounter;
use crate::error::DispatcherError;
use crate::handle::{Delivery, RecorderHandle, TargetHandle};
use crate::metrics::MetricsSnapshot;
use crate::shaping::ShapingTable;
use crate::targets::{HttpTarget, LogTarget};

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub delay: DelayConfig,
    pub targets: Vec<TargetConfig>,
    pub recorder: RecorderConfig,
    pub recorder_queue_capacity: usize,
}

impl DispatcherConfig {
    pub fn from_blueprint(blueprint: &RelayBlueprint) -> Self {
        Self {
            delay: blueprint.delay,
            targets: blueprint.targets.clone(),
            recorder: blueprint.recorder.clone(),
            recorder_queue_capacity: blueprint.dispatch.recorder_queue_capacity,
        }
    }
}

/// Builder for creating a FanOutDispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
}

impl DispatcherBuilder {
    pub fn new(config: DispatcherConfig) -> Self {
        Self { config }
    }

    /// Build target handles and the recorder, then assemble the dispatcher
    ///
    /// Must be called inside a tokio runtime: every handle spawns its worker.
    #[instrument(name = "dispatcher_builder_build", skip(self))]
    pub async fn build(self) -> Result<FanOutDispatcher, DispatcherError> {
        let handles = Self::initialize_handles(&self.config)?;
        let recorder = Self::initialize_recorder(&self.config).await?;
        let shaping = ShapingTable::from_configs(&self.config.targets);

        info!(
            targets = handles.len(),
            recorder = recorder.as_ref().map_or("none", |r| r.name()),
            floor_ms = self.config.delay.floor_ms,
            step_ms = self.config.delay.step_ms,
            ceiling_ms = self.config.delay.ceiling_ms,
            "Dispatcher built"
        );

        Ok(FanOutDispatcher::with_handles(
            self.config.delay,
            handles,
            shaping,
            recorder,
        ))
    }

    #[instrument(
        name = "dispatcher_initialize_handles",
        skip(config),
        fields(target_count = config.targets.len())
    )]
    fn initialize_handles(config: &DispatcherConfig) -> Result<Vec<TargetHandle>, DispatcherError> {
        config.targets.iter().map(create_target_handle).collect()
    }

    async fn initialize_recorder(
        config: &DispatcherConfig,
    ) -> Result<Option<RecorderHandle>, DispatcherError> {
        let recorder = ConfiguredRecorder::from_config(&config.recorder).await?;
        Ok(recorder.map(|r| RecorderHandle::spawn(r, config.recorder_queue_capacity)))
    }
}

/// Create a TargetHandle from configuration
#[instrument(
    name = "dispatcher_create_target_handle",
    skip(config),
    fields(target_name = %config.name, target_type = ?config.target_type)
)]
fn create_target_handle(config: &TargetConfig) -> Result<TargetHandle, DispatcherError> {
    match config.target_type {
        TargetType::Log => {
            let target = LogTarget::new(config.name.to_string());
            Ok(TargetHandle::spawn(target, config.queue_capacity))
        }
        TargetType::Http => {
            let target = HttpTarget::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::target_creation(config.name.to_string(), e.to_string()))?;
            Ok(TargetHandle::spawn(target, config.queue_capacity))
        }
    }
}

/// Targets plus their shaping rules, shared with every deferred dispatch
struct FanOut {
    targets: Vec<TargetHandle>,
    shaping: ShapingTable,
}

impl FanOut {
    fn dispatch(&self, event: &WorkOrderEvent) {
        for handle in &self.targets {
            let payload = self.shaping.payload_for(handle.name(), event);
            handle.try_send(Delivery {
                work_order_id: event.work_order_id.clone(),
                payload,
            });
        }
    }

    /// Close every handle and report what each target ended with
    async fn close(&self) -> Vec<(String, MetricsSnapshot)> {
        let mut totals = Vec::with_capacity(self.targets.len());
        for handle in &self.targets {
            handle.close().await;
            totals.push((handle.name().to_string(), handle.metrics().snapshot()));
        }
        totals
    }
}

/// Count of deferred dispatches that have not fired yet
#[derive(Debug, Default)]
struct PendingDispatches {
    count: AtomicUsize,
    idle: Notify,
}

impl PendingDispatches {
    fn enter(self: &Arc<Self>) -> PendingGuard {
        let now = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        observability::set_pending_dispatches(now);
        PendingGuard(Arc::clone(self))
    }

    fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.get() == 0 {
                return;
            }
            notified.await;
        }
    }
}

struct PendingGuard(Arc<PendingDispatches>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let left = self.0.count.fetch_sub(1, Ordering::SeqCst) - 1;
        observability::set_pending_dispatches(left);
        if left == 0 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Accepts work orders and fans them out to every target after a delay
///
/// Owns the delay counter: each instance starts its own sawtooth.
pub struct FanOutDispatcher {
    delay: DelayCounter,
    fan_out: Arc<FanOut>,
    recorder: Option<RecorderHandle>,
    pending: Arc<PendingDispatches>,
}

impl FanOutDispatcher {
    /// Create a dispatcher with custom handles (for testing)
    pub fn with_handles(
        delay: DelayConfig,
        targets: Vec<TargetHandle>,
        shaping: ShapingTable,
        recorder: Option<RecorderHandle>,
    ) -> Self {
        Self {
            delay: DelayCounter::new(delay),
            fan_out: Arc::new(FanOut { targets, shaping }),
            recorder,
            pending: Arc::new(PendingDispatches::default()),
        }
    }

    /// Accept an event and schedule its fan-out
    ///
    /// Never waits on recording or delivery. Must be called from within a
    /// tokio runtime.
    pub fn accept(&self, event: WorkOrderEvent) -> Acknowledgment {
        let event = Arc::new(event);

        if let Some(recorder) = &self.recorder {
            recorder.try_send(Arc::clone(&event));
        }

        let delay_ms = self.delay.advance();
        observability::record_event_accepted(delay_ms);

        let work_order_id = event.work_order_id.clone();
        debug!(work_order_id = %work_order_id, delay_ms, "Dispatch scheduled");

        let guard = self.pending.enter();
        let fan_out = Arc::clone(&self.fan_out);
        let span = info_span!("deferred_dispatch", work_order_id = %work_order_id, delay_ms);
        tokio::spawn(
            async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                fan_out.dispatch(&event);
                debug!(targets = fan_out.targets.len(), "Fan-out handed to targets");
                drop(guard);
            }
            .instrument(span),
        );

        Acknowledgment {
            work_order_id,
            delay_ms,
        }
    }

    pub fn delay(&self) -> &DelayCounter {
        &self.delay
    }

    pub fn pending_dispatches(&self) -> usize {
        self.pending.get()
    }

    pub fn target_names(&self) -> Vec<String> {
        self.fan_out
            .targets
            .iter()
            .map(|h| h.name().to_string())
            .collect()
    }

    /// Get metrics for all targets
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.fan_out
            .targets
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Wait for scheduled dispatches, then close every handle
    ///
    /// Works through a shared reference, so it does not matter who else
    /// still holds the dispatcher. Returns per-target totals once queued and
    /// in-flight deliveries have finished. Dispatches still sleeping when
    /// `grace` runs out are dropped when they wake.
    #[instrument(name = "dispatcher_shutdown", skip(self))]
    pub async fn shutdown(&self, grace: Duration) -> Vec<(String, MetricsSnapshot)> {
        let pending = self.pending.get();
        if pending > 0 {
            info!(pending, "Waiting for scheduled dispatches");
        }

        if tokio::time::timeout(grace, self.pending.wait_idle())
            .await
            .is_err()
        {
            warn!(
                pending = self.pending.get(),
                "Grace period elapsed, abandoning scheduled dispatches"
            );
        }

        let totals = self.fan_out.close().await;

        if let Some(recorder) = &self.recorder {
            recorder.close().await;
        }

        info!("Dispatcher shutdown complete");
        totals
    }
}

/// Convenience function to create a dispatcher from a blueprint
#[instrument(name = "dispatcher_create", skip(blueprint))]
pub async fn create_dispatcher(
    blueprint: &RelayBlueprint,
) -> Result<FanOutDispatcher, DispatcherError> {
    DispatcherBuilder::new(DispatcherConfig::from_blueprint(blueprint))
        .build()
        .await
}
