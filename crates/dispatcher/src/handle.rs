//! Handles - isolated queue and worker task per target and for the recorder

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, instrument, warn, Instrument};

use contracts::{DeliveryTarget, EventRecorder, TargetId, WorkOrderEvent};

use crate::metrics::TargetMetrics;

/// One shaped payload bound for one target
#[derive(Debug, Clone)]
pub struct Delivery {
    pub work_order_id: String,
    pub payload: Value,
}

/// Handle to a running target worker
///
/// The worker spawns one task per delivery, so a slow attempt never holds
/// up the next one and a panic stays inside its own task.
pub struct TargetHandle {
    name: TargetId,
    tx: mpsc::Sender<Delivery>,
    metrics: Arc<TargetMetrics>,
    close_signal: Arc<Notify>,
    worker_handle: Mutex<Option<JoinHandle<()>>>,
}

impl TargetHandle {
    /// Create a new TargetHandle and spawn the worker task
    pub fn spawn<T>(target: T, queue_capacity: usize) -> Self
    where
        T: DeliveryTarget + Sync + 'static,
    {
        let name = TargetId::from(target.name());
        let (tx, rx) = mpsc::channel(queue_capacity);
        let metrics = Arc::new(TargetMetrics::new());
        let close_signal = Arc::new(Notify::new());

        let worker_handle = tokio::spawn(target_worker(
            Arc::new(target),
            rx,
            Arc::clone(&close_signal),
            Arc::clone(&metrics),
            name.clone(),
        ));

        Self {
            name,
            tx,
            metrics,
            close_signal,
            worker_handle: Mutex::new(Some(worker_handle)),
        }
    }

    pub fn name(&self) -> &TargetId {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<TargetMetrics> {
        &self.metrics
    }

    /// Queue a delivery (non-blocking)
    ///
    /// Returns true if queued, false if the queue is full (delivery dropped)
    pub fn try_send(&self, delivery: Delivery) -> bool {
        match self.tx.try_send(delivery) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(d)) => {
                self.metrics.inc_dropped_count();
                warn!(
                    target_name = %self.name,
                    work_order_id = %d.work_order_id,
                    "Queue full, delivery dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(d)) => {
                self.metrics.inc_dropped_count();
                warn!(
                    target_name = %self.name,
                    work_order_id = %d.work_order_id,
                    "Target closed, delivery dropped"
                );
                false
            }
        }
    }

    /// Stop accepting deliveries, then wait for queued and in-flight ones
    ///
    /// Safe to call through a shared reference and more than once; later
    /// callers wait for the same worker to finish.
    #[instrument(name = "target_handle_close", skip(self), fields(target_name = %self.name))]
    pub async fn close(&self) {
        self.close_signal.notify_one();
        let mut worker = self.worker_handle.lock().await;
        if let Some(handle) = worker.take() {
            if let Err(e) = handle.await {
                error!(target_name = %self.name, error = ?e, "Worker task panicked");
            }
            debug!(target_name = %self.name, "TargetHandle closed");
        }
    }

    pub async fn shutdown(self) {
        self.close().await;
    }
}

#[instrument(name = "target_worker_loop", skip(target, rx, close, metrics), fields(target_name = %name))]
async fn target_worker<T>(
    target: Arc<T>,
    mut rx: mpsc::Receiver<Delivery>,
    close: Arc<Notify>,
    metrics: Arc<TargetMetrics>,
    name: TargetId,
) where
    T: DeliveryTarget + Sync + 'static,
{
    debug!(target_name = %name, "Target worker started");

    let mut in_flight = JoinSet::new();
    let mut closing = false;

    loop {
        tokio::select! {
            // closing the receiver keeps what is already queued
            _ = close.notified(), if !closing => {
                closing = true;
                rx.close();
            }
            received = rx.recv() => {
                let Some(delivery) = received else { break };
                metrics.set_queue_len(rx.len());

                let span = tracing::info_span!(
                    "delivery_attempt",
                    target_name = %name,
                    work_order_id = %delivery.work_order_id
                );
                in_flight.spawn(
                    deliver_once(Arc::clone(&target), delivery, Arc::clone(&metrics), name.clone())
                        .instrument(span),
                );
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                report_join(&name, &metrics, joined);
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        report_join(&name, &metrics, joined);
    }

    debug!(target_name = %name, "Target worker stopped");
}

/// One fire-and-forget attempt. The outcome is only logged and counted.
async fn deliver_once<T>(
    target: Arc<T>,
    delivery: Delivery,
    metrics: Arc<TargetMetrics>,
    name: TargetId,
) where
    T: DeliveryTarget + Sync + 'static,
{
    metrics.inc_in_flight();
    let started = Instant::now();

    let result = target.deliver(&delivery.payload).await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    metrics.dec_in_flight();
    observability::record_delivery(&name, result.is_ok(), elapsed_ms);
    match result {
        Ok(()) => {
            metrics.inc_delivered_count();
            info!(
                target_name = %name,
                work_order_id = %delivery.work_order_id,
                elapsed_ms,
                "Delivery succeeded"
            );
        }
        Err(e) => {
            metrics.inc_failure_count();
            error!(
                target_name = %name,
                work_order_id = %delivery.work_order_id,
                elapsed_ms,
                error = %e,
                "Delivery failed"
            );
        }
    }
}

fn report_join(name: &TargetId, metrics: &TargetMetrics, joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        metrics.dec_in_flight();
        metrics.inc_failure_count();
        observability::record_delivery(name, false, 0.0);
        error!(target_name = %name, error = %e, "Delivery task panicked");
    }
}

/// Handle to a running recorder worker
///
/// Records are written one at a time in acceptance order.
pub struct RecorderHandle {
    name: String,
    tx: mpsc::Sender<Arc<WorkOrderEvent>>,
    close_signal: Arc<Notify>,
    worker_handle: Mutex<Option<JoinHandle<()>>>,
}

impl RecorderHandle {
    pub fn spawn<R>(recorder: R, queue_capacity: usize) -> Self
    where
        R: EventRecorder + 'static,
    {
        let name = recorder.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity);
        let close_signal = Arc::new(Notify::new());
        let worker_handle =
            tokio::spawn(recorder_worker(recorder, rx, Arc::clone(&close_signal), name.clone()));
        Self {
            name,
            tx,
            close_signal,
            worker_handle: Mutex::new(Some(worker_handle)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue an event for recording (non-blocking)
    pub fn try_send(&self, event: Arc<WorkOrderEvent>) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(ev)) => {
                observability::record_event_recorded(false);
                warn!(
                    recorder = %self.name,
                    work_order_id = %ev.work_order_id,
                    "Recorder queue full, event not recorded"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(ev)) => {
                warn!(
                    recorder = %self.name,
                    work_order_id = %ev.work_order_id,
                    "Recorder closed, event not recorded"
                );
                false
            }
        }
    }

    /// Record what is queued, flush, and stop the worker
    #[instrument(name = "recorder_handle_close", skip(self), fields(recorder = %self.name))]
    pub async fn close(&self) {
        self.close_signal.notify_one();
        let mut worker = self.worker_handle.lock().await;
        if let Some(handle) = worker.take() {
            if let Err(e) = handle.await {
                error!(recorder = %self.name, error = ?e, "Recorder task panicked");
            }
        }
    }

    pub async fn shutdown(self) {
        self.close().await;
    }
}

#[instrument(name = "recorder_worker_loop", skip(recorder, rx, close), fields(recorder = %name))]
async fn recorder_worker<R: EventRecorder>(
    mut recorder: R,
    mut rx: mpsc::Receiver<Arc<WorkOrderEvent>>,
    close: Arc<Notify>,
    name: String,
) {
    let mut closing = false;
    loop {
        let event = tokio::select! {
            _ = close.notified(), if !closing => {
                closing = true;
                rx.close();
                continue;
            }
            received = rx.recv() => match received {
                Some(event) => event,
                None => break,
            },
        };
        let result = recorder.record(&event).await;
        observability::record_event_recorded(result.is_ok());
        if let Err(e) = result {
            error!(
                recorder = %name,
                work_order_id = %event.work_order_id,
                error = %e,
                "Recording failed"
            );
        }
    }

    if let Err(e) = recorder.flush().await {
        error!(recorder = %name, error = %e, "Flush failed on shutdown");
    }
    debug!(recorder = %name, "Recorder worker stopped");
}
