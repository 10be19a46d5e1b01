//! # Dispatcher
//!
//! Asynchronous fan-out of accepted work orders.
//!
//! Responsibilities:
//! - Acknowledge synchronously, deliver later
//! - Adaptive sawtooth delay shared by all events
//! - Per-target payload shaping
//! - Fan-out to targets with isolated failures, no retries

pub mod delay;
pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod shaping;
pub mod targets;

pub use contracts::{Acknowledgment, DeliveryTarget, WorkOrderEvent};
pub use delay::DelayCounter;
pub use dispatcher::{create_dispatcher, DispatcherBuilder, DispatcherConfig, FanOutDispatcher};
pub use error::DispatcherError;
pub use handle::{Delivery, RecorderHandle, TargetHandle};
pub use metrics::{MetricsSnapshot, TargetMetrics};
pub use shaping::{ShapingTable, TargetShaping};
pub use targets::{HttpTarget, HttpTargetConfig, LogTarget};
