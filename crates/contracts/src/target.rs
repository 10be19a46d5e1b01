//! DeliveryTarget trait - dispatcher output interface

use serde_json::Value;

use crate::RelayError;

/// Downstream delivery trait
///
/// All target implementations must implement this trait. Delivery takes
/// `&self` so one target can serve concurrent attempts.
#[trait_variant::make(DeliveryTarget: Send)]
pub trait LocalDeliveryTarget {
    /// Target name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver an already-shaped payload
    ///
    /// # Errors
    /// Returns delivery error. Implementations must not hang: a call
    /// either completes or reports failure within its own timeout.
    async fn deliver(&self, payload: &Value) -> Result<(), RelayError>;
}
