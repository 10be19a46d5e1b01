//! # Contracts
//!
//! Shared interface contracts for the work-order relay.
//! Every other crate depends on this one; it depends on none of them.
//!
//! ## Event model
//! - A `WorkOrderEvent` is immutable once accepted and shared as `Arc`
//! - The work-order id comes from the request path and is never validated

mod blueprint;
mod error;
mod event;
mod recorder;
mod target;
mod target_id;

pub use blueprint::*;
pub use error::*;
pub use event::*;
pub use recorder::*;
pub use target::*;
pub use target_id::TargetId;
