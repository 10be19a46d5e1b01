//! Delivery target implementations
//!
//! Contains LogTarget and HttpTarget.

mod http;
mod log;

pub use self::http::{HttpTarget, HttpTargetConfig};
pub use self::log::LogTarget;
