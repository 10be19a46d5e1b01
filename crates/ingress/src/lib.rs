//! # Ingress
//!
//! HTTP surface of the relay.
//!
//! - `GET /` and `GET /APITEST`: liveness probe with the welcome text
//! - `POST /workrequest/{id}`: acknowledge, then hand off to the dispatcher
//! - `GET /workrequest/{id}`: acknowledgment only
//! - `OPTIONS /workrequest/{id}`: CORS preflight
//!
//! The access gate runs as middleware on the work-request routes only.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

use std::sync::Arc;
use std::time::Duration;

use access_gate::AccessGate;
use dispatcher::FanOutDispatcher;

pub use error::IngressError;
pub use server::{create_router, shutdown_signal, start_server};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub gate: AccessGate,
    pub dispatcher: Arc<FanOutDispatcher>,
    pub welcome_message: Arc<str>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        gate: AccessGate,
        dispatcher: Arc<FanOutDispatcher>,
        welcome_message: impl Into<Arc<str>>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            gate,
            dispatcher,
            welcome_message: welcome_message.into(),
            request_timeout,
        }
    }
}
