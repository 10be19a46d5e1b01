//! Request middleware

mod cors_gate;
mod request_id;

pub use cors_gate::cors_gate_middleware;
pub use request_id::inject_request_id;
