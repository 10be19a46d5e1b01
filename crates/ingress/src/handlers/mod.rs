//! HTTP handlers

mod status;
mod work_request;

pub use status::{api_test, StatusResponse};
pub use work_request::{preflight, receive_work_request, work_request_probe, AckResponse};
