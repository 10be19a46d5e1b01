//! Liveness probe

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub teststatus: &'static str,
    pub testmessage: String,
}

/// `GET /` and `GET /APITEST`
pub async fn api_test(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        teststatus: "good",
        testmessage: state.welcome_message.to_string(),
    })
}
