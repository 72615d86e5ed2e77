use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::JSend;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Which backend video objects are written to
    pub storage: &'static str,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage: state.config.storage.backend.as_str(),
    })
}
