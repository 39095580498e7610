//! `GET /v1/models` — enumerate the alias table.

use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn list_models(State(state): State<AppState>) -> Json<Value> {
    let data: Vec<Value> = state
        .aliases
        .entries()
        .map(|(alias, canonical)| json!({ "id": alias, "canonical_id": canonical, "object": "model" }))
        .collect();
    Json(json!({ "object": "list", "data": data }))
}
