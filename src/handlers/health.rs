use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::models::App;

/// Health check endpoint
pub async fn health_check(State(app): State<App>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "backend_url": app.backend_url,
        "instruction_injection": app.add_instruction,
        "prompt_dir": app.prompt_dir,
    }))
}
