//! # ヘルスチェックハンドラ
//!
//! `GET /health` は依存先（DB・Redis・SMTP）には触れず、
//! プロセスが応答できることだけを返す。

use axum::Json;
use courier_shared::HealthResponse;

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(env!("CARGO_PKG_VERSION")))
}
