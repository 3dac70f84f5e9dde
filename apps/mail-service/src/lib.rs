//! # Mail Service ライブラリ
//!
//! Mail Service のユースケース・ハンドラ・ルーターを公開する。

pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use handler::{
    MailState,
    health_check,
    resend_code_for_verification,
    resend_token_for_verification,
    send_code_for_password_reset,
    send_token_for_password_reset,
};
use tower_http::trace::TraceLayer;

/// ルーターを構築する
pub fn app(state: Arc<MailState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/internal/mail/password-reset/code",
            post(send_code_for_password_reset),
        )
        .route(
            "/internal/mail/verification/code",
            post(resend_code_for_verification),
        )
        .route(
            "/internal/mail/password-reset/token",
            post(send_token_for_password_reset),
        )
        .route(
            "/internal/mail/verification/token",
            post(resend_token_for_verification),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
