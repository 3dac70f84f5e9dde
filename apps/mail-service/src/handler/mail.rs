//! # メール配信ハンドラ
//!
//! 他サービスから呼び出される内部 API。認証情報を発行してメールで送り、
//! 発行した値をレスポンスで返す。
//!
//! ## エンドポイント
//!
//! - `POST /internal/mail/password-reset/code` - パスワードリセットコードを送信
//! - `POST /internal/mail/verification/code` - 確認コードを再送信
//! - `POST /internal/mail/password-reset/token` - パスワードリセットリンクを送信
//! - `POST /internal/mail/verification/token` - 確認リンクを再送信

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use courier_domain::credential::CodeLength;
use courier_shared::ApiResponse;
use serde::Deserialize;

use crate::{error::MailServiceError, usecase::NotificationDispatcher};

/// メール配信 API の共有状態
pub struct MailState {
    pub dispatcher: NotificationDispatcher,
}

// --- リクエスト型 ---

/// コード送信リクエスト
#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub email:       String,
    /// 省略時は発行者の既定桁数
    #[serde(default)]
    pub code_length: Option<u32>,
}

/// リンク送信リクエスト
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email:        String,
    pub redirect_url: String,
}

impl CodeRequest {
    fn validate(&self) -> Result<Option<CodeLength>, MailServiceError> {
        require_non_empty("email", &self.email)?;
        self.code_length
            .map(CodeLength::new)
            .transpose()
            .map_err(|e| MailServiceError::BadRequest(e.to_string()))
    }
}

impl TokenRequest {
    fn validate(&self) -> Result<(), MailServiceError> {
        require_non_empty("email", &self.email)?;
        require_non_empty("redirect_url", &self.redirect_url)
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), MailServiceError> {
    if value.trim().is_empty() {
        return Err(MailServiceError::BadRequest(format!("{field} は必須です")));
    }
    Ok(())
}

// --- ハンドラ ---

/// POST /internal/mail/password-reset/code
#[tracing::instrument(skip_all)]
pub async fn send_code_for_password_reset(
    State(state): State<Arc<MailState>>,
    Json(req): Json<CodeRequest>,
) -> Result<impl IntoResponse, MailServiceError> {
    let code_length = req.validate()?;
    let result = state
        .dispatcher
        .send_code_for_password_reset(&req.email, code_length)
        .await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(result))))
}

/// POST /internal/mail/verification/code
#[tracing::instrument(skip_all)]
pub async fn resend_code_for_verification(
    State(state): State<Arc<MailState>>,
    Json(req): Json<CodeRequest>,
) -> Result<impl IntoResponse, MailServiceError> {
    let code_length = req.validate()?;
    let result = state
        .dispatcher
        .resend_code_for_verification(&req.email, code_length)
        .await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(result))))
}

/// POST /internal/mail/password-reset/token
#[tracing::instrument(skip_all)]
pub async fn send_token_for_password_reset(
    State(state): State<Arc<MailState>>,
    Json(req): Json<TokenRequest>,
) -> Result<impl IntoResponse, MailServiceError> {
    req.validate()?;
    let result = state
        .dispatcher
        .send_token_for_password_reset(&req.email, &req.redirect_url)
        .await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(result))))
}

/// POST /internal/mail/verification/token
#[tracing::instrument(skip_all)]
pub async fn resend_token_for_verification(
    State(state): State<Arc<MailState>>,
    Json(req): Json<TokenRequest>,
) -> Result<impl IntoResponse, MailServiceError> {
    req.validate()?;
    let result = state
        .dispatcher
        .resend_token_for_verification(&req.email, &req.redirect_url)
        .await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(result))))
}
