//! # Mail Service エラー定義
//!
//! Mail Service 固有のエラーと、HTTP レスポンスへの変換を定義する。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use courier_shared::{ErrorResponse, event_log};
use thiserror::Error;

use crate::usecase::DispatchError;

/// Mail Service で発生するエラー
#[derive(Debug, Error)]
pub enum MailServiceError {
    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// ディスパッチエラー
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl IntoResponse for MailServiceError {
    fn into_response(self) -> Response {
        let body = match &self {
            MailServiceError::BadRequest(msg) => ErrorResponse::bad_request(msg.clone()),
            MailServiceError::Dispatch(DispatchError::NotRegistered { .. }) => {
                ErrorResponse::unauthorized("Email not registered")
            }
            MailServiceError::Dispatch(e) => {
                let (category, kind) = error_context(e);
                tracing::error!(
                    error.category = category,
                    error.kind = kind,
                    error = %e,
                    "メール配信に失敗"
                );
                ErrorResponse::internal_error()
            }
        };

        let status = StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

/// ログ用のエラーカテゴリと種別
fn error_context(e: &DispatchError) -> (&'static str, &'static str) {
    use event_log::error::{category, kind};

    match e {
        DispatchError::Directory(_) => (category::INFRASTRUCTURE, kind::USER_LOOKUP),
        DispatchError::Credential(_) => (category::INFRASTRUCTURE, kind::CREDENTIAL_ISSUANCE),
        DispatchError::Transport(_) | DispatchError::NotRegistered { .. } => {
            (category::EXTERNAL_SERVICE, kind::MAIL_TRANSPORT)
        }
    }
}

#[cfg(test)]
mod tests {
    use courier_domain::{credential::CredentialError, notification::NotificationError};
    use courier_infra::InfraError;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    async fn response_parts(error: MailServiceError) -> (StatusCode, ErrorResponse) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_未登録は401とemail_not_registeredになる() {
        let error = MailServiceError::from(DispatchError::NotRegistered {
            email: "nobody@example.com".to_string(),
        });

        let (status, body) = response_parts(error).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.status, 401);
        assert_eq!(body.detail, "Email not registered");
    }

    #[tokio::test]
    async fn test_不正なリクエストは400になる() {
        let (status, body) =
            response_parts(MailServiceError::BadRequest("email は必須です".to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.detail, "email は必須です");
    }

    #[rstest]
    #[case(DispatchError::Directory(InfraError::unexpected("db down")))]
    #[case(DispatchError::Credential(CredentialError::StoreFailed("redis down".to_string())))]
    #[case(DispatchError::Transport(NotificationError::SendFailed("smtp down".to_string())))]
    #[tokio::test]
    async fn test_協調オブジェクトのエラーは500で詳細を隠す(#[case] error: DispatchError) {
        let (status, body) = response_parts(MailServiceError::from(error)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, ErrorResponse::internal_error());
    }
}
