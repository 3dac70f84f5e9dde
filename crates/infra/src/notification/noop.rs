//! Noop メール送信実装
//!
//! メールを実際に送信せず、ログ出力のみ行う。
//! 開発環境や通知無効化時に使用する。

use async_trait::async_trait;
use courier_domain::notification::{NotificationError, OutgoingMessage, TemplateName};

use super::MailTransport;

/// Noop メール送信（ログ出力のみ）
///
/// テンプレート変数には認証情報が含まれるため、件名と宛先のみ出力する。
#[derive(Debug, Clone)]
pub struct NoopMailTransport;

#[async_trait]
impl MailTransport for NoopMailTransport {
    async fn send_message(
        &self,
        message: &OutgoingMessage,
        template_name: &TemplateName,
    ) -> Result<(), NotificationError> {
        tracing::info!(
            recipients = ?message.recipients,
            subject = %message.subject,
            template = %template_name,
            "Noop: メール送信をスキップ"
        );
        Ok(())
    }
}
