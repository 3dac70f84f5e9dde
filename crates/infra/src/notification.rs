//! # メール送信
//!
//! 送信メッセージをテンプレートで HTML に展開し、メールとして送信する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `MailTransport` trait でメール送信を抽象化
//! - **2 つの実装**: SMTP（lettre）、Noop（開発・テスト用）
//! - **環境変数切替**: `MAIL_BACKEND` で起動時に選択
//! - **テンプレートは送信側で展開**: メッセージはテンプレート変数のみを持つ

mod noop;
mod smtp;
mod template;

use async_trait::async_trait;
use courier_domain::notification::{NotificationError, OutgoingMessage, TemplateName};
pub use noop::NoopMailTransport;
pub use smtp::{MailConfig, SmtpMailTransport, TlsMode};
pub use template::TemplateRenderer;

/// メール送信トレイト
///
/// `template_name` のテンプレートを `message.template_body` で展開し、
/// `message.recipients` 宛てに 1 通のメールとして送信する。
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// メールを送信する
    async fn send_message(
        &self,
        message: &OutgoingMessage,
        template_name: &TemplateName,
    ) -> Result<(), NotificationError>;
}
