//! SMTP メール送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! 開発環境では Mailpit（ローカル SMTP サーバー、`MAIL_TLS_MODE=none`）に接続する。

use async_trait::async_trait;
use courier_domain::notification::{NotificationError, OutgoingMessage, TemplateName};
use lettre::{
    Address,
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Mailbox, Message, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use strum::{EnumString, IntoStaticStr};

use super::{MailTransport, TemplateRenderer};

/// SMTP 接続の TLS モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum TlsMode {
    /// 平文で接続し STARTTLS で昇格する（587 番ポート向け）
    #[default]
    StartTls,
    /// 接続時から TLS（465 番ポート向け）
    Tls,
    /// TLS なし（Mailpit 等のローカル SMTP 向け）
    None,
}

/// メール送信設定
///
/// 起動時に環境変数から一度だけ読み込み、トランスポートに注入する。
#[derive(Clone)]
pub struct MailConfig {
    pub server:          String,
    pub port:            u16,
    pub username:        Option<String>,
    pub password:        Option<String>,
    pub use_credentials: bool,
    pub from:            String,
    pub from_name:       String,
    pub tls_mode:        TlsMode,
}

impl MailConfig {
    /// SMTP 認証に使う資格情報
    ///
    /// `use_credentials` が無効、またはユーザー名が未設定の場合は `None`。
    pub fn credentials(&self) -> Option<Credentials> {
        if !self.use_credentials {
            return None;
        }
        let username = self.username.as_ref()?;
        Some(Credentials::new(
            username.clone(),
            self.password.clone().unwrap_or_default(),
        ))
    }

    /// 送信元メールボックス（`"{from_name} <{from}>"`）
    pub fn sender(&self) -> Result<Mailbox, NotificationError> {
        let address: Address = self.from.parse().map_err(|e| {
            NotificationError::InvalidAddress(format!("送信元アドレス不正: {e}"))
        })?;
        Ok(Mailbox::new(Some(self.from_name.clone()), address))
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("use_credentials", &self.use_credentials)
            .field("from", &self.from)
            .field("from_name", &self.from_name)
            .field("tls_mode", &self.tls_mode)
            .finish()
    }
}

/// SMTP メール送信
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender:    Mailbox,
    renderer:  TemplateRenderer,
}

impl SmtpMailTransport {
    /// 新しい SMTP 送信インスタンスを作成
    ///
    /// 接続は送信時に確立するため、ここではサーバーに接続しない。
    pub fn new(config: &MailConfig, renderer: TemplateRenderer) -> Result<Self, NotificationError> {
        let builder = match config.tls_mode {
            TlsMode::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(
                &config.server,
            )
            .map_err(|e| NotificationError::SendFailed(format!("SMTP 設定不正: {e}")))?,
            TlsMode::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.server)
                .map_err(|e| NotificationError::SendFailed(format!("SMTP 設定不正: {e}")))?,
            TlsMode::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.server),
        };

        let builder = builder.port(config.port);
        let transport = match config.credentials() {
            Some(credentials) => builder.credentials(credentials).build(),
            None => builder.build(),
        };

        Ok(Self {
            transport,
            sender: config.sender()?,
            renderer,
        })
    }

    /// 送信メッセージと HTML 本文から lettre のメッセージを組み立てる
    fn build_message(
        &self,
        message: &OutgoingMessage,
        html_body: String,
    ) -> Result<Message, NotificationError> {
        if message.recipients.is_empty() {
            return Err(NotificationError::InvalidAddress(
                "宛先が指定されていません".to_string(),
            ));
        }

        let mut builder = Message::builder()
            .from(self.sender.clone())
            .subject(&message.subject);
        for recipient in &message.recipients {
            let to: Mailbox = recipient.parse().map_err(|e| {
                NotificationError::InvalidAddress(format!("宛先アドレス不正: {recipient}: {e}"))
            })?;
            builder = builder.to(to);
        }

        builder
            .header(ContentType::TEXT_HTML)
            .body(html_body)
            .map_err(|e| NotificationError::SendFailed(format!("メッセージ構築失敗: {e}")))
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send_message(
        &self,
        message: &OutgoingMessage,
        template_name: &TemplateName,
    ) -> Result<(), NotificationError> {
        let html_body = self.renderer.render(template_name, &message.template_body)?;
        let email = self.build_message(message, html_body)?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotificationError::SendFailed(format!("SMTP 送信失敗: {e}")))?;

        Ok(())
    }
}
