//! # 通知ディスパッチャ
//!
//! ユーザー検索 → 認証情報の発行 → メッセージ組み立て → 送信 を統合する。
//!
//! ## 操作
//!
//! | 操作 | 認証情報 | テンプレート変数 |
//! |------|----------|------------------|
//! | `send_code_for_password_reset` | コード | `title`, `first_name`, `code` |
//! | `resend_code_for_verification` | コード | `title`, `first_name`, `code` |
//! | `send_token_for_password_reset` | トークン | `title`, `first_name`, `path` |
//! | `resend_token_for_verification` | トークン | `title`, `first_name`, `path` |
//! | `dispatch_in_background` | （呼び出し元が用意） | （呼び出し元が用意） |
//!
//! ## 設計方針
//!
//! - **同期送信**: 4 つの操作は送信完了を待ってから結果を返す
//! - **エラーは素通し**: 協調オブジェクトのエラーは変換・リトライせずにそのまま返す
//! - **冪等性なし**: 呼び出しごとに新しい認証情報を発行し、1 通送信する
//! - **状態を持たない**: ロックや可変状態はなく、並行呼び出しは独立に進む

use std::sync::Arc;

use courier_domain::{
    credential::{Code, CodeLength, CodeResult, CredentialError, Token, TokenResult},
    notification::{EmailIntent, NotificationError, OutgoingMessage, TemplateName, token_path},
    user::User,
};
use courier_infra::{
    InfraError,
    credential::CredentialIssuer,
    notification::MailTransport,
    repository::UserDirectory,
    task::DeferredTaskRunner,
};
use courier_shared::{
    event_log::{self, event},
    log_business_event,
};
use thiserror::Error;
use tracing::Instrument;

/// ディスパッチエラー
#[derive(Debug, Error)]
pub enum DispatchError {
    /// メールアドレスが登録されていない
    #[error("Email not registered")]
    NotRegistered { email: String },

    #[error(transparent)]
    Directory(#[from] InfraError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Transport(#[from] NotificationError),
}

impl DispatchError {
    /// 対応する HTTP ステータスコード
    pub fn status_hint(&self) -> u16 {
        match self {
            Self::NotRegistered { .. } => 401,
            Self::Directory(_) | Self::Credential(_) | Self::Transport(_) => 500,
        }
    }
}

/// メール種別ごとのテンプレート名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailTemplates {
    pub password_reset:     TemplateName,
    pub email_verification: TemplateName,
}

impl MailTemplates {
    pub fn for_intent(&self, intent: EmailIntent) -> &TemplateName {
        match intent {
            EmailIntent::PasswordReset => &self.password_reset,
            EmailIntent::EmailVerification => &self.email_verification,
        }
    }
}

/// 通知ディスパッチャ
pub struct NotificationDispatcher {
    directory: Arc<dyn UserDirectory>,
    issuer:    Arc<dyn CredentialIssuer>,
    transport: Arc<dyn MailTransport>,
    runner:    Arc<dyn DeferredTaskRunner>,
    templates: MailTemplates,
}

impl NotificationDispatcher {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        issuer: Arc<dyn CredentialIssuer>,
        transport: Arc<dyn MailTransport>,
        runner: Arc<dyn DeferredTaskRunner>,
        templates: MailTemplates,
    ) -> Self {
        Self {
            directory,
            issuer,
            transport,
            runner,
            templates,
        }
    }

    /// パスワードリセット用のコードを発行してメールで送る
    #[tracing::instrument(skip_all, fields(%email))]
    pub async fn send_code_for_password_reset(
        &self,
        email: &str,
        code_length: Option<CodeLength>,
    ) -> Result<CodeResult, DispatchError> {
        self.send_code(EmailIntent::PasswordReset, email, code_length)
            .await
    }

    /// メールアドレス確認用のコードを発行してメールで送る
    #[tracing::instrument(skip_all, fields(%email))]
    pub async fn resend_code_for_verification(
        &self,
        email: &str,
        code_length: Option<CodeLength>,
    ) -> Result<CodeResult, DispatchError> {
        self.send_code(EmailIntent::EmailVerification, email, code_length)
            .await
    }

    /// パスワードリセット用のトークンを発行し、リンクをメールで送る
    ///
    /// リンクは `"{redirect_url}/?token={token}"`（正規化なしの連結）。
    #[tracing::instrument(skip_all, fields(%email))]
    pub async fn send_token_for_password_reset(
        &self,
        email: &str,
        redirect_url: &str,
    ) -> Result<TokenResult, DispatchError> {
        self.send_token(EmailIntent::PasswordReset, email, redirect_url)
            .await
    }

    /// メールアドレス確認用のトークンを発行し、リンクをメールで送る
    #[tracing::instrument(skip_all, fields(%email))]
    pub async fn resend_token_for_verification(
        &self,
        email: &str,
        redirect_url: &str,
    ) -> Result<TokenResult, DispatchError> {
        self.send_token(EmailIntent::EmailVerification, email, redirect_url)
            .await
    }

    /// 組み立て済みのメッセージを遅延タスクとして送信する
    ///
    /// 送信の完了を待たずに戻る。送信結果は呼び出し元に返らず、
    /// 失敗はタスク内でログ出力される。
    pub fn dispatch_in_background(&self, message: OutgoingMessage, template_name: TemplateName) {
        let transport = Arc::clone(&self.transport);

        log_business_event!(
            event.category = event::category::MAIL,
            event.action = event::action::MAIL_ENQUEUED,
            event.result = event::result::SUCCESS,
            mail.recipients = ?message.recipients,
            mail.template = %template_name,
            "メール送信をバックグラウンドに登録"
        );

        let task = async move {
            let result = transport.send_message(&message, &template_name).await;
            if let Err(e) = &result {
                tracing::error!(
                    error.category = event_log::error::category::EXTERNAL_SERVICE,
                    error.kind = event_log::error::kind::MAIL_TRANSPORT,
                    error = %e,
                    "バックグラウンドのメール送信に失敗"
                );
            }
            log_sent(&message, &template_name, result.as_ref().err());
        };

        self.runner.add_task(Box::pin(task.in_current_span()));
    }

    async fn send_code(
        &self,
        intent: EmailIntent,
        email: &str,
        code_length: Option<CodeLength>,
    ) -> Result<CodeResult, DispatchError> {
        let user = self.find_registered(intent, email).await?;
        let code = self.issue_code(intent, &user, code_length).await?;

        let message =
            OutgoingMessage::with_code(intent, user.email().as_str(), user.first_name(), &code);
        self.send(intent, &message).await?;

        Ok(CodeResult::from(code))
    }

    async fn send_token(
        &self,
        intent: EmailIntent,
        email: &str,
        redirect_url: &str,
    ) -> Result<TokenResult, DispatchError> {
        let user = self.find_registered(intent, email).await?;
        let token = self.issue_token(intent, &user).await?;

        let path = token_path(redirect_url, &token);
        let message =
            OutgoingMessage::with_path(intent, user.email().as_str(), user.first_name(), &path);
        self.send(intent, &message).await?;

        Ok(TokenResult::from(token))
    }

    async fn find_registered(&self, intent: EmailIntent, email: &str) -> Result<User, DispatchError> {
        match self.directory.find_by_email(email).await? {
            Some(user) => Ok(user),
            None => {
                log_business_event!(
                    event.category = event::category::MAIL,
                    event.action = event::action::MAIL_NOT_REGISTERED,
                    event.result = event::result::FAILURE,
                    mail.intent = %intent,
                    mail.recipient = %email,
                    "未登録のメールアドレス"
                );
                Err(DispatchError::NotRegistered {
                    email: email.to_string(),
                })
            }
        }
    }

    async fn issue_code(
        &self,
        intent: EmailIntent,
        user: &User,
        code_length: Option<CodeLength>,
    ) -> Result<Code, CredentialError> {
        match intent {
            EmailIntent::PasswordReset => self.issuer.issue_reset_code(user, code_length).await,
            EmailIntent::EmailVerification => {
                self.issuer.issue_verification_code(user, code_length).await
            }
        }
    }

    async fn issue_token(&self, intent: EmailIntent, user: &User) -> Result<Token, CredentialError> {
        match intent {
            EmailIntent::PasswordReset => self.issuer.issue_reset_token(user).await,
            EmailIntent::EmailVerification => self.issuer.issue_verification_token(user).await,
        }
    }

    async fn send(
        &self,
        intent: EmailIntent,
        message: &OutgoingMessage,
    ) -> Result<(), NotificationError> {
        let template_name = self.templates.for_intent(intent);
        let result = self.transport.send_message(message, template_name).await;
        log_sent(message, template_name, result.as_ref().err());
        result
    }
}

/// 送信結果をビジネスイベントとして記録する
///
/// テンプレート変数（認証情報を含む）は出力しない。
fn log_sent(
    message: &OutgoingMessage,
    template_name: &TemplateName,
    error: Option<&NotificationError>,
) {
    match error {
        None => log_business_event!(
            event.category = event::category::MAIL,
            event.action = event::action::MAIL_SENT,
            event.result = event::result::SUCCESS,
            mail.recipients = ?message.recipients,
            mail.subject = %message.subject,
            mail.template = %template_name,
            "メール送信成功"
        ),
        Some(e) => log_business_event!(
            event.category = event::category::MAIL,
            event.action = event::action::MAIL_FAILED,
            event.result = event::result::FAILURE,
            mail.recipients = ?message.recipients,
            mail.subject = %message.subject,
            mail.template = %template_name,
            error = %e,
            "メール送信失敗"
        ),
    }
}

#[cfg(test)]
mod tests {
    use courier_domain::{
        notification::template_key,
        user::{Email, UserId},
    };
    use courier_infra::{
        mock::{
            IssuedKind,
            ManualTaskRunner,
            MockCredentialIssuer,
            MockMailTransport,
            MockUserDirectory,
        },
        task::TokioTaskRunner,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    const EMAIL: &str = "taro@example.com";
    const REDIRECT_URL: &str = "https://app.example.com/reset";

    struct Fixture {
        directory: MockUserDirectory,
        issuer:    MockCredentialIssuer,
        transport: MockMailTransport,
        runner:    ManualTaskRunner,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_transport(MockMailTransport::new())
        }

        fn with_transport(transport: MockMailTransport) -> Self {
            let directory = MockUserDirectory::new();
            directory.add_user(user(EMAIL, "Taro"));
            Self {
                directory,
                issuer: MockCredentialIssuer::new(),
                transport,
                runner: ManualTaskRunner::new(),
            }
        }

        fn dispatcher(&self) -> NotificationDispatcher {
            self.dispatcher_with_runner(Arc::new(self.runner.clone()))
        }

        fn dispatcher_with_runner(
            &self,
            runner: Arc<dyn DeferredTaskRunner>,
        ) -> NotificationDispatcher {
            NotificationDispatcher::new(
                Arc::new(self.directory.clone()),
                Arc::new(self.issuer.clone()),
                Arc::new(self.transport.clone()),
                runner,
                templates(),
            )
        }
    }

    fn user(email: &str, first_name: &str) -> User {
        User::new(UserId::new(), Email::new(email).unwrap(), first_name)
    }

    fn templates() -> MailTemplates {
        MailTemplates {
            password_reset:     TemplateName::new("password_reset.html"),
            email_verification: TemplateName::new("email_verification.html"),
        }
    }

    // ===== コード送信 =====

    #[tokio::test]
    async fn test_パスワードリセットコードを発行して送信する() {
        let fixture = Fixture::new();
        let sut = fixture.dispatcher();

        let result = sut.send_code_for_password_reset(EMAIL, None).await.unwrap();

        assert!(!result.code.is_empty());
        let sent = fixture.transport.sent();
        assert_eq!(sent.len(), 1);
        let mail = &sent[0];
        assert_eq!(mail.message.subject, "Password Reset");
        assert_eq!(mail.message.recipients, vec![EMAIL.to_string()]);
        assert_eq!(
            mail.message.template_body.get(template_key::TITLE),
            Some("Change your password")
        );
        assert_eq!(mail.message.template_body.get(template_key::FIRST_NAME), Some("Taro"));
        assert_eq!(
            mail.message.template_body.get(template_key::CODE),
            Some(result.code.as_str())
        );
        assert_eq!(mail.template_name.as_str(), "password_reset.html");
    }

    #[tokio::test]
    async fn test_確認コードを発行して送信する() {
        let fixture = Fixture::new();
        let sut = fixture.dispatcher();

        let result = sut.resend_code_for_verification(EMAIL, None).await.unwrap();

        let sent = fixture.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message.subject, "Email Verification");
        assert_eq!(
            sent[0].message.template_body.get(template_key::TITLE),
            Some("Verify Your Account")
        );
        assert_eq!(
            sent[0].message.template_body.get(template_key::CODE),
            Some(result.code.as_str())
        );
        assert_eq!(sent[0].template_name.as_str(), "email_verification.html");

        let issued = fixture.issuer.issued();
        assert_eq!(issued[0].purpose, EmailIntent::EmailVerification);
        assert_eq!(issued[0].kind, IssuedKind::Code);
    }

    #[tokio::test]
    async fn test_指定したコード桁数がそのまま発行者に渡る() {
        let fixture = Fixture::new();
        let sut = fixture.dispatcher();
        let four = CodeLength::new(4).unwrap();

        let result = sut
            .send_code_for_password_reset(EMAIL, Some(four))
            .await
            .unwrap();

        assert_eq!(fixture.issuer.issued()[0].code_length, Some(four));
        assert_eq!(result.code.len(), 4);
    }

    #[tokio::test]
    async fn test_コード桁数の省略はnoneとして発行者に渡る() {
        let fixture = Fixture::new();
        let sut = fixture.dispatcher();

        sut.resend_code_for_verification(EMAIL, None).await.unwrap();

        assert_eq!(fixture.issuer.issued()[0].code_length, None);
    }

    // ===== トークン送信 =====

    #[tokio::test]
    async fn test_パスワードリセットのリンクにトークンが埋め込まれる() {
        let fixture = Fixture::new();
        let sut = fixture.dispatcher();

        let result = sut
            .send_token_for_password_reset(EMAIL, REDIRECT_URL)
            .await
            .unwrap();

        let sent = fixture.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message.subject, "Password Reset");
        assert_eq!(
            sent[0].message.template_body.get(template_key::PATH),
            Some(format!("{REDIRECT_URL}/?token={}", result.token).as_str())
        );
        assert_eq!(sent[0].message.template_body.get(template_key::CODE), None);
        assert_eq!(sent[0].template_name.as_str(), "password_reset.html");

        let issued = fixture.issuer.issued();
        assert_eq!(issued[0].purpose, EmailIntent::PasswordReset);
        assert_eq!(issued[0].kind, IssuedKind::Token);
        assert_eq!(issued[0].value, result.token);
    }

    #[tokio::test]
    async fn test_確認リンクを送信する() {
        let fixture = Fixture::new();
        let sut = fixture.dispatcher();

        let result = sut
            .resend_token_for_verification(EMAIL, "https://app.example.com/verify")
            .await
            .unwrap();

        let sent = fixture.transport.sent();
        assert_eq!(sent[0].message.subject, "Email Verification");
        assert_eq!(
            sent[0].message.template_body.get(template_key::PATH),
            Some(format!("https://app.example.com/verify/?token={}", result.token).as_str())
        );
        assert_eq!(sent[0].template_name.as_str(), "email_verification.html");
    }

    // ===== 未登録 =====

    #[tokio::test]
    async fn test_未登録のメールアドレスは全操作でnot_registeredになる() {
        let fixture = Fixture::new();
        let sut = fixture.dispatcher();
        let unknown = "nobody@example.com";

        let results = [
            sut.send_code_for_password_reset(unknown, None)
                .await
                .map(|_| ()),
            sut.resend_code_for_verification(unknown, None)
                .await
                .map(|_| ()),
            sut.send_token_for_password_reset(unknown, REDIRECT_URL)
                .await
                .map(|_| ()),
            sut.resend_token_for_verification(unknown, REDIRECT_URL)
                .await
                .map(|_| ()),
        ];

        for result in results {
            let err = result.unwrap_err();
            assert!(
                matches!(&err, DispatchError::NotRegistered { email } if email == unknown),
                "NotRegistered であること: {err:?}",
            );
            assert_eq!(err.status_hint(), 401);
            assert_eq!(err.to_string(), "Email not registered");
        }
        assert!(fixture.issuer.issued().is_empty());
        assert_eq!(fixture.transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_メールアドレスは完全一致で照合する() {
        let fixture = Fixture::new();
        let sut = fixture.dispatcher();

        let result = sut
            .send_code_for_password_reset("Taro@Example.com", None)
            .await;

        assert!(matches!(result, Err(DispatchError::NotRegistered { .. })));
    }

    #[tokio::test]
    async fn test_同じアドレスのユーザーが複数いる場合は最初の一致を使う() {
        let fixture = Fixture::new();
        fixture.directory.add_user(user(EMAIL, "Second"));
        let sut = fixture.dispatcher();

        sut.send_code_for_password_reset(EMAIL, None).await.unwrap();

        assert_eq!(
            fixture.transport.sent()[0]
                .message
                .template_body
                .get(template_key::FIRST_NAME),
            Some("Taro")
        );
    }

    // ===== 協調オブジェクトのエラー =====

    #[tokio::test]
    async fn test_ディレクトリのエラーはそのまま返る() {
        let fixture = Fixture::new();
        fixture.directory.fail_lookups();
        let sut = fixture.dispatcher();

        let err = sut
            .send_code_for_password_reset(EMAIL, None)
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Directory(_)));
        assert_eq!(err.status_hint(), 500);
        assert!(fixture.issuer.issued().is_empty());
        assert_eq!(fixture.transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_発行のエラーはそのまま返り送信しない() {
        let fixture = Fixture::new();
        fixture.issuer.fail_issuance();
        let sut = fixture.dispatcher();

        let err = sut
            .send_token_for_password_reset(EMAIL, REDIRECT_URL)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Credential(CredentialError::StoreFailed(_))
        ));
        assert_eq!(fixture.transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_送信のエラーはそのまま返る() {
        let fixture = Fixture::new();
        fixture.transport.fail_sends();
        let sut = fixture.dispatcher();

        let err = sut
            .resend_code_for_verification(EMAIL, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Transport(NotificationError::SendFailed(_))
        ));
        // 発行済みの認証情報は取り消さない
        assert_eq!(fixture.issuer.issued().len(), 1);
    }

    // ===== 冪等性 =====

    #[tokio::test]
    async fn test_連続した呼び出しは別々の認証情報を発行して2通送る() {
        let fixture = Fixture::new();
        let sut = fixture.dispatcher();

        let first = sut.send_code_for_password_reset(EMAIL, None).await.unwrap();
        let second = sut.send_code_for_password_reset(EMAIL, None).await.unwrap();

        assert_ne!(first.code, second.code);
        assert_eq!(fixture.issuer.issued().len(), 2);
        assert_eq!(fixture.transport.sent_count(), 2);
    }

    // ===== バックグラウンド送信 =====

    fn background_message() -> OutgoingMessage {
        OutgoingMessage::with_code(
            EmailIntent::EmailVerification,
            EMAIL,
            "Taro",
            &Code::new("123456"),
        )
    }

    #[tokio::test]
    async fn test_バックグラウンド送信は登録のみで戻る() {
        let fixture = Fixture::new();
        let sut = fixture.dispatcher();

        sut.dispatch_in_background(background_message(), TemplateName::new("custom.html"));

        assert_eq!(fixture.runner.pending(), 1);
        assert_eq!(fixture.transport.sent_count(), 0);

        fixture.runner.run_all().await;

        let sent = fixture.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message, background_message());
    }

    #[tokio::test]
    async fn test_バックグラウンド送信は呼び出し元のテンプレートを使う() {
        let fixture = Fixture::new();
        let sut = fixture.dispatcher();

        sut.dispatch_in_background(background_message(), TemplateName::new("custom.html"));
        fixture.runner.run_all().await;

        assert_eq!(fixture.transport.sent()[0].template_name.as_str(), "custom.html");
    }

    #[tokio::test]
    async fn test_バックグラウンド送信は送信完了前に戻る() {
        let fixture = Fixture::with_transport(MockMailTransport::blocking());
        let sut = fixture.dispatcher_with_runner(Arc::new(TokioTaskRunner::current().unwrap()));

        sut.dispatch_in_background(background_message(), templates().email_verification);

        // 送信はまだ保留されている
        assert_eq!(fixture.transport.sent_count(), 0);

        fixture.transport.release();
        fixture.transport.wait_for_sent(1).await;
        assert_eq!(fixture.transport.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_バックグラウンド送信の失敗は呼び出し元に伝わらない() {
        let fixture = Fixture::new();
        fixture.transport.fail_sends();
        let sut = fixture.dispatcher();

        sut.dispatch_in_background(background_message(), TemplateName::new("custom.html"));
        fixture.runner.run_all().await;

        assert_eq!(fixture.runner.pending(), 0);
        assert_eq!(fixture.transport.sent_count(), 0);
    }

    #[test]
    fn test_メール種別ごとのテンプレート名を返す() {
        let templates = templates();

        assert_eq!(
            templates.for_intent(EmailIntent::PasswordReset).as_str(),
            "password_reset.html"
        );
        assert_eq!(
            templates.for_intent(EmailIntent::EmailVerification).as_str(),
            "email_verification.html"
        );
    }
}
