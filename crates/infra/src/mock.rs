//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリモック。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! courier-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{
    Arc,
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use courier_domain::{
    credential::{Code, CodeLength, CredentialError, Token},
    notification::{EmailIntent, NotificationError, OutgoingMessage, TemplateName},
    user::{User, UserId},
};
use tokio::sync::{Notify, Semaphore};

use crate::{
    credential::CredentialIssuer,
    error::InfraError,
    notification::MailTransport,
    repository::UserDirectory,
    task::{DeferredTask, DeferredTaskRunner},
};

// ===== MockUserDirectory =====

#[derive(Clone, Default)]
pub struct MockUserDirectory {
    users:   Arc<Mutex<Vec<User>>>,
    lookups: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl MockUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    /// 以降の検索を `InfraError` で失敗させる
    pub fn fail_lookups(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserDirectory for MockUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, InfraError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(InfraError::unexpected("ディレクトリ障害"));
        }
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email().as_str() == email)
            .cloned())
    }
}

// ===== MockCredentialIssuer =====

/// 発行された認証情報の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuedKind {
    Code,
    Token,
}

/// 発行呼び出しの記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    pub purpose:     EmailIntent,
    pub kind:        IssuedKind,
    pub user_id:     UserId,
    pub code_length: Option<CodeLength>,
    pub value:       String,
}

/// 呼び出しごとに異なる値を発行するモック
///
/// コードは連番を `code_length`（未指定時は 6）桁にゼロ埋めした値、
/// トークンは `token-{連番}` になる。
#[derive(Clone, Default)]
pub struct MockCredentialIssuer {
    issued:  Arc<Mutex<Vec<IssuedCredential>>>,
    counter: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl MockCredentialIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以降の発行を `CredentialError` で失敗させる
    pub fn fail_issuance(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn issued(&self) -> Vec<IssuedCredential> {
        self.issued.lock().unwrap().clone()
    }

    fn issue(
        &self,
        purpose: EmailIntent,
        kind: IssuedKind,
        user: &User,
        code_length: Option<CodeLength>,
    ) -> Result<String, CredentialError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CredentialError::StoreFailed("ストア障害".to_string()));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let value = match kind {
            IssuedKind::Code => {
                let width = code_length.map_or(6, CodeLength::as_usize);
                let digits = format!("{n:0width$}");
                digits[digits.len() - width..].to_string()
            }
            IssuedKind::Token => format!("token-{n}"),
        };

        self.issued.lock().unwrap().push(IssuedCredential {
            purpose,
            kind,
            user_id: *user.id(),
            code_length,
            value: value.clone(),
        });
        Ok(value)
    }
}

#[async_trait]
impl CredentialIssuer for MockCredentialIssuer {
    async fn issue_reset_code(
        &self,
        user: &User,
        code_length: Option<CodeLength>,
    ) -> Result<Code, CredentialError> {
        self.issue(EmailIntent::PasswordReset, IssuedKind::Code, user, code_length)
            .map(Code::new)
    }

    async fn issue_verification_code(
        &self,
        user: &User,
        code_length: Option<CodeLength>,
    ) -> Result<Code, CredentialError> {
        self.issue(
            EmailIntent::EmailVerification,
            IssuedKind::Code,
            user,
            code_length,
        )
        .map(Code::new)
    }

    async fn issue_reset_token(&self, user: &User) -> Result<Token, CredentialError> {
        self.issue(EmailIntent::PasswordReset, IssuedKind::Token, user, None)
            .map(Token::new)
    }

    async fn issue_verification_token(&self, user: &User) -> Result<Token, CredentialError> {
        self.issue(EmailIntent::EmailVerification, IssuedKind::Token, user, None)
            .map(Token::new)
    }
}

// ===== MockMailTransport =====

/// 送信されたメールの記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub message:       OutgoingMessage,
    pub template_name: TemplateName,
}

/// 送信内容を記録するモック
///
/// [`blocking`](MockMailTransport::blocking) で作成すると、
/// [`release`](MockMailTransport::release) が呼ばれるまで送信が完了しない。
#[derive(Clone, Default)]
pub struct MockMailTransport {
    sent:    Arc<Mutex<Vec<SentMail>>>,
    gate:    Option<Arc<Semaphore>>,
    notify:  Arc<Notify>,
    failing: Arc<AtomicBool>,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// `release` されるまで送信を保留するモックを作成する
    pub fn blocking() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        }
    }

    /// 保留中の送信を 1 件解放する
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    /// 以降の送信を `NotificationError` で失敗させる
    pub fn fail_sends(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// 送信記録が `count` 件に達するまで待つ
    pub async fn wait_for_sent(&self, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.sent_count() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn send_message(
        &self,
        message: &OutgoingMessage,
        template_name: &TemplateName,
    ) -> Result<(), NotificationError> {
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| NotificationError::SendFailed(e.to_string()))?
                .forget();
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::SendFailed("SMTP 障害".to_string()));
        }

        self.sent.lock().unwrap().push(SentMail {
            message:       message.clone(),
            template_name: template_name.clone(),
        });
        self.notify.notify_waiters();
        Ok(())
    }
}

// ===== ManualTaskRunner =====

/// 登録されたタスクを保持し、明示的に実行するまで動かさないランナー
#[derive(Clone, Default)]
pub struct ManualTaskRunner {
    tasks: Arc<Mutex<Vec<DeferredTask>>>,
}

impl ManualTaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    /// 保留中のタスクを登録順にすべて実行する
    pub async fn run_all(&self) {
        let tasks: Vec<DeferredTask> = std::mem::take(&mut *self.tasks.lock().unwrap());
        for task in tasks {
            task.await;
        }
    }
}

impl DeferredTaskRunner for ManualTaskRunner {
    fn add_task(&self, task: DeferredTask) {
        self.tasks.lock().unwrap().push(task);
    }
}
