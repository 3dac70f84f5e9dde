//! # 通知
//!
//! 送信メッセージとメール種別に関するドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`EmailIntent`] | メール種別 | パスワードリセット / メールアドレス確認 |
//! | [`OutgoingMessage`] | 送信メッセージ | 件名・宛先・テンプレート変数の組。1 回の送信の間だけ存在する |
//! | [`TemplateName`] | テンプレート名 | メール種別ごとに起動時の設定で決まる |
//!
//! ## 設計方針
//!
//! - **テンプレート変数は固定キー**: `title`, `first_name`, `code` / `path`
//! - **本文は常に HTML**: [`ContentSubtype::Html`] 以外のサブタイプは持たない
//! - **レンダリングは送信側**: メッセージはテンプレート変数のみを持ち、
//!   HTML への展開はメール送信トランスポートが担う

use std::collections::BTreeMap;

use serde::Serialize;
use strum::IntoStaticStr;
use thiserror::Error;

use crate::credential::{Code, Token};

/// テンプレート変数のキー
pub mod template_key {
    pub const TITLE: &str = "title";
    pub const FIRST_NAME: &str = "first_name";
    pub const CODE: &str = "code";
    pub const PATH: &str = "path";
}

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// メール送信に失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    TemplateFailed(String),

    /// 宛先・送信元アドレスが不正
    #[error("メールアドレスが不正: {0}")]
    InvalidAddress(String),
}

/// メール種別
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EmailIntent {
    /// パスワードリセット
    PasswordReset,
    /// メールアドレス確認（再送）
    EmailVerification,
}

impl EmailIntent {
    /// 件名
    pub fn subject(self) -> &'static str {
        match self {
            Self::PasswordReset => "Password Reset",
            Self::EmailVerification => "Email Verification",
        }
    }

    /// テンプレートの `title` 変数
    pub fn title(self) -> &'static str {
        match self {
            Self::PasswordReset => "Change your password",
            Self::EmailVerification => "Verify Your Account",
        }
    }
}

/// テンプレート名
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
#[display("{_0}")]
pub struct TemplateName(String);

impl TemplateName {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 本文のサブタイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContentSubtype {
    #[default]
    Html,
}

/// テンプレート変数（変数名 → 値）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct TemplateBody(BTreeMap<String, String>);

impl TemplateBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// 変数を追加した新しいインスタンスを返す
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 送信メッセージ
///
/// ユーザー検索に成功した後にのみ組み立てられる。永続化しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    pub subject:       String,
    pub recipients:    Vec<String>,
    pub template_body: TemplateBody,
    pub subtype:       ContentSubtype,
}

impl OutgoingMessage {
    /// コードを本文に埋め込むメッセージを作成する
    pub fn with_code(
        intent: EmailIntent,
        recipient: impl Into<String>,
        first_name: &str,
        code: &Code,
    ) -> Self {
        Self::build(
            intent,
            recipient.into(),
            first_name,
            template_key::CODE,
            code.as_str(),
        )
    }

    /// リンク（`path`）を本文に埋め込むメッセージを作成する
    pub fn with_path(
        intent: EmailIntent,
        recipient: impl Into<String>,
        first_name: &str,
        path: &str,
    ) -> Self {
        Self::build(intent, recipient.into(), first_name, template_key::PATH, path)
    }

    fn build(
        intent: EmailIntent,
        recipient: String,
        first_name: &str,
        credential_key: &str,
        credential_value: &str,
    ) -> Self {
        let template_body = TemplateBody::new()
            .with(template_key::TITLE, intent.title())
            .with(template_key::FIRST_NAME, first_name)
            .with(credential_key, credential_value);

        Self {
            subject: intent.subject().to_string(),
            recipients: vec![recipient],
            template_body,
            subtype: ContentSubtype::Html,
        }
    }
}

/// トークンを埋め込んだリンクを組み立てる
///
/// 単純な文字列連結で `{redirect_url}/?token={token}` を返す。
/// `redirect_url` の末尾スラッシュやエンコードは調整しない。
pub fn token_path(redirect_url: &str, token: &Token) -> String {
    format!("{}/?token={}", redirect_url, token.as_str())
}
