//! # 認証情報
//!
//! パスワードリセット・メールアドレス確認のために発行される短命の認証情報を定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`Code`] | ワンタイムコード | ユーザーが画面に入力する短い数字列 |
//! | [`Token`] | 署名付きトークン | リンク URL に埋め込む署名済み文字列 |
//! | [`CodeLength`] | コード桁数 | 呼び出し元が指定する桁数（省略時は発行者の既定値） |
//!
//! 認証情報の有効期限・桁数の既定値は発行者（`CredentialIssuer`）が決める。
//! ディスパッチャは発行された値をメッセージに埋め込んで返すだけで、保持しない。

use serde::Serialize;
use thiserror::Error;

use crate::DomainError;

/// コード桁数の上限
pub const MAX_CODE_LENGTH: u8 = 32;

/// 認証情報の発行エラー
#[derive(Debug, Error)]
pub enum CredentialError {
    /// 発行した認証情報の保存に失敗
    #[error("認証情報の保存に失敗: {0}")]
    StoreFailed(String),

    /// トークンの署名に失敗
    #[error("トークンの署名に失敗: {0}")]
    SigningFailed(String),
}

/// コード桁数（1〜32）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodeLength(u8);

impl CodeLength {
    /// 桁数を作成する
    ///
    /// 0 または [`MAX_CODE_LENGTH`] を超える値は `DomainError::Validation` を返す。
    pub fn new(value: u32) -> Result<Self, DomainError> {
        if value == 0 {
            return Err(DomainError::Validation(
                "コード桁数は 1 以上である必要があります".to_string(),
            ));
        }
        if value > u32::from(MAX_CODE_LENGTH) {
            return Err(DomainError::Validation(format!(
                "コード桁数は {MAX_CODE_LENGTH} 以下である必要があります"
            )));
        }
        Ok(Self(value as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        usize::from(self.0)
    }
}

/// ワンタイムコード
///
/// `Debug` 出力はマスクする（ログへの平文出力を防止）。
#[derive(Clone, PartialEq, Eq)]
pub struct Code(String);

impl Code {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Code").field(&"[REDACTED]").finish()
    }
}

/// 署名付きトークン
///
/// `Debug` 出力はマスクする（ログへの平文出力を防止）。
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Token").field(&"[REDACTED]").finish()
    }
}

/// コード送信の結果（`{ "code": ... }`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeResult {
    pub code: String,
}

impl From<Code> for CodeResult {
    fn from(code: Code) -> Self {
        Self {
            code: code.into_string(),
        }
    }
}

/// トークン送信の結果（`{ "token": ... }`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenResult {
    pub token: String,
}

impl From<Token> for TokenResult {
    fn from(token: Token) -> Self {
        Self {
            token: token.into_string(),
        }
    }
}
