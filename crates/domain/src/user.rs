//! # ユーザー
//!
//! メール送信先となるユーザーと、メールアドレスの値オブジェクトを定義する。
//!
//! ユーザー情報の所有者はユーザーディレクトリ（`courier-infra` の
//! `UserDirectory`）であり、このクレートからは読み取り専用として扱う。
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use courier_domain::user::{Email, User, UserId};
//!
//! let user = User::new(UserId::new(), Email::new("user@example.com")?, "Taro");
//! assert_eq!(user.first_name(), "Taro");
//! # Ok(())
//! # }
//! ```

use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::DomainError;

/// ユーザー ID
///
/// 発行したコードの保存キーやトークンの `sub` クレームに使用する。
/// 値の採番はユーザーディレクトリ側で行われる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct UserId(Uuid);

impl UserId {
    /// 新しい ID を採番する（UUID v7、主にテスト用）
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// メールアドレス（値オブジェクト）
///
/// 構造の最低限の検証（`local@domain`、255 文字以内）のみを行う。
/// RFC 準拠の厳密な検証は行わない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # エラー
    ///
    /// 空文字列、`@` を含まない、ローカル部/ドメイン部が空、255 文字超過の場合は
    /// `DomainError::Validation` を返す。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        if value.len() > 255 {
            return Err(DomainError::Validation(
                "メールアドレスは255文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ユーザーエンティティ
///
/// # 不変条件
///
/// - `email` は構造検証済み（同一アドレスの重複はディレクトリ側で解決する）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id:         UserId,
    email:      Email,
    first_name: String,
}

impl User {
    pub fn new(id: UserId, email: Email, first_name: impl Into<String>) -> Self {
        Self {
            id,
            email,
            first_name: first_name.into(),
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    /// テンプレートの `first_name` 変数に埋め込む名前
    pub fn first_name(&self) -> &str {
        &self.first_name
    }
}
