//! # ドメイン層エラー定義
//!
//! 値オブジェクトの生成時に検出されるルール違反を表現する。
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗 |
//!
//! 送信処理そのものの失敗（未登録アドレス、送信失敗など）は
//! [`crate::notification::NotificationError`] や
//! [`crate::credential::CredentialError`] で表現する。

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// - 必須フィールドが未入力
    /// - 文字数・桁数制限の超過
    /// - 不正なフォーマット
    #[error("バリデーションエラー: {0}")]
    Validation(String),
}
