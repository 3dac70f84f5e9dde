//! # Courier ドメイン層
//!
//! アカウント系トランザクションメール（パスワードリセット・メールアドレス確認）の
//! 送信で扱うドメインモデルを定義する。
//!
//! ## 依存関係の方向
//!
//! ```text
//! apps → infra → domain
//!          ↘       ↑
//!            shared
//! ```
//!
//! ドメイン層は DB・Redis・SMTP のいずれにも依存しない。
//!
//! ## モジュール構成
//!
//! - [`error`] - ドメイン層のエラー定義
//! - [`user`] - 送信先ユーザーとメールアドレス
//! - [`credential`] - ワンタイムコードと署名付きトークン
//! - [`notification`] - 送信メッセージ、メール種別、テンプレート名

pub mod credential;
pub mod error;
pub mod notification;
pub mod user;

pub use error::DomainError;
