//! # Courier インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! メール配信ユースケースが依存する協調オブジェクト（ユーザーディレクトリ、
//! 認証情報の発行、メール送信、遅延タスク実行）をトレイトとして定義し、
//! その具体的な実装を提供する。ユースケース層はトレイトにのみ依存し、
//! `Arc<dyn Trait>` として実装を受け取る。
//!
//! ## 依存関係
//!
//! ```text
//! mail-service → infra → domain
//!       ↘                  ↑
//!         shared ─ ─ ─ ─ ─ ┘ (依存なし)
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL 接続プール
//! - [`error`] - インフラ層エラー定義
//! - [`repository`] - ユーザーディレクトリ（PostgreSQL）
//! - [`credential`] - ワンタイムコード / 署名付きトークンの発行（Redis + JWT）
//! - [`notification`] - メール送信（SMTP / Noop）とテンプレートレンダリング
//! - [`task`] - 遅延タスク実行（tokio）
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use courier_infra::{db, repository::PostgresUserDirectory};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::create_pool("postgres://localhost/courier").await?;
//!     let directory = PostgresUserDirectory::new(pool);
//!     Ok(())
//! }
//! ```

pub mod credential;
pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod notification;
pub mod repository;
pub mod task;

pub use credential::{CredentialConfig, CredentialIssuer, RedisCredentialIssuer};
pub use error::{InfraError, InfraErrorKind};
pub use notification::{MailTransport, NoopMailTransport, SmtpMailTransport, TemplateRenderer};
pub use repository::{PostgresUserDirectory, UserDirectory};
pub use task::{DeferredTask, DeferredTaskRunner, TokioTaskRunner};
