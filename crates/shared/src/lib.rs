//! # Courier 共有ユーティリティ
//!
//! Courier の各クレートで使用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - 他のすべてのクレート（domain 以外）から依存される
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - axum への依存は持たない（`IntoResponse` 変換は各サービスの責務）

pub mod api_response;
pub mod error_response;
pub mod event_log;
pub mod health;
pub mod observability;

pub use api_response::ApiResponse;
pub use error_response::ErrorResponse;
pub use health::HealthResponse;
