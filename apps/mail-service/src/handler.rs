//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは入力の検証のみを行い、配信処理はディスパッチャに委譲

pub mod health;
pub mod mail;

pub use health::health_check;
pub use mail::{
    CodeRequest,
    MailState,
    TokenRequest,
    resend_code_for_verification,
    resend_token_for_verification,
    send_code_for_password_reset,
    send_token_for_password_reset,
};
