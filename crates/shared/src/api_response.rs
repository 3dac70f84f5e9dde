//! # 成功レスポンス
//!
//! 内部 API の成功時は、発行した値を `data` に包んで返す。
//!
//! ```json
//! { "data": { "code": "482913" } }
//! ```
//!
//! 失敗時の形式は [`crate::ErrorResponse`] を参照。

use serde::{Deserialize, Serialize};

/// `{ "data": T }` 形式のエンベロープ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
