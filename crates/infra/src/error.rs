//! # インフラ層エラー
//!
//! ユーザーディレクトリ（PostgreSQL）と認証情報ストア（Redis）の障害を表す。
//!
//! [`InfraError`] は種別 [`InfraErrorKind`] と、生成時点の [`SpanTrace`] を持つ。
//! ディスパッチャはこのエラーを変換せずに呼び出し元へ返すため、
//! どの操作の中で失敗したかは `span_trace()` から辿る。

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層のエラー
///
/// 種別で分岐するときは [`kind()`](InfraError::kind) を使う。
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// ユーザー検索のクエリ失敗・接続失敗
    #[error("データベースエラー: {0}")]
    Database(#[source] sqlx::Error),

    /// Redis への接続・コマンドの失敗
    #[error("Redis エラー: {0}")]
    Redis(#[source] redis::RedisError),

    /// 保存済みデータの不整合、ランタイム外からの呼び出しなど
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

impl InfraError {
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// エラー生成時点のスパン経路
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::capture(InfraErrorKind::Unexpected(msg.into()))
    }

    fn capture(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }
}

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

// `?` で変換した時点のスパンをキャプチャする

impl From<sqlx::Error> for InfraError {
    fn from(source: sqlx::Error) -> Self {
        Self::capture(InfraErrorKind::Database(source))
    }
}

impl From<redis::RedisError> for InfraError {
    fn from(source: redis::RedisError) -> Self {
        Self::capture(InfraErrorKind::Redis(source))
    }
}
