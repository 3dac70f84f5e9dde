//! # UserDirectory
//!
//! メールアドレスから登録ユーザーを引くためのディレクトリ。
//!
//! メールアドレスは完全一致で照合する（大文字小文字の正規化はしない）。
//! 同一アドレスの行が複数ある場合は `created_at` が最も古い行を採用する。

use async_trait::async_trait;
use courier_domain::user::{Email, User, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// ユーザーディレクトリトレイト
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// メールアドレスでユーザーを検索する
    ///
    /// # 戻り値
    ///
    /// - `Ok(Some(user))`: ユーザーが見つかった場合
    /// - `Ok(None)`: ユーザーが見つからない場合
    /// - `Err(_)`: データベースエラー
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, InfraError>;
}

/// DB の users テーブルの行を表す中間構造体
///
/// `TryFrom` で `User` への変換ロジックを一箇所に集約する。
#[derive(sqlx::FromRow)]
struct UserRow {
    id:         Uuid,
    email:      String,
    first_name: String,
}

impl TryFrom<UserRow> for User {
    type Error = InfraError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::new(row.email).map_err(|e| InfraError::unexpected(e.to_string()))?;
        Ok(User::new(UserId::from_uuid(row.id), email, row.first_name))
    }
}

/// PostgreSQL 実装の UserDirectory
#[derive(Debug, Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    /// 新しいディレクトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    #[tracing::instrument(skip_all, level = "debug", fields(%email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, InfraError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, first_name
            FROM users
            WHERE email = $1
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }
}
