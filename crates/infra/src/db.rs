//! # PostgreSQL 接続
//!
//! ユーザーディレクトリが参照する PostgreSQL への接続プールと、
//! `users` テーブルのマイグレーションを扱う。
//! ディレクトリは読み取り専用なので、トランザクションは扱わない。

use std::time::Duration;

use sqlx::{PgPool, migrate::MigrateError, postgres::PgPoolOptions};

/// プールの最大接続数
const MAX_CONNECTIONS: u32 = 10;

/// 接続取得のタイムアウト
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// 起動時に `migrations/` を適用する（適用済みのものはスキップ）
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

/// 接続プールを作成する
///
/// プロセス内で一度だけ作成し、[`crate::PostgresUserDirectory`] に渡す。
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
}
