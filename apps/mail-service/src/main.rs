//! # Mail Service サーバー
//!
//! パスワードリセット・メールアドレス確認のメールを配信する内部サービス。
//!
//! ## 役割
//!
//! - **ユーザー検索**: メールアドレスから登録ユーザーを引く（PostgreSQL）
//! - **認証情報の発行**: ワンタイムコード（Redis）/ 署名付きトークン（JWT）
//! - **メール送信**: テンプレートを展開して SMTP で送信
//!
//! ## アクセス制御
//!
//! 内部ネットワークからのみアクセス可能とする。
//! 発行した認証情報をレスポンスで返すため、外部には公開しない。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `MAIL_SERVICE_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `MAIL_SERVICE_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `REDIS_URL` | **Yes** | Redis 接続 URL |
//! | `CREDENTIAL_TOKEN_SECRET` | **Yes** | トークン署名用シークレット |
//! | `MAIL_BACKEND` | No | `smtp` / `noop`（デフォルト: `noop`） |
//!
//! その他の変数は [`courier_mail_service::config`] を参照。
//!
//! ## 起動方法
//!
//! ```bash
//! MAIL_SERVICE_PORT=13003 DATABASE_URL=postgres://... REDIS_URL=redis://... \
//!   CREDENTIAL_TOKEN_SECRET=... cargo run -p courier-mail-service
//! ```

use std::{net::SocketAddr, sync::Arc};

use courier_infra::{
    credential::RedisCredentialIssuer,
    db,
    notification::{MailTransport, NoopMailTransport, SmtpMailTransport, TemplateRenderer},
    repository::PostgresUserDirectory,
    task::TokioTaskRunner,
};
use courier_mail_service::{
    app,
    config::{MailBackend, MailServiceConfig},
    handler::MailState,
    usecase::NotificationDispatcher,
};
use courier_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// Mail Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    init_tracing(TracingConfig::from_env("mail-service"));

    // 設定読み込み
    let config = MailServiceConfig::from_env()?;

    tracing::info!(
        "Mail Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // データベース接続プールを作成
    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("データベースに接続しました");

    let issuer = RedisCredentialIssuer::new(&config.redis_url, config.credential.clone()).await?;
    tracing::info!("Redis に接続しました");

    let transport: Arc<dyn MailTransport> = match config.mail.backend {
        MailBackend::Smtp => {
            let renderer = TemplateRenderer::from_folder(&config.mail.template_folder)?;
            tracing::info!(
                server = %config.mail.smtp.server,
                port = config.mail.smtp.port,
                "SMTP でメールを送信します"
            );
            Arc::new(SmtpMailTransport::new(&config.mail.smtp, renderer)?)
        }
        MailBackend::Noop => {
            tracing::info!("メール送信は無効です（Noop）");
            Arc::new(NoopMailTransport)
        }
    };

    let dispatcher = NotificationDispatcher::new(
        Arc::new(PostgresUserDirectory::new(pool)),
        Arc::new(issuer),
        transport,
        Arc::new(TokioTaskRunner::current()?),
        config.mail.templates.clone(),
    );
    let state = Arc::new(MailState { dispatcher });

    // サーバー起動
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Mail Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
