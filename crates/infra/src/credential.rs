//! # 認証情報の発行
//!
//! パスワードリセット / メールアドレス確認で利用するワンタイムコードと
//! 署名付きトークンを発行する。
//!
//! ## Redis キー設計
//!
//! | キー | 値 | TTL |
//! |-----|-----|-----|
//! | `credential:{purpose}:code:{user_id}` | コード（数字列） | 900秒（既定） |
//!
//! 同一ユーザー・同一用途のコードは再発行で上書きされる。
//!
//! ## トークン
//!
//! HS256 の JWT。クレームは `sub`, `email`, `purpose`, `jti`, `iat`, `exp`。
//! 検証は署名と `exp` で行うため、Redis には保存しない。

use async_trait::async_trait;
use chrono::{Duration, Utc};
use courier_domain::{
    credential::{Code, CodeLength, CredentialError, Token},
    notification::EmailIntent,
    user::User,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use rand::Rng;
use redis::{AsyncCommands, aio::ConnectionManager};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::InfraError;

/// 認証情報発行トレイト
///
/// コード系は `code_length` が `None` の場合、実装側の既定桁数を使う。
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    /// パスワードリセット用コードを発行する
    async fn issue_reset_code(
        &self,
        user: &User,
        code_length: Option<CodeLength>,
    ) -> Result<Code, CredentialError>;

    /// メールアドレス確認用コードを発行する
    async fn issue_verification_code(
        &self,
        user: &User,
        code_length: Option<CodeLength>,
    ) -> Result<Code, CredentialError>;

    /// パスワードリセット用トークンを発行する
    async fn issue_reset_token(&self, user: &User) -> Result<Token, CredentialError>;

    /// メールアドレス確認用トークンを発行する
    async fn issue_verification_token(&self, user: &User) -> Result<Token, CredentialError>;
}

/// 認証情報発行の設定
#[derive(Clone)]
pub struct CredentialConfig {
    /// JWT 署名用の HMAC シークレット
    pub token_secret:        String,
    /// `code_length` 未指定時の桁数
    pub default_code_length: CodeLength,
    /// コードの有効期限（秒）
    pub code_ttl_seconds:    u64,
    /// トークンの有効期限（秒）
    pub token_ttl_seconds:   u64,
}

impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("token_secret", &"[REDACTED]")
            .field("default_code_length", &self.default_code_length)
            .field("code_ttl_seconds", &self.code_ttl_seconds)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

/// トークンのクレーム
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    pub sub:     Uuid,
    pub email:   String,
    pub purpose: String,
    pub jti:     Uuid,
    pub iat:     i64,
    pub exp:     i64,
}

/// Redis + JWT を使用した認証情報の発行
pub struct RedisCredentialIssuer {
    conn:   ConnectionManager,
    config: CredentialConfig,
}

impl RedisCredentialIssuer {
    /// 新しい RedisCredentialIssuer を作成する
    ///
    /// # 引数
    ///
    /// - `redis_url`: Redis 接続 URL（例: `redis://localhost:6379`）
    /// - `config`: 桁数・有効期限・署名シークレット
    pub async fn new(redis_url: &str, config: CredentialConfig) -> Result<Self, InfraError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn, config })
    }

    /// コードの保存キーを生成する
    pub fn code_key(purpose: EmailIntent, user: &User) -> String {
        format!("credential:{}:code:{}", purpose, user.id().as_uuid())
    }

    async fn issue_code(
        &self,
        purpose: EmailIntent,
        user: &User,
        code_length: Option<CodeLength>,
    ) -> Result<Code, CredentialError> {
        let length = code_length.unwrap_or(self.config.default_code_length);
        let code = generate_code(length);
        let key = Self::code_key(purpose, user);

        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, code.as_str(), self.config.code_ttl_seconds)
            .await
            .map_err(|e| {
                let e = InfraError::from(e);
                tracing::error!(error = %e, %purpose, "コードの保存に失敗");
                CredentialError::StoreFailed(e.to_string())
            })?;

        tracing::debug!(%purpose, length = length.get(), "コードを発行しました");
        Ok(code)
    }
}

#[async_trait]
impl CredentialIssuer for RedisCredentialIssuer {
    async fn issue_reset_code(
        &self,
        user: &User,
        code_length: Option<CodeLength>,
    ) -> Result<Code, CredentialError> {
        self.issue_code(EmailIntent::PasswordReset, user, code_length)
            .await
    }

    async fn issue_verification_code(
        &self,
        user: &User,
        code_length: Option<CodeLength>,
    ) -> Result<Code, CredentialError> {
        self.issue_code(EmailIntent::EmailVerification, user, code_length)
            .await
    }

    async fn issue_reset_token(&self, user: &User) -> Result<Token, CredentialError> {
        sign_token(&self.config, user, EmailIntent::PasswordReset)
    }

    async fn issue_verification_token(&self, user: &User) -> Result<Token, CredentialError> {
        sign_token(&self.config, user, EmailIntent::EmailVerification)
    }
}

/// 指定桁数の数字列を生成する
fn generate_code(length: CodeLength) -> Code {
    let mut rng = rand::rng();
    let digits: String = (0..length.as_usize())
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect();
    Code::new(digits)
}

/// 用途付きの JWT を署名する
fn sign_token(
    config: &CredentialConfig,
    user: &User,
    purpose: EmailIntent,
) -> Result<Token, CredentialError> {
    let now = Utc::now();
    let ttl = i64::try_from(config.token_ttl_seconds)
        .map_err(|e| CredentialError::SigningFailed(format!("有効期限が不正: {e}")))?;
    let expires_at = now + Duration::seconds(ttl);

    let claims = CredentialClaims {
        sub:     *user.id().as_uuid(),
        email:   user.email().as_str().to_string(),
        purpose: purpose.to_string(),
        jti:     Uuid::new_v4(),
        iat:     now.timestamp(),
        exp:     expires_at.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.token_secret.as_bytes()),
    )
    .map_err(|e| CredentialError::SigningFailed(e.to_string()))?;

    Ok(Token::new(token))
}
