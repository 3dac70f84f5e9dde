//! # Mail Service 設定
//!
//! 環境変数から Mail Service サーバーの設定を読み込む。
//!
//! 設定は起動時に一度だけ読み込み、各コンポーネントに明示的に渡す。
//! 必須変数の欠落や数値の不正は [`ConfigError`] として返す。

use std::env;

use courier_domain::{credential::CodeLength, notification::TemplateName};
use courier_infra::{
    credential::CredentialConfig,
    notification::{MailConfig, TlsMode},
};
use strum::EnumString;
use thiserror::Error;

use crate::usecase::MailTemplates;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    /// 環境変数の値が不正
    #[error("{var} の値が不正です: {value:?}（{reason}）")]
    Invalid {
        var:    &'static str,
        value:  String,
        reason: String,
    },
}

/// メール送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MailBackend {
    /// SMTP サーバー経由で送信
    Smtp,
    /// 送信しない（ログ出力のみ）
    #[default]
    Noop,
}

/// Mail Service サーバーの設定
#[derive(Debug, Clone)]
pub struct MailServiceConfig {
    /// バインドアドレス
    pub host:         String,
    /// ポート番号
    pub port:         u16,
    /// データベース接続 URL
    pub database_url: String,
    /// Redis 接続 URL
    pub redis_url:    String,
    /// メール送信設定
    pub mail:         MailSettings,
    /// 認証情報発行設定
    pub credential:   CredentialConfig,
}

/// メール送信まわりの設定
///
/// `MAIL_BACKEND` 環境変数で送信バックエンドを切り替える:
/// - `smtp`: SMTP サーバー経由で送信
/// - `noop`: 送信しない（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub backend:         MailBackend,
    pub smtp:            MailConfig,
    /// テンプレートフォルダ
    pub template_folder: String,
    /// メール種別ごとのテンプレート名
    pub templates:       MailTemplates,
}

impl MailServiceConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// 空文字列は未設定として扱う。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        Ok(Self {
            host:         vars.or("MAIL_SERVICE_HOST", "0.0.0.0"),
            port:         vars.parse_required("MAIL_SERVICE_PORT")?,
            database_url: vars.required("DATABASE_URL")?,
            redis_url:    vars.required("REDIS_URL")?,
            mail:         MailSettings::from_vars(&vars)?,
            credential:   credential_config(&vars)?,
        })
    }
}

impl MailSettings {
    fn from_vars(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        let smtp = MailConfig {
            server:          vars.or("MAIL_SERVER", "localhost"),
            port:            vars.parse_or("MAIL_PORT", 587)?,
            username:        vars.get("MAIL_USERNAME"),
            password:        vars.get("MAIL_PASSWORD"),
            use_credentials: vars.parse_or("MAIL_USE_CREDENTIALS", true)?,
            from:            vars.or("MAIL_FROM", "noreply@courier.example.com"),
            from_name:       vars.or("MAIL_FROM_NAME", "Courier"),
            tls_mode:        vars.parse_or("MAIL_TLS_MODE", TlsMode::default())?,
        };

        Ok(Self {
            backend: vars.parse_or("MAIL_BACKEND", MailBackend::default())?,
            smtp,
            template_folder: vars.or("TEMPLATE_FOLDER", "templates/mail"),
            templates: MailTemplates {
                password_reset:     TemplateName::new(
                    vars.or("PASSWORD_RESET_TEMPLATE", "password_reset.html"),
                ),
                email_verification: TemplateName::new(
                    vars.or("EMAIL_VERIFICATION_TEMPLATE", "email_verification.html"),
                ),
            },
        })
    }
}

fn credential_config(vars: &Vars<'_>) -> Result<CredentialConfig, ConfigError> {
    let code_length: u32 = vars.parse_or("CREDENTIAL_CODE_LENGTH", 6)?;
    let default_code_length = CodeLength::new(code_length).map_err(|e| ConfigError::Invalid {
        var:    "CREDENTIAL_CODE_LENGTH",
        value:  code_length.to_string(),
        reason: e.to_string(),
    })?;

    Ok(CredentialConfig {
        token_secret: vars.required("CREDENTIAL_TOKEN_SECRET")?,
        default_code_length,
        code_ttl_seconds: vars.parse_or("CREDENTIAL_CODE_TTL_SECONDS", 900)?,
        token_ttl_seconds: vars.parse_or("CREDENTIAL_TOKEN_TTL_SECONDS", 3600)?,
    })
}

/// 環境変数の参照ヘルパー
struct Vars<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Vars<'_> {
    fn get(&self, var: &str) -> Option<String> {
        (self.0)(var).filter(|v| !v.is_empty())
    }

    fn or(&self, var: &str, default: &str) -> String {
        self.get(var).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, var: &'static str) -> Result<String, ConfigError> {
        self.get(var).ok_or(ConfigError::Missing(var))
    }

    fn parse_required<T>(&self, var: &'static str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.required(var)?;
        parse(var, value)
    }

    fn parse_or<T>(&self, var: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(var) {
            Some(value) => parse(var, value),
            None => Ok(default),
        }
    }
}

fn parse<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: e.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn required_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("MAIL_SERVICE_PORT", "13003"),
            ("DATABASE_URL", "postgres://localhost/courier"),
            ("REDIS_URL", "redis://localhost:6379"),
            ("CREDENTIAL_TOKEN_SECRET", "secret"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<MailServiceConfig, ConfigError> {
        MailServiceConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_必須変数のみで既定値が適用される() {
        let config = load(&required_vars()).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 13003);
        assert_eq!(config.mail.backend, MailBackend::Noop);
        assert_eq!(config.mail.smtp.server, "localhost");
        assert_eq!(config.mail.smtp.port, 587);
        assert!(config.mail.smtp.use_credentials);
        assert_eq!(config.mail.smtp.from, "noreply@courier.example.com");
        assert_eq!(config.mail.smtp.from_name, "Courier");
        assert_eq!(config.mail.smtp.tls_mode, TlsMode::StartTls);
        assert_eq!(config.mail.template_folder, "templates/mail");
        assert_eq!(
            config.mail.templates.password_reset.as_str(),
            "password_reset.html"
        );
        assert_eq!(
            config.mail.templates.email_verification.as_str(),
            "email_verification.html"
        );
        assert_eq!(config.credential.default_code_length.get(), 6);
        assert_eq!(config.credential.code_ttl_seconds, 900);
        assert_eq!(config.credential.token_ttl_seconds, 3600);
    }

    #[test]
    fn test_環境変数で既定値を上書きできる() {
        let mut vars = required_vars();
        vars.extend([
            ("MAIL_BACKEND", "smtp"),
            ("MAIL_SERVER", "smtp.example.com"),
            ("MAIL_PORT", "465"),
            ("MAIL_USERNAME", "mailer"),
            ("MAIL_PASSWORD", "pw"),
            ("MAIL_USE_CREDENTIALS", "false"),
            ("MAIL_TLS_MODE", "tls"),
            ("PASSWORD_RESET_TEMPLATE", "reset.html"),
            ("CREDENTIAL_CODE_LENGTH", "8"),
        ]);

        let config = load(&vars).unwrap();

        assert_eq!(config.mail.backend, MailBackend::Smtp);
        assert_eq!(config.mail.smtp.server, "smtp.example.com");
        assert_eq!(config.mail.smtp.port, 465);
        assert_eq!(config.mail.smtp.username.as_deref(), Some("mailer"));
        assert!(!config.mail.smtp.use_credentials);
        assert_eq!(config.mail.smtp.tls_mode, TlsMode::Tls);
        assert_eq!(config.mail.templates.password_reset.as_str(), "reset.html");
        assert_eq!(config.credential.default_code_length.get(), 8);
    }

    #[rstest]
    #[case("MAIL_SERVICE_PORT")]
    #[case("DATABASE_URL")]
    #[case("REDIS_URL")]
    #[case("CREDENTIAL_TOKEN_SECRET")]
    fn test_必須変数が欠けるとmissingになる(#[case] var: &'static str) {
        let mut vars = required_vars();
        vars.remove(var);

        let result = load(&vars);

        assert_eq!(result.unwrap_err(), ConfigError::Missing(var));
    }

    #[test]
    fn test_空文字列は未設定として扱う() {
        let mut vars = required_vars();
        vars.insert("REDIS_URL", "");

        let result = load(&vars);

        assert_eq!(result.unwrap_err(), ConfigError::Missing("REDIS_URL"));
    }

    #[rstest]
    #[case("MAIL_SERVICE_PORT", "not-a-port")]
    #[case("MAIL_PORT", "70000")]
    #[case("MAIL_BACKEND", "ses")]
    #[case("MAIL_TLS_MODE", "ssl")]
    #[case("MAIL_USE_CREDENTIALS", "yes")]
    #[case("CREDENTIAL_CODE_LENGTH", "0")]
    #[case("CREDENTIAL_CODE_LENGTH", "33")]
    #[case("CREDENTIAL_CODE_TTL_SECONDS", "-1")]
    fn test_不正な値はinvalidになる(#[case] var: &'static str, #[case] value: &'static str) {
        let mut vars = required_vars();
        vars.insert(var, value);

        let result = load(&vars);

        assert!(
            matches!(&result, Err(ConfigError::Invalid { var: v, .. }) if *v == var),
            "{var}={value} は Invalid になること: {result:?}",
        );
    }
}
