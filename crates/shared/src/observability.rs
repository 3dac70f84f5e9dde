//! # トレーシング初期化
//!
//! ログは `tracing` で出力し、形式は `LOG_FORMAT`、レベルは `RUST_LOG` で切り替える。
//!
//! | `LOG_FORMAT` | 出力 |
//! |--------------|------|
//! | `json` | 1 行 1 イベントの JSON（ログ基盤への転送用） |
//! | `pretty` / 未設定 | 人が読む形式 |
//!
//! `RUST_LOG` が未設定なら [`DEFAULT_FILTER`] を使う。

/// `RUST_LOG` 未設定時のフィルタ
pub const DEFAULT_FILTER: &str = "info,courier=debug";

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    /// `LOG_FORMAT` の値を解釈する
    ///
    /// 知らない値は `Pretty` として扱う。subscriber の初期化前に呼ばれるので、
    /// 警告は stderr に直接書く。
    pub fn parse(value: &str) -> Self {
        match value {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            other => {
                eprintln!("WARNING: LOG_FORMAT={other:?} は未対応のため pretty で出力します");
                Self::Pretty
            }
        }
    }

    pub fn from_env() -> Self {
        std::env::var("LOG_FORMAT")
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }
}

/// [`init_tracing`] に渡す設定
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// 起動ログに出すサービス名
    pub service_name: String,
    pub log_format:   LogFormat,
}

impl TracingConfig {
    pub fn new(service_name: impl Into<String>, log_format: LogFormat) -> Self {
        Self {
            service_name: service_name.into(),
            log_format,
        }
    }

    pub fn from_env(service_name: impl Into<String>) -> Self {
        Self::new(service_name, LogFormat::from_env())
    }
}

/// グローバル subscriber を登録する（プロセスで一度だけ呼ぶ）
///
/// `ErrorLayer` を重ねるので、`InfraError` の `SpanTrace` には
/// 失敗した操作のスパン（`send_code_for_password_reset` など）が残る。
#[cfg(feature = "observability")]
pub fn init_tracing(config: TracingConfig) {
    use tracing_subscriber::{EnvFilter, Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let output = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .with(tracing_error::ErrorLayer::default())
        .init();

    tracing::debug!(
        service = %config.service_name,
        format = ?config.log_format,
        "トレーシングを初期化しました"
    );
}
