//! # メール配信のビジネスイベント
//!
//! 送信・失敗・バックグラウンド登録・未登録アドレスを [`log_business_event!`] で記録する。
//! 出力には `event.kind = "business_event"` が付き、JSON 出力なら
//! `jq 'select(.["event.kind"] == "business_event")'` で抜き出せる。
//!
//! フィールドはドット区切り（`event.action`、`mail.template` など）。
//! コード・トークンの値は記録しない。

/// `info` レベルでビジネスイベントを出力する
///
/// `event.category` / `event.action` / `event.result` には
/// [`event`] モジュールの定数を渡す。
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

pub mod event {
    pub mod category {
        pub const MAIL: &str = "mail";
    }

    pub mod action {
        pub const MAIL_SENT: &str = "mail.sent";
        pub const MAIL_FAILED: &str = "mail.failed";
        pub const MAIL_ENQUEUED: &str = "mail.enqueued";
        pub const MAIL_NOT_REGISTERED: &str = "mail.not_registered";
    }

    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// `tracing::error!` に付ける `error.category` / `error.kind` の値
pub mod error {
    pub mod category {
        /// インフラストラクチャ（DB、Redis）
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// 外部サービス（SMTP）
        pub const EXTERNAL_SERVICE: &str = "external_service";
    }

    pub mod kind {
        pub const USER_LOOKUP: &str = "user_lookup";
        pub const CREDENTIAL_ISSUANCE: &str = "credential_issuance";
        pub const MAIL_TRANSPORT: &str = "mail_transport";
    }
}
