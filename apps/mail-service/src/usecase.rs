//! # ユースケース層
//!
//! メール配信のビジネスロジックを実装する。

pub mod dispatcher;

pub use dispatcher::{DispatchError, MailTemplates, NotificationDispatcher};
