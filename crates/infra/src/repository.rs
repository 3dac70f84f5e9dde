//! # リポジトリ実装
//!
//! ユースケース層が依存するデータ取得トレイトと、その PostgreSQL 実装を提供する。
//!
//! ## 設計方針
//!
//! - **読み取り専用**: メール配信はユーザー情報を参照するのみ
//! - **テスタビリティ**: トレイト経由でモック可能な設計

pub mod user_directory;

pub use user_directory::{PostgresUserDirectory, UserDirectory};
