//! # 決裁
//!
//! 決裁文書の状態遷移、役割判定、コメント・添付の権限、一覧の射影を扱う。
//!
//! ## モジュール構成
//!
//! - [`document`]: 決裁文書（決裁ラインと状態遷移）
//! - [`signer`]: 決裁ライン（最大 5 名のスロット）
//! - [`detail`]: 本文・添付スロット・コメント欄
//! - [`form`]: 決裁様式
//! - [`role`]: 文書に対する操作者の役割
//! - [`comment`]: コメントと添付の権限判定・適用
//! - [`listing`]: 進捗ビュー・ダッシュボードの射影
//! - [`error`]: 決裁ルール違反

pub mod comment;
pub mod detail;
pub mod document;
pub mod error;
pub mod form;
pub mod listing;
pub mod role;
pub mod signer;

pub use comment::*;
pub use detail::*;
pub use document::*;
pub use error::*;
pub use form::*;
pub use listing::*;
pub use role::*;
pub use signer::*;
