//! # SignFlow ドメイン層
//!
//! 決裁（稟議）業務の中核となるドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: 決裁文書・本文・決裁様式。状態遷移は所有権を消費するメソッドで表現する
//! - **値オブジェクト**: メンバー名、バージョン番号、参照者リストなど
//! - **ドメインサービス**: 役割判定、コメント権限、一覧の射影（いずれも純粋関数）
//! - **ドメインエラー**: 入力値の検証失敗と決裁ルール違反
//!
//! ## 依存関係の方向
//!
//! ```text
//! core-service → infra → domain
//! ```
//!
//! ドメイン層は DB やファイルストレージに一切依存しない。
//! 現在時刻と操作者は呼び出し側から明示的に渡す。
//!
//! ## モジュール構成
//!
//! - [`approval`] - 決裁文書・決裁ライン・添付・様式・一覧
//! - [`member`] - メンバーと操作者
//! - [`value_objects`] - 共通値オブジェクト
//! - [`clock`] - 時刻プロバイダ
//! - [`error`] - ドメイン層で発生するエラーの定義
//!
//! ## 使用例
//!
//! ```rust
//! use signflow_domain::{DomainError, approval::ApprovalNo};
//!
//! let approval_no = ApprovalNo::new();
//!
//! let error = DomainError::NotFound {
//!     entity_type: "ApprovalDocument",
//!     id:          approval_no.to_string(),
//! };
//! ```

#[macro_use]
mod macros;

pub mod approval;
pub mod clock;
pub mod error;
pub mod member;
pub mod value_objects;

pub use error::DomainError;
