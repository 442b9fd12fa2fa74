//! # ドメイン層エラー定義
//!
//! 入力値の検証失敗や、エンティティ復元時の不変条件違反を表現するエラー型。
//! 決裁業務ルールの違反は [`ApprovalError`] として分類し、
//! `DomainError::Approval` で包んで伝播できるようにしている。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗 |
//! | `NotFound` | 404 Not Found | エンティティが存在しない |
//! | `Approval` | 403 / 409 | 決裁ルール違反（種別ごとに決定） |
//!
//! ## 使用例
//!
//! ```rust
//! use signflow_domain::DomainError;
//!
//! fn validate_title(title: &str) -> Result<(), DomainError> {
//!     if title.is_empty() {
//!         return Err(DomainError::Validation("件名は必須です".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::approval::ApprovalError;

/// ドメイン層で発生するエラー
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// - 必須フィールドが未入力
    /// - 文字数制限の超過
    /// - 決裁ラインに空きスロットを挟んでいる
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// エンティティが見つからない
    #[error("{entity_type} が見つかりません: {id}")]
    NotFound {
        /// エンティティの種類（"ApprovalDocument", "ApprovalForm" など）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },

    /// 決裁ルール違反
    #[error(transparent)]
    Approval(#[from] ApprovalError),
}
