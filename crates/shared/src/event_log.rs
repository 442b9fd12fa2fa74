//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! ログフィールドの命名規約とヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## エラーコンテキスト
//!
//! `tracing::error!` に `error.category` + `error.kind` フィールドを直接追加する。
//! 定数は [`error`] モジュールで提供。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用する。JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.entity_type` / `event.entity_id`: 対象エンティティ
/// - `event.actor_id`: 操作者 ID
/// - `event.result`: 結果（[`event::result`] の定数を使用）
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const APPROVAL: &str = "approval";
        pub const FORM: &str = "form";
    }

    /// イベントアクション
    pub mod action {
        // 決裁文書
        pub const APPROVAL_SAVED_TEMPORARILY: &str = "approval.saved_temporarily";
        pub const APPROVAL_SUBMITTED: &str = "approval.submitted";
        pub const APPROVAL_APPROVED: &str = "approval.approved";
        pub const APPROVAL_REJECTED: &str = "approval.rejected";
        pub const APPROVAL_CANCELLED: &str = "approval.cancelled";
        pub const APPROVAL_DELETED: &str = "approval.deleted";

        // コメント・添付
        pub const COMMENT_ADDED: &str = "comment.added";
        pub const COMMENT_UPDATED: &str = "comment.updated";
        pub const COMMENT_DELETED: &str = "comment.deleted";
        pub const ATTACHMENT_DELETED: &str = "attachment.deleted";

        // 様式
        pub const FORM_CREATED: &str = "form.created";
        pub const FORM_DELETED: &str = "form.deleted";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const APPROVAL_DOCUMENT: &str = "approval_document";
        pub const APPROVAL_FORM: &str = "approval_form";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（DB、ファイルストレージ）
        pub const INFRASTRUCTURE: &str = "infrastructure";
    }

    /// エラー種別
    pub mod kind {
        pub const DATABASE: &str = "database";
        pub const STORAGE: &str = "storage";
        pub const INTERNAL: &str = "internal";
    }
}
