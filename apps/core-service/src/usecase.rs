//! # ユースケース層
//!
//! Core Service のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリ・ストレージ・時刻を `Arc<dyn Trait>` で外部から注入
//! - **明示的な操作者**: すべての操作は操作者のメンバー ID を引数で受け取る
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//!
//! ## モジュール構成
//!
//! - `approval`: 決裁文書の起案・決裁・コメント・閲覧・一覧
//! - `dashboard`: ダッシュボードの件数と一覧
//! - `form`: 決裁様式の管理

pub(crate) mod helpers;

pub mod approval;
pub mod dashboard;
pub mod form;

pub use approval::{
    ApprovalDeps,
    ApprovalUseCaseImpl,
    ApprovalView,
    CommentInput,
    DownloadedFile,
    DraftInput,
    ListInput,
    UploadedFile,
};
pub use dashboard::DashboardUseCaseImpl;
pub use form::{CreateFormInput, FormSigner, FormUseCaseImpl, FormView};
