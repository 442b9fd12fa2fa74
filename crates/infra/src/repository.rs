//! # リポジトリ実装
//!
//! 決裁ドメインのエンティティを PostgreSQL に永続化するリポジトリ群。
//!
//! ## 設計方針
//!
//! - **トレイト + PostgreSQL 実装**: ユースケース層はトレイト経由で利用し、テストではモックに差し替える
//! - **書き込みはトランザクション内**: `insert` / `update_with_version_check` / `delete` は `TxContext` を受け取る
//! - **楽観的ロック**: 更新は `version` 一致を条件にする

pub mod approval_detail_repository;
pub mod approval_document_repository;
pub mod approval_form_repository;
pub mod member_repository;

pub use approval_detail_repository::{
    ApprovalDetailRepository,
    PostgresApprovalDetailRepository,
};
pub use approval_document_repository::{
    ApprovalDocumentRepository,
    PostgresApprovalDocumentRepository,
};
pub use approval_form_repository::{ApprovalFormRepository, PostgresApprovalFormRepository};
pub use member_repository::{MemberRepository, PostgresMemberRepository};
