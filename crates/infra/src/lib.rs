//! # SignFlow インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理とトランザクション
//! - **リポジトリ実装**: 決裁文書・本文・様式・メンバーの永続化
//! - **ファイルストレージ**: 添付ファイルの保存・読み込み・削除
//!
//! ## 依存関係
//!
//! ```text
//! core-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL データベース接続管理
//! - [`error`] - インフラ層エラー定義
//! - [`repository`] - リポジトリ実装
//! - [`storage`] - 添付ファイルストレージ
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use signflow_infra::{db, repository::PostgresApprovalDocumentRepository};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::create_pool("postgres://localhost/signflow", 10).await?;
//!     db::run_migrations(&pool).await?;
//!     let documents = PostgresApprovalDocumentRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod repository;
pub mod storage;

pub use error::InfraError;
