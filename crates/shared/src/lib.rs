//! # SignFlow 共有ユーティリティ
//!
//! サービス層から共通で利用するレスポンス型とロギング基盤を提供する。
//!
//! ## 設計方針
//!
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - axum には依存しない（`IntoResponse` 変換はサービス側の責務）
//! - トレーシング初期化は `observability` feature で有効化する

pub mod api_response;
pub mod error_response;
pub mod event_log;
pub mod health;
pub mod observability;
pub mod paged_response;

pub use api_response::ApiResponse;
pub use error_response::ErrorResponse;
pub use health::HealthResponse;
pub use paged_response::PagedResponse;
