//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケース層に委譲

pub mod approval;
pub mod dashboard;
pub mod form;
pub mod health;

pub use approval::{
    ApprovalApiState,
    add_comment,
    approve,
    cancel,
    delete_approval,
    delete_attachment,
    delete_comment,
    download_attachment,
    get_approval,
    list_approvals,
    reject,
    save_temporary,
    submit_draft,
    update_comment,
};
pub use dashboard::{DashboardState, dashboard_counts, my_pending, my_submitted};
pub use form::{FormState, create_form, delete_form, get_form, list_forms};
pub use health::{ReadinessState, health_check, readiness_check};
