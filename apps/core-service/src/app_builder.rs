//! # Core Service アプリケーション構築
//!
//! ハンドラの State を受け取り、ルーターとレイヤーを組み立てる。
//! `main.rs` はインフラ初期化とサーバー起動に集中する。

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use signflow_shared::observability::{MakeRequestUuidV7, make_request_span};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::handler::{
    ApprovalApiState,
    DashboardState,
    FormState,
    ReadinessState,
    add_comment,
    approve,
    cancel,
    create_form,
    dashboard_counts,
    delete_approval,
    delete_attachment,
    delete_comment,
    delete_form,
    download_attachment,
    get_approval,
    get_form,
    health_check,
    list_approvals,
    list_forms,
    my_pending,
    my_submitted,
    readiness_check,
    reject,
    save_temporary,
    submit_draft,
    update_comment,
};

/// リクエストボディの上限（添付ファイルを base64 で受け取るため既定値より大きくする）
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// ルーターに渡す State 一式
pub struct AppStates {
    pub approval:  Arc<ApprovalApiState>,
    pub form:      Arc<FormState>,
    pub dashboard: Arc<DashboardState>,
    /// `None` の場合は `/health/ready` を公開しない
    pub readiness: Option<Arc<ReadinessState>>,
}

/// ルーターを構築する
pub fn build_app(states: AppStates) -> Router {
    let approval = Router::new()
        .route("/internal/approvals", get(list_approvals))
        .route("/internal/approvals/submit", post(submit_draft))
        .route("/internal/approvals/temporary", post(save_temporary))
        .route(
            "/internal/approvals/{no}",
            get(get_approval).delete(delete_approval),
        )
        .route("/internal/approvals/{no}/approve", post(approve))
        .route("/internal/approvals/{no}/reject", post(reject))
        .route("/internal/approvals/{no}/cancel", post(cancel))
        .route(
            "/internal/approvals/{no}/comment",
            post(add_comment).put(update_comment).delete(delete_comment),
        )
        .route(
            "/internal/approvals/{no}/attachments/{slot}",
            get(download_attachment).delete(delete_attachment),
        )
        .with_state(states.approval);

    let form = Router::new()
        .route("/internal/forms", get(list_forms).post(create_form))
        .route(
            "/internal/forms/{form_no}",
            get(get_form).delete(delete_form),
        )
        .with_state(states.form);

    let dashboard = Router::new()
        .route("/internal/dashboard/counts", get(dashboard_counts))
        .route("/internal/dashboard/submitted", get(my_submitted))
        .route("/internal/dashboard/pending", get(my_pending))
        .with_state(states.dashboard);

    let mut app = Router::new()
        .route("/health", get(health_check))
        .merge(approval)
        .merge(form)
        .merge(dashboard);
    if let Some(readiness) = states.readiness {
        app = app.merge(
            Router::new()
                .route("/health/ready", get(readiness_check))
                .with_state(readiness),
        );
    }

    app.layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}
