//! # ダッシュボード API ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /internal/dashboard/counts` - 起案文書の件数
//! - `GET /internal/dashboard/submitted` - 起案した新しい文書
//! - `GET /internal/dashboard/pending` - 決裁待ち

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use signflow_domain::approval::DashboardCounts;
use signflow_shared::ApiResponse;

use crate::{
    error::CoreError,
    handler::approval::{ActorQuery, ApprovalSummaryDto, parse_actor},
};

/// ダッシュボードハンドラーの State
pub struct DashboardState {
    pub usecase: crate::usecase::DashboardUseCaseImpl,
}

/// 起案文書の件数を取得する
///
/// ## エンドポイント
/// GET /internal/dashboard/counts?actor_id={actor_id}
#[tracing::instrument(skip_all)]
pub async fn dashboard_counts(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<ActorQuery>,
) -> Result<Response, CoreError> {
    let actor_id = parse_actor(query.actor_id)?;
    let counts: DashboardCounts = state.usecase.dashboard_counts(&actor_id).await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(counts))).into_response())
}

/// 自分が起案した新しい文書を取得する
///
/// ## エンドポイント
/// GET /internal/dashboard/submitted?actor_id={actor_id}
#[tracing::instrument(skip_all)]
pub async fn my_submitted(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<ActorQuery>,
) -> Result<Response, CoreError> {
    let actor_id = parse_actor(query.actor_id)?;
    let summaries = state.usecase.my_submitted(&actor_id).await?;

    let response = ApiResponse::new(
        summaries
            .into_iter()
            .map(ApprovalSummaryDto::from)
            .collect::<Vec<_>>(),
    );
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 自分の決裁待ちを取得する
///
/// ## エンドポイント
/// GET /internal/dashboard/pending?actor_id={actor_id}
#[tracing::instrument(skip_all)]
pub async fn my_pending(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<ActorQuery>,
) -> Result<Response, CoreError> {
    let actor_id = parse_actor(query.actor_id)?;
    let summaries = state.usecase.my_pending(&actor_id).await?;

    let response = ApiResponse::new(
        summaries
            .into_iter()
            .map(ApprovalSummaryDto::from)
            .collect::<Vec<_>>(),
    );
    Ok((StatusCode::OK, Json(response)).into_response())
}
