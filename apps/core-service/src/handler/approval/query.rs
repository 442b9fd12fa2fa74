//! 決裁ハンドラの参照操作

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use signflow_domain::approval::{ApprovalNo, AttachmentSlot, ProgressView};
use signflow_shared::{ApiResponse, PagedResponse};
use uuid::Uuid;

use super::{
    ActorQuery,
    ApprovalApiState,
    ApprovalSummaryDto,
    ApprovalViewDto,
    AttachmentPathParams,
    ListQuery,
    parse_actor,
};
use crate::{error::CoreError, usecase::ListInput};

/// 決裁文書を取得する
///
/// ## エンドポイント
/// GET /internal/approvals/{no}?actor_id={actor_id}
#[tracing::instrument(skip_all, fields(%no))]
pub async fn get_approval(
    State(state): State<Arc<ApprovalApiState>>,
    Path(no): Path<Uuid>,
    Query(query): Query<ActorQuery>,
) -> Result<Response, CoreError> {
    let actor_id = parse_actor(query.actor_id)?;
    let view = state
        .usecase
        .get_approval(&actor_id, &ApprovalNo::from_uuid(no))
        .await?;

    let response = ApiResponse::new(ApprovalViewDto::from(view));
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 進捗ビューの一覧を取得する
///
/// ## エンドポイント
/// GET /internal/approvals?actor_id={actor_id}&view={view}&from=&to=&keyword=&page=
#[tracing::instrument(skip_all, fields(view = %query.view))]
pub async fn list_approvals(
    State(state): State<Arc<ApprovalApiState>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, CoreError> {
    let view: ProgressView = query.view.parse()?;
    let input = ListInput {
        actor_id: parse_actor(query.actor_id)?,
        view,
        from: query.from,
        to: query.to,
        keyword: query.keyword.filter(|k| !k.trim().is_empty()),
        page: query.page,
    };

    let page = state.usecase.list_approvals(input).await?;

    let response = PagedResponse {
        data:  page
            .items
            .into_iter()
            .map(ApprovalSummaryDto::from)
            .collect(),
        page:  page.page,
        size:  page.size,
        total: page.total,
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 添付ファイルをダウンロードする
///
/// アップロード時のファイル名を `Content-Disposition` に設定して内容をそのまま返す。
///
/// ## エンドポイント
/// GET /internal/approvals/{no}/attachments/{slot}?actor_id={actor_id}
#[tracing::instrument(skip_all, fields(no = %params.no, slot = %params.slot))]
pub async fn download_attachment(
    State(state): State<Arc<ApprovalApiState>>,
    Path(params): Path<AttachmentPathParams>,
    Query(query): Query<ActorQuery>,
) -> Result<Response, CoreError> {
    let actor_id = parse_actor(query.actor_id)?;
    let slot: AttachmentSlot = params.slot.parse()?;
    let file = state
        .usecase
        .download_attachment(&actor_id, &ApprovalNo::from_uuid(params.no), slot)
        .await?;

    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(&file.file_name)
    );
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.content,
    )
        .into_response())
}
