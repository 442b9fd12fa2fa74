//! 決裁ハンドラの状態変更操作

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use signflow_domain::{
    approval::{ApprovalNo, AttachmentSlot, FormNo},
    value_objects::ReferenceNames,
};
use signflow_shared::ApiResponse;
use uuid::Uuid;

use super::{
    ActorQuery,
    ActorRequest,
    ApprovalApiState,
    ApprovalDocumentDto,
    AttachmentPathParams,
    CommentRequest,
    DraftRequest,
    DraftResultDto,
    decode_attachment,
    decode_attachments,
    parse_actor,
    parse_signers,
};
use crate::{
    error::CoreError,
    usecase::{CommentInput, DraftInput},
};

fn draft_input(req: DraftRequest) -> Result<DraftInput, CoreError> {
    Ok(DraftInput {
        actor_id:    parse_actor(req.actor_id)?,
        approval_no: req.approval_no.map(ApprovalNo::from_uuid),
        form_no:     FormNo::from_uuid(req.form_no),
        title:       req.title,
        body:        req.body,
        signers:     parse_signers(req.signers)?,
        references:  ReferenceNames::parse(&req.reference_names)?,
        attachments: decode_attachments(req.attachments)?,
    })
}

/// 決裁文書を提出する
///
/// `approval_no` を指定すると既存の下書き（または決裁開始前の文書）を再提出する。
///
/// ## エンドポイント
/// POST /internal/approvals/submit
#[tracing::instrument(skip_all)]
pub async fn submit_draft(
    State(state): State<Arc<ApprovalApiState>>,
    Json(req): Json<DraftRequest>,
) -> Result<Response, CoreError> {
    let approval_no = state.usecase.submit_draft(draft_input(req)?).await?;

    let response = ApiResponse::new(DraftResultDto {
        approval_no: approval_no.to_string(),
    });
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// 決裁文書を一時保存する
///
/// ## エンドポイント
/// POST /internal/approvals/temporary
#[tracing::instrument(skip_all)]
pub async fn save_temporary(
    State(state): State<Arc<ApprovalApiState>>,
    Json(req): Json<DraftRequest>,
) -> Result<Response, CoreError> {
    let approval_no = state.usecase.save_temporary(draft_input(req)?).await?;

    let response = ApiResponse::new(DraftResultDto {
        approval_no: approval_no.to_string(),
    });
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 決裁する
///
/// ## エンドポイント
/// POST /internal/approvals/{no}/approve
#[tracing::instrument(skip_all, fields(%no))]
pub async fn approve(
    State(state): State<Arc<ApprovalApiState>>,
    Path(no): Path<Uuid>,
    Json(req): Json<ActorRequest>,
) -> Result<Response, CoreError> {
    let actor_id = parse_actor(req.actor_id)?;
    let document = state
        .usecase
        .approve(&actor_id, &ApprovalNo::from_uuid(no))
        .await?;

    let response = ApiResponse::new(ApprovalDocumentDto::from(&document));
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 却下する
///
/// ## エンドポイント
/// POST /internal/approvals/{no}/reject
#[tracing::instrument(skip_all, fields(%no))]
pub async fn reject(
    State(state): State<Arc<ApprovalApiState>>,
    Path(no): Path<Uuid>,
    Json(req): Json<ActorRequest>,
) -> Result<Response, CoreError> {
    let actor_id = parse_actor(req.actor_id)?;
    let document = state
        .usecase
        .reject(&actor_id, &ApprovalNo::from_uuid(no))
        .await?;

    let response = ApiResponse::new(ApprovalDocumentDto::from(&document));
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 上申を取り消して下書きに戻す
///
/// ## エンドポイント
/// POST /internal/approvals/{no}/cancel
#[tracing::instrument(skip_all, fields(%no))]
pub async fn cancel(
    State(state): State<Arc<ApprovalApiState>>,
    Path(no): Path<Uuid>,
    Json(req): Json<ActorRequest>,
) -> Result<Response, CoreError> {
    let actor_id = parse_actor(req.actor_id)?;
    let document = state
        .usecase
        .cancel(&actor_id, &ApprovalNo::from_uuid(no))
        .await?;

    let response = ApiResponse::new(ApprovalDocumentDto::from(&document));
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// コメントを追加する
///
/// ## エンドポイント
/// POST /internal/approvals/{no}/comment
#[tracing::instrument(skip_all, fields(%no))]
pub async fn add_comment(
    State(state): State<Arc<ApprovalApiState>>,
    Path(no): Path<Uuid>,
    Json(req): Json<CommentRequest>,
) -> Result<Response, CoreError> {
    let input = CommentInput {
        actor_id:    parse_actor(req.actor_id)?,
        approval_no: ApprovalNo::from_uuid(no),
        text:        req.text,
        attachment:  req.attachment.map(decode_attachment).transpose()?,
    };
    state.usecase.add_comment(input).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// コメントを修正する
///
/// 添付ファイルは変更しない。
///
/// ## エンドポイント
/// PUT /internal/approvals/{no}/comment
#[tracing::instrument(skip_all, fields(%no))]
pub async fn update_comment(
    State(state): State<Arc<ApprovalApiState>>,
    Path(no): Path<Uuid>,
    Json(req): Json<CommentRequest>,
) -> Result<Response, CoreError> {
    let input = CommentInput {
        actor_id:    parse_actor(req.actor_id)?,
        approval_no: ApprovalNo::from_uuid(no),
        text:        req.text,
        attachment:  None,
    };
    state.usecase.update_comment(input).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// コメントと、そのコメントに付けた添付ファイルを削除する
///
/// ## エンドポイント
/// DELETE /internal/approvals/{no}/comment?actor_id={actor_id}
#[tracing::instrument(skip_all, fields(%no))]
pub async fn delete_comment(
    State(state): State<Arc<ApprovalApiState>>,
    Path(no): Path<Uuid>,
    Query(query): Query<ActorQuery>,
) -> Result<Response, CoreError> {
    let actor_id = parse_actor(query.actor_id)?;
    state
        .usecase
        .delete_comment(&actor_id, &ApprovalNo::from_uuid(no))
        .await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// 起案者の添付ファイルを削除する
///
/// ## エンドポイント
/// DELETE /internal/approvals/{no}/attachments/{slot}?actor_id={actor_id}
#[tracing::instrument(skip_all, fields(no = %params.no, slot = %params.slot))]
pub async fn delete_attachment(
    State(state): State<Arc<ApprovalApiState>>,
    Path(params): Path<AttachmentPathParams>,
    Query(query): Query<ActorQuery>,
) -> Result<Response, CoreError> {
    let actor_id = parse_actor(query.actor_id)?;
    let slot: AttachmentSlot = params.slot.parse()?;
    state
        .usecase
        .delete_attachment(&actor_id, &ApprovalNo::from_uuid(params.no), slot)
        .await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// 決裁文書を削除する
///
/// ## エンドポイント
/// DELETE /internal/approvals/{no}?actor_id={actor_id}
#[tracing::instrument(skip_all, fields(%no))]
pub async fn delete_approval(
    State(state): State<Arc<ApprovalApiState>>,
    Path(no): Path<Uuid>,
    Query(query): Query<ActorQuery>,
) -> Result<Response, CoreError> {
    let actor_id = parse_actor(query.actor_id)?;
    state
        .usecase
        .delete_approval(&actor_id, &ApprovalNo::from_uuid(no))
        .await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
