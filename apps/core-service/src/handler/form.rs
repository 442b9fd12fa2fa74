//! # 決裁様式 API ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /internal/forms` - 様式一覧
//! - `POST /internal/forms` - 様式作成
//! - `GET /internal/forms/{form_no}` - 様式取得（決裁者をメンバー情報に解決）
//! - `DELETE /internal/forms/{form_no}` - 様式削除

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use signflow_domain::{
    approval::{ApprovalForm, FormNo},
    value_objects::ReferenceNames,
};
use signflow_shared::ApiResponse;
use uuid::Uuid;

use crate::{
    error::CoreError,
    handler::approval::{ActorQuery, parse_actor, parse_signers},
    usecase::{CreateFormInput, FormSigner, FormUseCaseImpl, FormView},
};

/// 決裁様式ハンドラーの State
pub struct FormState {
    pub usecase: FormUseCaseImpl,
}

// --- リクエスト型 ---

/// 様式作成リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateFormRequest {
    pub actor_id:        String,
    /// 様式の種別（休暇・経費など）
    pub form_type:       String,
    pub title:           String,
    /// 本文のひな形（HTML）
    #[serde(default)]
    pub template:        String,
    /// 既定の決裁者（先頭から最大 5 人）
    #[serde(default)]
    pub signers:         Vec<String>,
    /// 既定の参照者（カンマ区切り）
    #[serde(default)]
    pub reference_names: String,
}

// --- レスポンス型 ---

/// 様式一覧の 1 行
#[derive(Debug, Serialize)]
pub struct FormSummaryDto {
    pub form_no:    String,
    pub form_type:  String,
    pub title:      String,
    pub created_at: String,
}

impl From<&ApprovalForm> for FormSummaryDto {
    fn from(form: &ApprovalForm) -> Self {
        Self {
            form_no:    form.form_no().to_string(),
            form_type:  form.form_type().to_string(),
            title:      form.title().to_string(),
            created_at: form.created_at().to_rfc3339(),
        }
    }
}

/// 様式の既定決裁者
#[derive(Debug, Serialize)]
pub struct FormSignerDto {
    pub slot:       usize,
    pub name:       String,
    /// 該当メンバーがいない場合は `null`
    pub member_id:  Option<String>,
    pub department: Option<String>,
    pub position:   Option<String>,
}

impl From<FormSigner> for FormSignerDto {
    fn from(signer: FormSigner) -> Self {
        let member = signer.member;
        Self {
            slot:       signer.slot,
            name:       signer.name.to_string(),
            member_id:  member.as_ref().map(|m| m.id.to_string()),
            department: member.as_ref().map(|m| m.department.clone()),
            position:   member.map(|m| m.position),
        }
    }
}

/// 様式詳細 DTO
#[derive(Debug, Serialize)]
pub struct FormDetailDto {
    #[serde(flatten)]
    pub summary:         FormSummaryDto,
    pub template:        String,
    pub signers:         Vec<FormSignerDto>,
    pub reference_names: String,
}

impl From<FormView> for FormDetailDto {
    fn from(view: FormView) -> Self {
        Self {
            summary:         FormSummaryDto::from(&view.form),
            template:        view.form.template().to_string(),
            signers:         view.signers.into_iter().map(FormSignerDto::from).collect(),
            reference_names: view.form.references().to_joined(),
        }
    }
}

/// 作成結果
#[derive(Debug, Serialize)]
pub struct CreatedFormDto {
    pub form_no: String,
}

// --- ハンドラ ---

/// 様式一覧を取得する
///
/// ## エンドポイント
/// GET /internal/forms
#[tracing::instrument(skip_all)]
pub async fn list_forms(State(state): State<Arc<FormState>>) -> Result<Response, CoreError> {
    let forms = state.usecase.list_forms().await?;

    let response = ApiResponse::new(forms.iter().map(FormSummaryDto::from).collect::<Vec<_>>());
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 様式を取得する
///
/// ## エンドポイント
/// GET /internal/forms/{form_no}
#[tracing::instrument(skip_all, fields(%form_no))]
pub async fn get_form(
    State(state): State<Arc<FormState>>,
    Path(form_no): Path<Uuid>,
) -> Result<Response, CoreError> {
    let view = state.usecase.get_form(&FormNo::from_uuid(form_no)).await?;

    let response = ApiResponse::new(FormDetailDto::from(view));
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 様式を作成する
///
/// ## エンドポイント
/// POST /internal/forms
#[tracing::instrument(skip_all)]
pub async fn create_form(
    State(state): State<Arc<FormState>>,
    Json(req): Json<CreateFormRequest>,
) -> Result<Response, CoreError> {
    let actor_id = parse_actor(req.actor_id)?;
    let input = CreateFormInput {
        form_type:  req.form_type,
        title:      req.title,
        template:   req.template,
        signers:    parse_signers(req.signers)?,
        references: ReferenceNames::parse(&req.reference_names)?,
    };

    let form_no = state.usecase.create_form(input, &actor_id).await?;

    let response = ApiResponse::new(CreatedFormDto {
        form_no: form_no.to_string(),
    });
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// 様式を削除する
///
/// ## エンドポイント
/// DELETE /internal/forms/{form_no}?actor_id={actor_id}
#[tracing::instrument(skip_all, fields(%form_no))]
pub async fn delete_form(
    State(state): State<Arc<FormState>>,
    Path(form_no): Path<Uuid>,
    Query(query): Query<ActorQuery>,
) -> Result<Response, CoreError> {
    let actor_id = parse_actor(query.actor_id)?;
    state
        .usecase
        .delete_form(&FormNo::from_uuid(form_no), &actor_id)
        .await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
