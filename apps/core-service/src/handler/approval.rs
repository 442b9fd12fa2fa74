//! # 決裁 API ハンドラ
//!
//! 決裁文書の起案・決裁・コメント・閲覧・一覧の内部 API。
//! 操作者は認証済みのゲートウェイが `actor_id` として明示的に渡す
//! （状態変更はボディ、参照はクエリ）。
//!
//! ## エンドポイント
//!
//! - `POST /internal/approvals/submit` - 提出
//! - `POST /internal/approvals/temporary` - 一時保存
//! - `GET /internal/approvals` - 進捗ビューの一覧
//! - `GET /internal/approvals/{no}` - 閲覧
//! - `DELETE /internal/approvals/{no}` - 削除
//! - `POST /internal/approvals/{no}/approve` - 決裁
//! - `POST /internal/approvals/{no}/reject` - 却下
//! - `POST /internal/approvals/{no}/cancel` - 上申取り消し
//! - `POST|PUT|DELETE /internal/approvals/{no}/comment` - コメント
//! - `GET|DELETE /internal/approvals/{no}/attachments/{slot}` - 添付のダウンロード・削除

mod command;
mod query;

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, NaiveDate, Utc};
pub use command::{
    add_comment,
    approve,
    cancel,
    delete_approval,
    delete_attachment,
    delete_comment,
    reject,
    save_temporary,
    submit_draft,
    update_comment,
};
pub use query::{download_attachment, get_approval, list_approvals};
use serde::{Deserialize, Serialize};
use signflow_domain::{
    approval::{
        ApprovalDetail,
        ApprovalDocument,
        ApprovalSummary,
        Attachment,
        AttachmentSlot,
        MAX_SIGNERS,
        SignerNames,
    },
    member::MemberId,
    value_objects::MemberName,
};
use uuid::Uuid;

use crate::{
    error::CoreError,
    usecase::{ApprovalUseCaseImpl, ApprovalView, UploadedFile},
};

/// 決裁 API の共有状態
pub struct ApprovalApiState {
    pub usecase: ApprovalUseCaseImpl,
}

// --- リクエスト型 ---

/// 添付ファイル
#[derive(Debug, Deserialize)]
pub struct AttachmentPayload {
    /// アップロード時のファイル名
    pub file_name:      String,
    /// ファイル内容（base64）
    pub content_base64: String,
}

/// 提出・一時保存リクエスト
#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    /// 操作者（起案者）のメンバー ID
    pub actor_id:        String,
    /// 既存文書を編集する場合の文書番号
    pub approval_no:     Option<Uuid>,
    /// 決裁様式番号
    pub form_no:         Uuid,
    pub title:           String,
    /// 本文（HTML）
    #[serde(default)]
    pub body:            String,
    /// 決裁者の表示名（先頭から最大 5 人、空文字は空きスロット）
    #[serde(default)]
    pub signers:         Vec<String>,
    /// 参照者の表示名（カンマ区切り）
    #[serde(default)]
    pub reference_names: String,
    #[serde(default)]
    pub attachments:     Vec<AttachmentPayload>,
}

/// 操作者だけを渡すリクエスト（決裁・却下・取り消し・コメント削除）
#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub actor_id: String,
}

/// 操作者指定クエリパラメータ（GET / DELETE 用）
#[derive(Debug, Deserialize)]
pub struct ActorQuery {
    pub actor_id: String,
}

/// コメント追加・修正リクエスト
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub actor_id:   String,
    pub text:       String,
    /// 追加時のみ有効（修正時は無視する）
    pub attachment: Option<AttachmentPayload>,
}

fn default_view() -> String {
    "all".to_string()
}

/// 一覧クエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub actor_id: String,
    /// `all` / `in-progress` / `draft` / `rejected` / `completed`
    #[serde(default = "default_view")]
    pub view:     String,
    /// 登録日の下限（YYYY-MM-DD）
    pub from:     Option<NaiveDate>,
    /// 登録日の上限（YYYY-MM-DD）
    pub to:       Option<NaiveDate>,
    pub keyword:  Option<String>,
    /// 0 始まりのページ番号
    #[serde(default)]
    pub page:     usize,
}

/// 文書番号と添付スロットのパスパラメータ
#[derive(Debug, Deserialize)]
pub struct AttachmentPathParams {
    pub no:   Uuid,
    /// `drafter1`〜`drafter5` / `signer` / `referencer`
    pub slot: String,
}

// --- リクエスト変換 ---

pub(crate) fn parse_actor(raw: String) -> Result<MemberId, CoreError> {
    Ok(MemberId::new(raw)?)
}

/// 決裁者の指定を 5 スロットに並べる
///
/// 空文字は空きスロットとして扱う。6 人以上は `BadRequest`。
pub(crate) fn parse_signers(raw: Vec<String>) -> Result<SignerNames, CoreError> {
    if raw.len() > MAX_SIGNERS {
        return Err(CoreError::BadRequest(format!(
            "決裁者は {} 人までです",
            MAX_SIGNERS
        )));
    }
    let mut names = SignerNames::default();
    for (slot, name) in names.iter_mut().zip(raw) {
        *slot = MemberName::new_optional(Some(name))?;
    }
    Ok(names)
}

fn decode_attachment(payload: AttachmentPayload) -> Result<UploadedFile, CoreError> {
    let content = STANDARD.decode(payload.content_base64.as_bytes()).map_err(|_| {
        CoreError::BadRequest(format!(
            "添付ファイルの内容が不正です: {}",
            payload.file_name
        ))
    })?;
    Ok(UploadedFile {
        file_name: payload.file_name,
        content:   content.into(),
    })
}

fn decode_attachments(payloads: Vec<AttachmentPayload>) -> Result<Vec<UploadedFile>, CoreError> {
    payloads.into_iter().map(decode_attachment).collect()
}

// --- レスポンス型 ---

/// 提出・一時保存の結果
#[derive(Debug, Serialize)]
pub struct DraftResultDto {
    pub approval_no: String,
}

/// 決裁ラインの 1 スロット
#[derive(Debug, Serialize)]
pub struct SignerSlotDto {
    pub name:     Option<String>,
    pub acted_at: Option<String>,
    pub remark:   Option<String>,
}

/// 起案者
#[derive(Debug, Serialize)]
pub struct DrafterDto {
    pub id:         String,
    pub name:       String,
    pub department: String,
    pub position:   String,
}

/// 決裁文書 DTO
#[derive(Debug, Serialize)]
pub struct ApprovalDocumentDto {
    pub approval_no:     String,
    pub status:          String,
    pub status_label:    String,
    pub drafter:         DrafterDto,
    pub signers:         Vec<SignerSlotDto>,
    pub reference_names: String,
    pub next_signer:     Option<String>,
    pub current_signer:  Option<String>,
    pub version:         i32,
    pub reg_date:        String,
    pub update_date:     String,
    pub updated_by:      String,
    pub start_date:      Option<String>,
    pub end_date:        Option<String>,
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

impl From<&ApprovalDocument> for ApprovalDocumentDto {
    fn from(document: &ApprovalDocument) -> Self {
        let drafter = document.drafter();
        Self {
            approval_no:     document.approval_no().to_string(),
            status:          document.status().as_str().to_string(),
            status_label:    document.status().label().to_string(),
            drafter:         DrafterDto {
                id:         drafter.id.to_string(),
                name:       drafter.name.to_string(),
                department: drafter.department.clone(),
                position:   drafter.position.clone(),
            },
            signers:         document
                .signers()
                .slots()
                .iter()
                .map(|slot| SignerSlotDto {
                    name:     slot.name().map(ToString::to_string),
                    acted_at: slot.acted_at().map(rfc3339),
                    remark:   slot.remark().map(str::to_string),
                })
                .collect(),
            reference_names: document.references().to_joined(),
            next_signer:     document.next_signer().map(ToString::to_string),
            current_signer:  document.current_signer().map(ToString::to_string),
            version:         document.version().as_i32(),
            reg_date:        rfc3339(document.created_at()),
            update_date:     rfc3339(document.updated_at()),
            updated_by:      document.updated_by().to_string(),
            start_date:      document.started_at().map(rfc3339),
            end_date:        document.ended_at().map(rfc3339),
        }
    }
}

/// 添付 DTO
#[derive(Debug, Serialize)]
pub struct AttachmentDto {
    /// ダウンロード時に指定するスロット名
    pub slot:      String,
    pub file_name: String,
    pub info:      String,
}

impl AttachmentDto {
    fn new(slot: AttachmentSlot, attachment: &Attachment) -> Self {
        Self {
            slot:      slot.to_string(),
            file_name: attachment.original_name().to_string(),
            info:      attachment.info.clone(),
        }
    }
}

fn attachment_dtos(detail: &ApprovalDetail) -> Vec<AttachmentDto> {
    let drafter = detail
        .drafter_attachments()
        .iter()
        .enumerate()
        .filter_map(|(index, a)| a.as_ref().map(|a| (AttachmentSlot::Drafter(index), a)));
    let others = [
        (AttachmentSlot::Signer, detail.signer_attachment()),
        (AttachmentSlot::Referencer, detail.referencer_attachment()),
    ]
    .into_iter()
    .filter_map(|(slot, a)| a.map(|a| (slot, a)));

    drafter
        .chain(others)
        .map(|(slot, a)| AttachmentDto::new(slot, a))
        .collect()
}

/// 文書閲覧 DTO
#[derive(Debug, Serialize)]
pub struct ApprovalViewDto {
    #[serde(flatten)]
    pub document:         ApprovalDocumentDto,
    pub form_no:          String,
    pub form_type:        String,
    /// 様式が削除済みの場合は `null`
    pub form_title:       Option<String>,
    pub title:            String,
    pub body:             String,
    pub drafter_remark:   Option<String>,
    pub reference_remark: Option<String>,
    pub attachments:      Vec<AttachmentDto>,
}

impl From<ApprovalView> for ApprovalViewDto {
    fn from(view: ApprovalView) -> Self {
        let detail = &view.detail;
        Self {
            document:         ApprovalDocumentDto::from(&view.document),
            form_no:          detail.form_no().to_string(),
            form_type:        detail.form_type().to_string(),
            form_title:       view.form_title,
            title:            detail.title().to_string(),
            body:             detail.body().to_string(),
            drafter_remark:   detail.drafter_remark().map(str::to_string),
            reference_remark: detail.reference_remark().map(str::to_string),
            attachments:      attachment_dtos(detail),
        }
    }
}

/// 一覧・ダッシュボードの 1 行
#[derive(Debug, Serialize)]
pub struct ApprovalSummaryDto {
    pub approval_no:        String,
    pub reg_date:           String,
    pub title:              String,
    pub form_type:          String,
    pub drafter_department: String,
    pub drafter_name:       String,
    pub current_signer:     Option<String>,
    pub status:             String,
    pub status_label:       String,
}

impl From<ApprovalSummary> for ApprovalSummaryDto {
    fn from(summary: ApprovalSummary) -> Self {
        Self {
            approval_no:        summary.approval_no.to_string(),
            reg_date:           rfc3339(summary.reg_date),
            title:              summary.title,
            form_type:          summary.form_type.to_string(),
            drafter_department: summary.drafter_department,
            drafter_name:       summary.drafter_name.to_string(),
            current_signer:     summary.current_signer.map(|n| n.to_string()),
            status:             summary.status.as_str().to_string(),
            status_label:       summary.status.label().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_parse_signers_空文字は空きスロットになる() {
        let names = parse_signers(vec!["Alice".to_string(), " ".to_string()]).unwrap();

        assert_eq!(names[0].as_ref().map(MemberName::as_str), Some("Alice"));
        assert_eq!(names[1], None);
    }

    #[test]
    fn test_parse_signers_6人以上はbad_request() {
        let raw = (0..6).map(|n| format!("signer{n}")).collect();

        let result = parse_signers(raw);

        assert!(matches!(result, Err(CoreError::BadRequest(_))));
    }

    #[rstest]
    #[case::正しいbase64("aGVsbG8=", true)]
    #[case::不正なbase64("***", false)]
    fn test_decode_attachment_base64を復号する(#[case] content: &str, #[case] ok: bool) {
        let result = decode_attachment(AttachmentPayload {
            file_name:      "a.txt".to_string(),
            content_base64: content.to_string(),
        });

        match result {
            Ok(file) => {
                assert!(ok);
                assert_eq!(file.content.as_ref(), b"hello");
            }
            Err(e) => {
                assert!(!ok);
                assert!(matches!(e, CoreError::BadRequest(_)));
            }
        }
    }

    #[test]
    fn test_list_queryのviewは省略時all() {
        let query: ListQuery = serde_json::from_value(serde_json::json!({
            "actor_id": "dana",
            "from": "2026-04-01"
        }))
        .unwrap();

        assert_eq!(query.view, "all");
        assert_eq!(query.page, 0);
        assert_eq!(query.from, NaiveDate::from_ymd_opt(2026, 4, 1));
    }
}
