//! # Core Service エラー定義
//!
//! Core Service 固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! 決裁ルール違反（[`ApprovalError`]）は種別ごとに problem type と HTTP ステータスを割り当てる。
//!
//! | 分類 | ステータス | 種別 |
//! |------|-----------|------|
//! | 権限 | 403 | `NotCurrentSigner`, `NotDrafter`, `NoCommentPermission`, `SignerMismatch`, `NotParticipant` |
//! | 段階・スロット | 409 | `AlreadyActedOrInvalidStage`, `InvalidStage`, `AlreadyProgressed`, 添付スロット系 |
//! | 存在しない添付 | 404 | `InvalidAttachmentSlot` |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use signflow_domain::{DomainError, approval::ApprovalError};
use signflow_infra::{InfraError, error::InfraErrorKind};
use signflow_shared::{ErrorResponse, event_log::error as log_error};
use thiserror::Error;

/// Core Service で発生するエラー
#[derive(Debug, Error)]
pub enum CoreError {
    /// リソースが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// 権限不足
    #[error("権限がありません: {0}")]
    Forbidden(String),

    /// 競合（楽観的ロック失敗）
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// 決裁ルール違反
    #[error(transparent)]
    Approval(#[from] ApprovalError),

    /// 添付ファイルの読み書きに失敗
    #[error("ファイルストレージエラー: {0}")]
    Storage(InfraError),

    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(#[from] InfraError),

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl CoreError {
    /// ストレージ操作の失敗を変換する
    ///
    /// ファイル名の不正は利用者の入力誤りとして 400 にする。
    pub fn from_storage(error: InfraError) -> Self {
        match error.kind() {
            InfraErrorKind::InvalidInput(msg) => Self::BadRequest(msg.clone()),
            _ => Self::Storage(error),
        }
    }
}

impl From<DomainError> for CoreError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Validation(msg) => Self::BadRequest(msg),
            DomainError::NotFound { entity_type, id } => {
                Self::NotFound(format!("{entity_type} が見つかりません: {id}"))
            }
            DomainError::Approval(e) => Self::Approval(e),
        }
    }
}

/// 決裁ルール違反の problem type とステータス
fn approval_problem(error: ApprovalError) -> (&'static str, &'static str, StatusCode) {
    match error {
        ApprovalError::NotCurrentSigner => {
            ("not-current-signer", "Not Current Signer", StatusCode::FORBIDDEN)
        }
        ApprovalError::AlreadyActedOrInvalidStage => {
            ("already-acted", "Already Acted", StatusCode::CONFLICT)
        }
        ApprovalError::NotDrafter => ("not-drafter", "Not Drafter", StatusCode::FORBIDDEN),
        ApprovalError::InvalidStage => ("invalid-stage", "Invalid Stage", StatusCode::CONFLICT),
        ApprovalError::AlreadyProgressed => {
            ("already-progressed", "Already Progressed", StatusCode::CONFLICT)
        }
        ApprovalError::NoCommentPermission => (
            "no-comment-permission",
            "No Comment Permission",
            StatusCode::FORBIDDEN,
        ),
        ApprovalError::SignerMismatch => {
            ("signer-mismatch", "Signer Mismatch", StatusCode::FORBIDDEN)
        }
        ApprovalError::AttachmentSlotsFull => (
            "attachment-slots-full",
            "Attachment Slots Full",
            StatusCode::CONFLICT,
        ),
        ApprovalError::SignerAttachmentExists => (
            "signer-attachment-exists",
            "Signer Attachment Exists",
            StatusCode::CONFLICT,
        ),
        ApprovalError::ReferencerAttachmentExists => (
            "referencer-attachment-exists",
            "Referencer Attachment Exists",
            StatusCode::CONFLICT,
        ),
        ApprovalError::NotParticipant => {
            ("not-participant", "Not Participant", StatusCode::FORBIDDEN)
        }
        ApprovalError::InvalidAttachmentSlot => (
            "invalid-attachment-slot",
            "Invalid Attachment Slot",
            StatusCode::NOT_FOUND,
        ),
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let body = match &self {
            CoreError::NotFound(msg) => ErrorResponse::not_found(msg),
            CoreError::BadRequest(msg) => ErrorResponse::bad_request(msg),
            CoreError::Forbidden(msg) => ErrorResponse::forbidden(msg),
            CoreError::Conflict(msg) => ErrorResponse::conflict(msg),
            CoreError::Approval(e) => {
                let (suffix, title, status) = approval_problem(*e);
                ErrorResponse::new(suffix, title, status.as_u16(), e.to_string())
            }
            CoreError::Storage(e) => {
                tracing::error!(
                    error.category = log_error::category::INFRASTRUCTURE,
                    error.kind = log_error::kind::STORAGE,
                    "ストレージエラー: {}",
                    e
                );
                ErrorResponse::internal_error()
            }
            CoreError::Database(e) => {
                tracing::error!(
                    error.category = log_error::category::INFRASTRUCTURE,
                    error.kind = log_error::kind::DATABASE,
                    "データベースエラー: {}",
                    e
                );
                ErrorResponse::internal_error()
            }
            CoreError::Internal(msg) => {
                tracing::error!(
                    error.category = log_error::category::INFRASTRUCTURE,
                    error.kind = log_error::kind::INTERNAL,
                    "内部エラー: {}",
                    msg
                );
                ErrorResponse::internal_error()
            }
        };

        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    async fn response_parts(error: CoreError) -> (StatusCode, ErrorResponse) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[rstest]
    #[case::現在の決裁者ではない(ApprovalError::NotCurrentSigner, 403, "not-current-signer")]
    #[case::決裁済み(ApprovalError::AlreadyActedOrInvalidStage, 409, "already-acted")]
    #[case::起案者ではない(ApprovalError::NotDrafter, 403, "not-drafter")]
    #[case::段階不正(ApprovalError::InvalidStage, 409, "invalid-stage")]
    #[case::決裁開始済み(ApprovalError::AlreadyProgressed, 409, "already-progressed")]
    #[case::コメント権限なし(ApprovalError::NoCommentPermission, 403, "no-comment-permission")]
    #[case::添付満杯(ApprovalError::AttachmentSlotsFull, 409, "attachment-slots-full")]
    #[case::決裁者添付あり(ApprovalError::SignerAttachmentExists, 409, "signer-attachment-exists")]
    #[case::閲覧権限なし(ApprovalError::NotParticipant, 403, "not-participant")]
    #[case::添付なし(ApprovalError::InvalidAttachmentSlot, 404, "invalid-attachment-slot")]
    #[tokio::test]
    async fn test_決裁ルール違反は種別ごとのステータスとtypeになる(
        #[case] error: ApprovalError,
        #[case] expected_status: u16,
        #[case] expected_suffix: &str,
    ) {
        let (status, body) = response_parts(CoreError::Approval(error)).await;

        assert_eq!(status.as_u16(), expected_status);
        assert_eq!(body.status, expected_status);
        assert_eq!(
            body.error_type,
            format!("https://signflow.example.com/errors/{expected_suffix}")
        );
        assert_eq!(body.detail, error.to_string());
    }

    #[tokio::test]
    async fn test_内部エラーは詳細を隠して500になる() {
        let (status, body) =
            response_parts(CoreError::Internal("接続文字列: secret".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, ErrorResponse::internal_error());
    }

    #[test]
    fn test_ドメインエラーの変換() {
        assert!(matches!(
            CoreError::from(DomainError::Validation("件名は必須です".to_string())),
            CoreError::BadRequest(msg) if msg == "件名は必須です"
        ));
        assert!(matches!(
            CoreError::from(DomainError::Approval(ApprovalError::NotDrafter)),
            CoreError::Approval(ApprovalError::NotDrafter)
        ));
    }

    #[test]
    fn test_from_storage_ファイル名不正はbad_request() {
        let invalid = CoreError::from_storage(InfraError::invalid_input("ファイル名が不正です"));
        let io_failure =
            CoreError::from_storage(InfraError::storage(io::Error::other("disk full")));

        assert!(matches!(invalid, CoreError::BadRequest(_)));
        assert!(matches!(io_failure, CoreError::Storage(_)));
    }
}
