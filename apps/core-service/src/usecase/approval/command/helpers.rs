//! 決裁コマンド共通のヘルパー関数
//!
//! 永続化ボイラープレート（トランザクション操作、version check 付き更新）と
//! 添付ファイルの保存・後片付けを共通化する。

use chrono::{DateTime, Utc};
use signflow_domain::{
    approval::{ApprovalDetail, ApprovalDocument, ApprovalError, ApprovalNo, Attachment},
    value_objects::Version,
};
use signflow_infra::{
    db::TxContext,
    error::InfraErrorKind,
    storage::StorageArea,
};

use super::super::{ApprovalUseCaseImpl, UploadedFile};
use crate::{error::CoreError, usecase::helpers::FindResultExt};

/// 決裁・却下の保存時に競合した場合の変換
///
/// 並行して同じスロットを決裁した側が先にコミットしているため、
/// 汎用の競合ではなく「決裁済み」として返す。
pub(super) fn stale_decision(error: CoreError) -> CoreError {
    match error {
        CoreError::Conflict(_) => ApprovalError::AlreadyActedOrInvalidStage.into(),
        other => other,
    }
}

impl ApprovalUseCaseImpl {
    /// トランザクションを開始する
    pub(super) async fn begin_tx(&self) -> Result<TxContext, CoreError> {
        self.deps
            .tx_manager
            .begin()
            .await
            .map_err(|e| CoreError::Internal(format!("トランザクション開始に失敗: {}", e)))
    }

    /// トランザクションをコミットする
    pub(super) async fn commit_tx(&self, tx: TxContext) -> Result<(), CoreError> {
        tx.commit()
            .await
            .map_err(|e| CoreError::Internal(format!("トランザクションコミットに失敗: {}", e)))
    }

    pub(in crate::usecase::approval) async fn load_document(
        &self,
        approval_no: &ApprovalNo,
    ) -> Result<ApprovalDocument, CoreError> {
        self.deps
            .document_repo
            .find_by_no(approval_no)
            .await
            .or_not_found("決裁文書")
    }

    pub(in crate::usecase::approval) async fn load_detail(
        &self,
        approval_no: &ApprovalNo,
    ) -> Result<ApprovalDetail, CoreError> {
        self.deps
            .detail_repo
            .find_by_no(approval_no)
            .await
            .or_not_found("決裁文書の本文")
    }

    /// 決裁文書を version check 付きで更新する
    pub(super) async fn save_document(
        &self,
        tx: &mut TxContext,
        document: &ApprovalDocument,
        expected_version: Version,
    ) -> Result<(), CoreError> {
        self.deps
            .document_repo
            .update_with_version_check(tx, document, expected_version)
            .await
            .map_err(|e| match e.kind() {
                InfraErrorKind::Conflict { .. } => CoreError::Conflict(
                    "決裁文書は既に更新されています。最新の情報を取得してください。".to_string(),
                ),
                _ => CoreError::Internal(format!("決裁文書の保存に失敗: {}", e)),
            })
    }

    /// 本文を version check 付きで更新する
    pub(super) async fn save_detail(
        &self,
        tx: &mut TxContext,
        detail: &ApprovalDetail,
        expected_version: Version,
    ) -> Result<(), CoreError> {
        self.deps
            .detail_repo
            .update_with_version_check(tx, detail, expected_version)
            .await
            .map_err(|e| match e.kind() {
                InfraErrorKind::Conflict { .. } => CoreError::Conflict(
                    "本文は既に更新されています。最新の情報を取得してください。".to_string(),
                ),
                _ => CoreError::Internal(format!("本文の保存に失敗: {}", e)),
            })
    }

    /// 添付ファイルをすべて保存する
    ///
    /// 途中で失敗した場合は、それまでに保存したファイルを削除してからエラーを返す。
    /// `info` は空のまま返すので、呼び出し側で役割に応じたラベルを設定する。
    pub(super) async fn store_files(
        &self,
        area: StorageArea,
        files: Vec<UploadedFile>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Attachment>, CoreError> {
        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            match self
                .deps
                .storage
                .store(area, &file.file_name, file.content, now)
                .await
            {
                Ok(saved) => stored.push(Attachment {
                    path:      saved.path,
                    file_name: saved.file_name,
                    info:      String::new(),
                }),
                Err(e) => {
                    self.discard_files(&stored).await;
                    return Err(CoreError::from_storage(e));
                }
            }
        }
        Ok(stored)
    }

    /// 保存済みファイルを削除する（ベストエフォート）
    ///
    /// 失敗しても警告ログを出して続行する。
    pub(super) async fn discard_files(&self, attachments: &[Attachment]) {
        for attachment in attachments {
            if let Err(e) = self.deps.storage.delete(&attachment.path).await {
                tracing::warn!(
                    path = %attachment.path,
                    error = %e,
                    "添付ファイルの削除に失敗しました"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_decision_競合は決裁済みに変換する() {
        let converted = stale_decision(CoreError::Conflict("競合".to_string()));

        assert!(matches!(
            converted,
            CoreError::Approval(ApprovalError::AlreadyActedOrInvalidStage)
        ));
    }

    #[test]
    fn test_stale_decision_競合以外はそのまま返す() {
        let converted = stale_decision(CoreError::Internal("接続失敗".to_string()));

        assert!(matches!(converted, CoreError::Internal(_)));
    }
}
