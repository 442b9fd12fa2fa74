//! 決裁ユースケースの参照操作

use signflow_domain::{
    approval::{
        self,
        ApprovalDetail,
        ApprovalDocument,
        ApprovalError,
        ApprovalNo,
        ApprovalStatus,
        ApprovalSummary,
        AttachmentSlot,
        ListFilter,
        Page,
        Role,
    },
    member::{Actor, MemberId},
};

use super::{ApprovalUseCaseImpl, ApprovalView, DownloadedFile, ListInput};
use crate::{
    error::CoreError,
    usecase::helpers::{attach_details, resolve_actor},
};

/// 文書を閲覧できるか確認する
///
/// 関係者（起案者・決裁者・参照者）のみ閲覧できる。下書きは起案者本人に限る。
fn ensure_readable(document: &ApprovalDocument, actor: &Actor) -> Result<(), ApprovalError> {
    if !Role::resolve(document, actor).is_participant() {
        return Err(ApprovalError::NotParticipant);
    }
    if document.status() == ApprovalStatus::Draft && !document.is_drafted_by(&actor.id) {
        return Err(ApprovalError::NotParticipant);
    }
    Ok(())
}

impl ApprovalUseCaseImpl {
    /// 文書と本文を取得する
    ///
    /// 様式が削除されていても文書は閲覧できる（様式名は `None`）。
    #[tracing::instrument(skip_all, fields(%actor_id, %approval_no))]
    pub async fn get_approval(
        &self,
        actor_id: &MemberId,
        approval_no: &ApprovalNo,
    ) -> Result<ApprovalView, CoreError> {
        let (document, detail) = self.load_readable(actor_id, approval_no).await?;

        let form_title = self
            .deps
            .form_repo
            .find_by_no(detail.form_no())
            .await
            .map_err(|e| CoreError::Internal(format!("決裁様式の取得に失敗: {}", e)))?
            .map(|form| form.title().to_string());
        let current_signer = document.current_signer().cloned();

        Ok(ApprovalView {
            document,
            detail,
            form_title,
            current_signer,
        })
    }

    /// 添付ファイルをダウンロードする
    #[tracing::instrument(skip_all, fields(%actor_id, %approval_no, %slot))]
    pub async fn download_attachment(
        &self,
        actor_id: &MemberId,
        approval_no: &ApprovalNo,
        slot: AttachmentSlot,
    ) -> Result<DownloadedFile, CoreError> {
        let (_, detail) = self.load_readable(actor_id, approval_no).await?;
        let attachment = detail
            .attachment(slot)
            .ok_or(ApprovalError::InvalidAttachmentSlot)?;

        let content = self
            .deps
            .storage
            .load(&attachment.path)
            .await
            .map_err(CoreError::from_storage)?;

        Ok(DownloadedFile {
            file_name: attachment.original_name().to_string(),
            content,
        })
    }

    /// 進捗ビューの一覧を取得する
    ///
    /// 操作者が関係する文書を取得し、ビュー・期間・キーワードで絞り込んでから
    /// 登録日の新しい順にページングする。
    #[tracing::instrument(skip_all, fields(actor_id = %input.actor_id, view = ?input.view))]
    pub async fn list_approvals(
        &self,
        input: ListInput,
    ) -> Result<Page<ApprovalSummary>, CoreError> {
        let actor = resolve_actor(self.deps.member_repo.as_ref(), &input.actor_id).await?;
        let documents = self
            .deps
            .document_repo
            .find_related(&actor.id, &actor.name)
            .await
            .map_err(|e| CoreError::Internal(format!("決裁文書の取得に失敗: {}", e)))?;
        let entries = attach_details(self.deps.detail_repo.as_ref(), documents).await?;

        let filter = ListFilter::new(input.from, input.to, input.keyword.as_deref());
        Ok(approval::list_by_view(
            &entries,
            &actor,
            input.view,
            &filter,
            input.page,
            self.page_size,
        ))
    }

    async fn load_readable(
        &self,
        actor_id: &MemberId,
        approval_no: &ApprovalNo,
    ) -> Result<(ApprovalDocument, ApprovalDetail), CoreError> {
        let actor = resolve_actor(self.deps.member_repo.as_ref(), actor_id).await?;
        let document = self.load_document(approval_no).await?;
        ensure_readable(&document, &actor)?;
        let detail = self.load_detail(approval_no).await?;
        Ok((document, detail))
    }
}
